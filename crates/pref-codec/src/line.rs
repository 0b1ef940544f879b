//! The `tag;key;value` line format.
//!
//! Parsing is lenient at the document level: blank lines are ignored and
//! malformed lines are collected as [`SkippedLine`]s instead of failing the
//! whole document. Only [`parse_line`] reports a hard error.

use serde::Serialize;

use pref_types::{PreferenceKey, TypeTag, TypedKey, DELIMITER};

use crate::error::{CodecError, Result};
use crate::string;

/// One stored entry with its value already decoded.
///
/// For string-typed entries `value` is the unescaped text; for every other
/// kind it is the canonical text exactly as stored.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Record {
    pub tag: TypeTag,
    pub key: PreferenceKey,
    pub value: String,
}

impl Record {
    pub fn new(tag: TypeTag, key: PreferenceKey, value: impl Into<String>) -> Self {
        Self {
            tag,
            key,
            value: value.into(),
        }
    }

    /// Build a record from the raw on-disk form of a value.
    pub fn from_raw(tag: TypeTag, key: PreferenceKey, raw: &str) -> Result<Self> {
        let value = if tag.is_string() {
            string::decode(raw)?
        } else {
            raw.to_string()
        };
        Ok(Self::new(tag, key, value))
    }

    pub fn typed_key(&self) -> TypedKey {
        TypedKey::new(self.tag, self.key.clone())
    }

    /// The value as written to disk, re-encoded when string-typed.
    pub fn raw_value(&self) -> String {
        if self.tag.is_string() {
            string::encode(&self.value)
        } else {
            self.value.clone()
        }
    }

    /// The full line, without its terminator.
    pub fn to_line(&self) -> String {
        render_line(&self.typed_key(), &self.raw_value())
    }
}

/// A line the document parser refused, with its 1-based line number.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_no: usize,
    pub content: String,
    pub reason: CodecError,
}

/// Result of parsing a whole document.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Well-formed records in file order, with their 1-based line numbers.
    pub records: Vec<(usize, Record)>,
    pub skipped: Vec<SkippedLine>,
}

/// Parse a single non-blank line.
pub fn parse_line(line: &str) -> Result<Record> {
    let mut fields = line.splitn(3, DELIMITER);
    let (tag, key, raw) = match (fields.next(), fields.next(), fields.next()) {
        (Some(tag), Some(key), Some(raw)) => (tag, key, raw),
        _ => {
            return Err(CodecError::MalformedLine(format!(
                "expected `tag{DELIMITER}key{DELIMITER}value`"
            )))
        }
    };

    let tag: TypeTag = tag.parse()?;
    let key = PreferenceKey::new(key)?;
    Record::from_raw(tag, key, raw)
}

/// Render one line from a typed key and an already-encoded raw value.
pub fn render_line(key: &TypedKey, raw: &str) -> String {
    format!("{}{DELIMITER}{}{DELIMITER}{raw}", key.tag, key.key)
}

/// Parse every line of `content`.
///
/// Both `\n` and `\r\n` terminators are accepted. Lines that are empty or
/// whitespace-only are ignored silently.
pub fn parse_document(content: &str) -> ParsedDocument {
    let mut doc = ParsedDocument::default();

    for (idx, line) in content.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let line_no = idx + 1;
        match parse_line(line) {
            Ok(record) => doc.records.push((line_no, record)),
            Err(reason) => doc.skipped.push(SkippedLine {
                line_no,
                content: line.to_string(),
                reason,
            }),
        }
    }

    doc
}

/// Render entries as a document, one `\n`-terminated line each.
///
/// Entries without a value are omitted.
pub fn render_document<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a TypedKey, Option<&'a str>)>,
{
    let mut out = String::new();
    for (key, raw) in entries {
        if let Some(raw) = raw {
            out.push_str(&render_line(key, raw));
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn key(s: &str) -> PreferenceKey {
        PreferenceKey::new(s).unwrap()
    }

    #[test]
    fn parse_integer_line() {
        let rec = parse_line("i;integer;-567").unwrap();
        assert_eq!(rec.tag, TypeTag::Int);
        assert_eq!(rec.key.as_str(), "integer");
        assert_eq!(rec.value, "-567");
    }

    #[test]
    fn parse_string_line_decodes() {
        let rec = parse_line(r#"s;string;"the grass is not greener on the moon""#).unwrap();
        assert_eq!(rec.tag, TypeTag::String);
        assert_eq!(rec.value, "the grass is not greener on the moon");
    }

    #[test]
    fn value_may_contain_delimiters() {
        let rec = parse_line(r#"s;path;"a;b;c""#).unwrap();
        assert_eq!(rec.value, "a;b;c");
    }

    #[test]
    fn empty_numeric_value_parses_as_empty_text() {
        let rec = parse_line("i;count;").unwrap();
        assert_eq!(rec.value, "");
    }

    #[test]
    fn missing_delimiter_is_malformed() {
        assert!(matches!(
            parse_line("i;integer"),
            Err(CodecError::MalformedLine(_))
        ));
        assert!(matches!(parse_line("garbage"), Err(CodecError::MalformedLine(_))));
    }

    #[test]
    fn unknown_tag_is_rejected() {
        assert!(matches!(parse_line("x;key;1"), Err(CodecError::Type(_))));
        assert!(matches!(parse_line("ii;key;1"), Err(CodecError::Type(_))));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(parse_line("i;;1"), Err(CodecError::Type(_))));
    }

    #[test]
    fn bad_string_escape_is_rejected() {
        assert_eq!(
            parse_line(r#"s;key;"unterminated"#),
            Err(CodecError::Unterminated)
        );
        assert_eq!(parse_line("s;key;bare"), Err(CodecError::Unquoted));
    }

    #[test]
    fn document_skips_bad_lines() {
        let content = "i;integer;-567\n\n   \nbroken\nx;k;1\ns;string;\"ok\"\r\n";
        let doc = parse_document(content);

        assert_eq!(doc.records.len(), 2);
        assert_eq!(doc.records[0].0, 1);
        assert_eq!(doc.records[1].0, 6);
        assert_eq!(doc.records[1].1.value, "ok");

        let skipped: Vec<usize> = doc.skipped.iter().map(|s| s.line_no).collect();
        assert_eq!(skipped, vec![4, 5]);
    }

    #[test]
    fn raw_carriage_return_in_string_skips_line() {
        let doc = parse_document("s;a;\"x\ry\"\ns;b;\"ok\"\n");
        assert_eq!(doc.records.len(), 1);
        assert_eq!(doc.records[0].1.key.as_str(), "b");
        assert_eq!(doc.skipped.len(), 1);
        assert_eq!(doc.skipped[0].line_no, 1);
        assert!(matches!(
            doc.skipped[0].reason,
            CodecError::UnescapedControl { ch: '\r', .. }
        ));
    }

    #[test]
    fn render_omits_unset_entries() {
        let int_key = TypedKey::new(TypeTag::Int, key("integer"));
        let bool_key = TypedKey::new(TypeTag::Boolean, key("flag"));
        let str_key = TypedKey::new(TypeTag::String, key("string"));
        let raw = string::encode("test string");

        let doc = render_document([
            (&int_key, Some("46")),
            (&bool_key, None),
            (&str_key, Some(raw.as_str())),
        ]);
        assert_eq!(doc, "i;integer;46\ns;string;\"test string\"\n");
    }

    #[test]
    fn record_line_roundtrip() {
        let rec = Record::new(TypeTag::String, key("motd"), "multi\nline \"quoted\"");
        assert_eq!(parse_line(&rec.to_line()).unwrap(), rec);
    }

    proptest! {
        #[test]
        fn rendered_string_records_reparse(value in any::<String>(), name in "[a-z][a-z0-9_.]{0,16}") {
            let rec = Record::new(TypeTag::String, key(&name), value);
            let doc = parse_document(&format!("{}\n", rec.to_line()));
            prop_assert!(doc.skipped.is_empty());
            prop_assert_eq!(doc.records.len(), 1);
            prop_assert_eq!(&doc.records[0].1, &rec);
        }
    }
}
