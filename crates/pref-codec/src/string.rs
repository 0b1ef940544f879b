//! Reversible escaping of string values.
//!
//! A value is wrapped in double quotes with four escapes applied:
//!
//! | Character       | Escaped form |
//! |-----------------|--------------|
//! | `\`             | `\\`         |
//! | `"`             | `\"`         |
//! | carriage return | `\r`         |
//! | line feed       | `\n`         |
//!
//! The result never contains a raw line break, so it can sit as the last
//! field of a line. Embedded `;` need no escape because the value field runs
//! to the end of the line.

use crate::error::{CodecError, Result};

const QUOTE: char = '"';
const ESCAPE: char = '\\';

/// Quote and escape `value` for storage.
pub fn encode(value: &str) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    out.push(QUOTE);
    for ch in value.chars() {
        match ch {
            ESCAPE => out.push_str("\\\\"),
            QUOTE => out.push_str("\\\""),
            '\r' => out.push_str("\\r"),
            '\n' => out.push_str("\\n"),
            other => out.push(other),
        }
    }
    out.push(QUOTE);
    out
}

/// Decode a token produced by [`encode`].
///
/// Fails if the token is not quoted, is not terminated, carries content
/// after the closing quote, holds a raw line break, or uses an escape
/// `encode` never emits.
pub fn decode(token: &str) -> Result<String> {
    let mut chars = token.char_indices();
    match chars.next() {
        Some((_, QUOTE)) => {}
        _ => return Err(CodecError::Unquoted),
    }

    let mut out = String::with_capacity(token.len().saturating_sub(2));
    while let Some((offset, ch)) = chars.next() {
        match ch {
            QUOTE => {
                let end = offset + QUOTE.len_utf8();
                if end != token.len() {
                    return Err(CodecError::TrailingContent { offset: end });
                }
                return Ok(out);
            }
            ESCAPE => match chars.next() {
                Some((_, ESCAPE)) => out.push(ESCAPE),
                Some((_, QUOTE)) => out.push(QUOTE),
                Some((_, 'r')) => out.push('\r'),
                Some((_, 'n')) => out.push('\n'),
                Some((_, other)) => return Err(CodecError::InvalidEscape { ch: other, offset }),
                None => return Err(CodecError::Unterminated),
            },
            '\r' | '\n' => return Err(CodecError::UnescapedControl { ch, offset }),
            other => out.push(other),
        }
    }

    Err(CodecError::Unterminated)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn encode_simple() {
        assert_eq!(encode("test string"), "\"test string\"");
        assert_eq!(encode(""), "\"\"");
    }

    #[test]
    fn encode_escapes() {
        assert_eq!(encode("a\"b"), r#""a\"b""#);
        assert_eq!(encode("a\\b"), r#""a\\b""#);
        assert_eq!(encode("line1\r\nline2"), r#""line1\r\nline2""#);
        assert!(!encode("x\ny").contains('\n'));
    }

    #[test]
    fn delimiters_pass_through() {
        assert_eq!(encode("a;b;c"), "\"a;b;c\"");
        assert_eq!(decode("\"a;b;c\"").unwrap(), "a;b;c");
    }

    #[test]
    fn already_escaped_text_survives() {
        let tricky = r#"already \"escaped\" \\n text"#;
        assert_eq!(decode(&encode(tricky)).unwrap(), tricky);
    }

    #[test]
    fn whitespace_only() {
        assert_eq!(decode(&encode("   \t ")).unwrap(), "   \t ");
    }

    #[test]
    fn reject_unquoted() {
        assert_eq!(decode("plain"), Err(CodecError::Unquoted));
        assert_eq!(decode(""), Err(CodecError::Unquoted));
    }

    #[test]
    fn reject_unterminated() {
        assert_eq!(decode("\"open"), Err(CodecError::Unterminated));
        assert_eq!(decode("\""), Err(CodecError::Unterminated));
        assert_eq!(decode("\"dangling\\"), Err(CodecError::Unterminated));
    }

    #[test]
    fn reject_unescaped_inner_quote() {
        assert_eq!(
            decode(r#""ab"cd""#),
            Err(CodecError::TrailingContent { offset: 4 })
        );
    }

    #[test]
    fn reject_unknown_escape() {
        assert_eq!(
            decode(r#""a\tb""#),
            Err(CodecError::InvalidEscape { ch: 't', offset: 2 })
        );
    }

    #[test]
    fn reject_raw_line_breaks() {
        assert_eq!(
            decode("\"a\nb\""),
            Err(CodecError::UnescapedControl { ch: '\n', offset: 2 })
        );
        assert_eq!(
            decode("\"a\rb\""),
            Err(CodecError::UnescapedControl { ch: '\r', offset: 2 })
        );
    }

    proptest! {
        #[test]
        fn decode_inverts_encode(s in any::<String>()) {
            prop_assert_eq!(decode(&encode(&s)).unwrap(), s);
        }

        #[test]
        fn decode_inverts_encode_on_special_chars(s in "[\"\\\\\r\n; a-z]*") {
            let encoded = encode(&s);
            prop_assert!(!encoded.contains('\n'));
            prop_assert!(!encoded.contains('\r'));
            prop_assert_eq!(decode(&encoded).unwrap(), s);
        }
    }
}
