use std::path::Path;

use anyhow::{bail, Context};
use colored::Colorize;
use pref_codec::{parse_document, ParsedDocument, Record};
use pref_storage::FileStorage;
use pref_types::{PreferenceKey, TypeTag};
use serde::Serialize;
use tracing::{debug, warn};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Show(args) => cmd_show(args, cli.format),
        Command::Check(args) => cmd_check(args, cli.format),
        Command::Get(args) => cmd_get(args, cli.format),
        Command::Set(args) => cmd_set(args),
        Command::Unset(args) => cmd_unset(args),
    }
}

#[derive(Serialize)]
struct ShownEntry<'a> {
    line: usize,
    #[serde(flatten)]
    record: &'a Record,
}

#[derive(Serialize)]
struct SkippedEntry<'a> {
    line: usize,
    content: &'a str,
    reason: String,
}

fn cmd_show(args: ShowArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = read_document(&args.file)?;
    match format {
        OutputFormat::Json => {
            let entries: Vec<_> = doc
                .records
                .iter()
                .map(|(line, record)| ShownEntry { line: *line, record })
                .collect();
            println!("{}", serde_json::to_string_pretty(&entries)?);
        }
        OutputFormat::Text => {
            if doc.records.is_empty() {
                println!("No entries.");
            }
            for (_, record) in &doc.records {
                println!(
                    "{} {} = {}",
                    record.tag.to_string().cyan(),
                    record.key.as_str().bold(),
                    display_value(record)
                );
            }
            if !doc.skipped.is_empty() {
                println!(
                    "\n{} {} malformed line(s) skipped; run `prefs check` for details",
                    "!".yellow().bold(),
                    doc.skipped.len()
                );
            }
        }
    }
    Ok(())
}

fn cmd_check(args: CheckArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = read_document(&args.file)?;
    match format {
        OutputFormat::Json => {
            let skipped: Vec<_> = doc
                .skipped
                .iter()
                .map(|s| SkippedEntry {
                    line: s.line_no,
                    content: &s.content,
                    reason: s.reason.to_string(),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&skipped)?);
        }
        OutputFormat::Text => {
            for s in &doc.skipped {
                println!(
                    "{} line {}: {} ({})",
                    "✗".red().bold(),
                    s.line_no,
                    s.content.dimmed(),
                    s.reason
                );
            }
            let duplicates = duplicate_keys(&doc);
            for key in &duplicates {
                println!(
                    "{} {} appears more than once; the last line wins",
                    "!".yellow().bold(),
                    key.bold()
                );
            }
            if doc.skipped.is_empty() {
                println!(
                    "{} {} entries, no malformed lines",
                    "✓".green().bold(),
                    doc.records.len()
                );
            }
        }
    }
    if !doc.skipped.is_empty() {
        bail!("{} line(s) would be skipped", doc.skipped.len());
    }
    Ok(())
}

fn cmd_get(args: GetArgs, format: OutputFormat) -> anyhow::Result<()> {
    let doc = read_document(&args.file)?;
    let Some(record) = find(&doc, &args.key) else {
        bail!("no entry named {:?} in {}", args.key, args.file.display());
    };
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(record)?),
        OutputFormat::Text => println!("{}", record.value),
    }
    Ok(())
}

fn cmd_set(args: SetArgs) -> anyhow::Result<()> {
    let record = build_record(args.tag, &args.key, &args.value)?;
    let storage = FileStorage::new(&args.file);
    let doc = read_with(&storage)?;

    let records = upsert(doc, record.clone());
    write_records(&storage, &records)?;

    println!(
        "{} Set {} {} = {}",
        "✓".green().bold(),
        record.tag.to_string().cyan(),
        record.key.as_str().bold(),
        display_value(&record)
    );
    Ok(())
}

fn cmd_unset(args: UnsetArgs) -> anyhow::Result<()> {
    let storage = FileStorage::new(&args.file);
    let doc = read_with(&storage)?;

    let (records, removed) = remove(doc, &args.key);
    if removed == 0 {
        println!("{} was not set.", args.key.bold());
        return Ok(());
    }
    write_records(&storage, &records)?;

    println!("{} Removed {}", "✓".green().bold(), args.key.bold());
    Ok(())
}

fn read_document(path: &Path) -> anyhow::Result<ParsedDocument> {
    read_with(&FileStorage::new(path))
}

fn read_with(storage: &FileStorage) -> anyhow::Result<ParsedDocument> {
    let content = storage
        .read_blocking()
        .with_context(|| format!("reading {}", storage.path().display()))?;
    let doc = parse_document(&content);
    debug!(
        path = %storage.path().display(),
        records = doc.records.len(),
        skipped = doc.skipped.len(),
        "parsed datastore file"
    );
    Ok(doc)
}

fn write_records(storage: &FileStorage, records: &[Record]) -> anyhow::Result<()> {
    let content = render_records(records);
    storage
        .write_blocking(&content)
        .with_context(|| format!("writing {}", storage.path().display()))
}

/// Validate a value given on the command line and turn it into a record.
fn build_record(tag: TypeTag, key: &str, value: &str) -> anyhow::Result<Record> {
    let key = PreferenceKey::new(key)?;
    tag.check_value(value)?;
    Ok(Record::new(tag, key, value))
}

/// The record a datastore would load for `key`: the last line naming it.
fn find<'a>(doc: &'a ParsedDocument, key: &str) -> Option<&'a Record> {
    doc.records
        .iter()
        .rev()
        .map(|(_, record)| record)
        .find(|record| record.key.as_str() == key)
}

fn duplicate_keys(doc: &ParsedDocument) -> Vec<String> {
    let mut seen = std::collections::BTreeMap::<&str, usize>::new();
    for (_, record) in &doc.records {
        *seen.entry(record.key.as_str()).or_default() += 1;
    }
    seen.into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(key, _)| key.to_string())
        .collect()
}

/// Replace every line for the record's key with the record itself.
///
/// The record takes the place of the first line it replaces, or goes last.
/// Malformed lines are dropped from the rewritten file.
fn upsert(doc: ParsedDocument, record: Record) -> Vec<Record> {
    warn_dropped(&doc);
    let mut out = Vec::with_capacity(doc.records.len() + 1);
    let mut slot = None;
    for (_, existing) in doc.records {
        if existing.key == record.key {
            slot.get_or_insert(out.len());
        } else {
            out.push(existing);
        }
    }
    match slot {
        Some(pos) => out.insert(pos, record),
        None => out.push(record),
    }
    out
}

/// Drop every line for `key`. Returns the remaining records and the number
/// of lines removed.
fn remove(doc: ParsedDocument, key: &str) -> (Vec<Record>, usize) {
    warn_dropped(&doc);
    let total = doc.records.len();
    let kept: Vec<Record> = doc
        .records
        .into_iter()
        .map(|(_, record)| record)
        .filter(|record| record.key.as_str() != key)
        .collect();
    let removed = total - kept.len();
    (kept, removed)
}

fn warn_dropped(doc: &ParsedDocument) {
    for s in &doc.skipped {
        warn!(line = s.line_no, reason = %s.reason, "dropping malformed line on rewrite");
    }
}

fn render_records(records: &[Record]) -> String {
    records
        .iter()
        .map(|record| format!("{}\n", record.to_line()))
        .collect()
}

fn display_value(record: &Record) -> String {
    if record.tag.is_string() {
        format!("{:?}", record.value).green().to_string()
    } else {
        record.value.yellow().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "i;integer;-567\ns;string;\"the grass is not greener on the moon\"\n";

    #[test]
    fn find_returns_last_line() {
        let doc = parse_document("i;a;1\nb;other;true\ni;a;2\n");
        assert_eq!(find(&doc, "a").unwrap().value, "2");
        assert!(find(&doc, "missing").is_none());
    }

    #[test]
    fn finds_decoded_string() {
        let doc = parse_document(SAMPLE);
        assert_eq!(
            find(&doc, "string").unwrap().value,
            "the grass is not greener on the moon"
        );
    }

    #[test]
    fn upsert_replaces_in_place() {
        let doc = parse_document(SAMPLE);
        let record = build_record(TypeTag::Int, "integer", "46").unwrap();
        let out = render_records(&upsert(doc, record));
        assert_eq!(
            out,
            "i;integer;46\ns;string;\"the grass is not greener on the moon\"\n"
        );
    }

    #[test]
    fn upsert_appends_new_key_and_collapses_duplicates() {
        let doc = parse_document("i;a;1\ni;a;2\n");
        let out = upsert(doc, build_record(TypeTag::Long, "a", "3").unwrap());
        assert_eq!(render_records(&out), "l;a;3\n");

        let doc = parse_document("i;a;1\n");
        let out = upsert(doc, build_record(TypeTag::String, "b", "x;y\n").unwrap());
        assert_eq!(render_records(&out), "i;a;1\ns;b;\"x;y\\n\"\n");
    }

    #[test]
    fn build_record_validates() {
        assert!(build_record(TypeTag::Int, "a", "twelve").is_err());
        assert!(build_record(TypeTag::Boolean, "a", "yes").is_err());
        assert!(build_record(TypeTag::Int, "bad;key", "1").is_err());
        assert!(build_record(TypeTag::Double, "a", "1.5").is_ok());
    }

    #[test]
    fn remove_drops_all_lines_for_key() {
        let doc = parse_document("i;a;1\ns;b;\"x\"\ni;a;2\nbroken\n");
        let (records, removed) = remove(doc, "a");
        assert_eq!(removed, 2);
        assert_eq!(render_records(&records), "s;b;\"x\"\n");
    }

    #[test]
    fn duplicates_are_reported() {
        let doc = parse_document("i;a;1\ni;a;2\nb;c;true\n");
        assert_eq!(duplicate_keys(&doc), vec!["a".to_string()]);
    }

    #[test]
    fn set_and_unset_rewrite_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prefs.prefs");
        std::fs::write(&file, SAMPLE).unwrap();

        cmd_set(SetArgs {
            file: file.clone(),
            tag: TypeTag::Boolean,
            key: "flag".into(),
            value: "true".into(),
        })
        .unwrap();
        cmd_unset(UnsetArgs {
            file: file.clone(),
            key: "integer".into(),
        })
        .unwrap();

        assert_eq!(
            std::fs::read_to_string(&file).unwrap(),
            "s;string;\"the grass is not greener on the moon\"\nb;flag;true\n"
        );
    }

    #[test]
    fn check_fails_on_malformed_lines() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("prefs.prefs");
        std::fs::write(&file, "i;a;1\nnot a line\n").unwrap();
        assert!(cmd_check(CheckArgs { file: file.clone() }, OutputFormat::Text).is_err());

        std::fs::write(&file, SAMPLE).unwrap();
        assert!(cmd_check(CheckArgs { file }, OutputFormat::Json).is_ok());
    }

    #[test]
    fn get_missing_key_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("absent.prefs");
        let err = cmd_get(
            GetArgs {
                file,
                key: "nope".into(),
            },
            OutputFormat::Text,
        )
        .unwrap_err();
        assert!(err.to_string().contains("nope"));
    }
}
