use std::fs;
use std::io::{self, Read, Write};
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{DocumentKind, ParseArgs};
use crate::parse::{DocumentParser, RawDocument, RecordFields};

const STDIN_MARKER: &str = "-";

pub fn run(args: ParseArgs) -> Result<()> {
    let raw_text = read_input(&args.input)?;
    let identifier = args
        .doc_id
        .clone()
        .unwrap_or_else(|| default_identifier(&args.input));

    let parser = DocumentParser::new()?;
    let document = RawDocument::new(identifier.clone(), raw_text);

    match args.kind {
        DocumentKind::CaseDefinition => {
            let record = parser.parse(&document);
            info!(english_name = %record.english_name, "extracted English name");
            emit_record(&identifier, &record)
        }
        DocumentKind::Manual => emit_record(&identifier, &parser.parse_manual(&document)),
    }
}

fn emit_record<R: RecordFields + Serialize>(identifier: &str, record: &R) -> Result<()> {
    if record.has_structured_sections() {
        info!(
            doc_id = %identifier,
            populated = record.populated_count(),
            "parsed document"
        );
    } else {
        warn!(doc_id = %identifier, "no section headers recognized");
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, record)
        .context("failed to serialize parsed record")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn read_input(input: &Path) -> Result<String> {
    if input.as_os_str() == STDIN_MARKER {
        let mut text = String::new();
        io::stdin()
            .lock()
            .read_to_string(&mut text)
            .context("failed to read document text from stdin")?;
        return Ok(text);
    }

    fs::read_to_string(input).with_context(|| format!("failed to read {}", input.display()))
}

fn default_identifier(input: &Path) -> String {
    if input.as_os_str() == STDIN_MARKER {
        return "stdin".to_string();
    }

    input
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| input.display().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_identifier_uses_file_stem() {
        assert_eq!(default_identifier(Path::new("texts/登革熱.txt")), "登革熱");
        assert_eq!(default_identifier(Path::new("-")), "stdin");
    }

    #[test]
    fn read_input_reports_missing_file_path() {
        let missing = std::env::temp_dir().join(format!(
            "casedef-parse-missing-{}.txt",
            std::process::id()
        ));
        let error = read_input(&missing).expect_err("missing file");
        assert!(format!("{error:#}").contains("failed to read"));
    }
}
