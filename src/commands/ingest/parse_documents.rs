use super::*;

#[derive(Debug)]
pub(super) struct ParseOutcome<R> {
    pub(super) entries: Vec<DocumentEntry<R>>,
    pub(super) warnings: Vec<String>,
}

/// Documents are independent, so they are parsed in parallel; results keep
/// inventory order.
pub(super) fn parse_documents<R, F>(
    texts_dir: &Path,
    documents: &[TextEntry],
    parse: F,
) -> ParseOutcome<R>
where
    R: RecordFields + Send,
    F: Fn(&RawDocument) -> R + Sync,
{
    let results = documents
        .par_iter()
        .map(|document| parse_entry(texts_dir, document, &parse))
        .collect::<Vec<Result<DocumentEntry<R>>>>();

    let mut outcome = ParseOutcome {
        entries: Vec::with_capacity(documents.len()),
        warnings: Vec::new(),
    };
    for (document, result) in documents.iter().zip(results) {
        match result {
            Ok(entry) => {
                debug!(
                    doc_id = %entry.doc_id,
                    populated = entry.record.populated_count(),
                    "parsed document"
                );
                if !entry.record.has_structured_sections() {
                    warn!(
                        doc_id = %entry.doc_id,
                        "no section headers recognized, keeping raw content only"
                    );
                    outcome.warnings.push(format!(
                        "{}: no section headers recognized",
                        entry.doc_id
                    ));
                }
                outcome.entries.push(entry);
            }
            Err(error) => {
                warn!(doc_id = %document.doc_id, error = %format!("{error:#}"), "skipping document");
                outcome
                    .warnings
                    .push(format!("{}: skipped: {error:#}", document.doc_id));
            }
        }
    }

    outcome
}

pub(super) fn parse_entry<R, F>(
    texts_dir: &Path,
    document: &TextEntry,
    parse: F,
) -> Result<DocumentEntry<R>>
where
    F: Fn(&RawDocument) -> R,
{
    let path = texts_dir.join(&document.filename);
    let raw = fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
    let raw_text = String::from_utf8(raw)
        .with_context(|| format!("extracted text is not valid UTF-8: {}", path.display()))?;

    let raw_document = RawDocument::new(document.doc_id.clone(), raw_text);
    let record = parse(&raw_document);

    Ok(DocumentEntry {
        doc_id: raw_document.identifier,
        name: document.name.clone(),
        url: document.url.clone().unwrap_or_default(),
        source_category: document.source_category.clone().unwrap_or_default(),
        source_path: path.display().to_string(),
        content: raw_document.raw_text.trim().to_string(),
        record,
    })
}

pub(super) fn count_structured<R: RecordFields>(entries: &[DocumentEntry<R>]) -> usize {
    entries
        .iter()
        .filter(|entry| entry.record.has_structured_sections())
        .count()
}

/// Case-definition extras: records with any case category, records with an
/// English name.
pub(super) fn summarize_case_entries(entries: &[DiseaseEntry]) -> (usize, usize) {
    let with_cases = entries
        .iter()
        .filter(|entry| has_case_definitions(&entry.record))
        .count();
    let with_english_name = entries
        .iter()
        .filter(|entry| !entry.record.english_name.is_empty())
        .count();

    (with_cases, with_english_name)
}

fn has_case_definitions(record: &StructuredRecord) -> bool {
    !(record.suspected_case.is_empty()
        && record.probable_case.is_empty()
        && record.confirmed_case.is_empty())
}
