use std::collections::HashMap;
use std::io::{self, Write};

use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags, params};
use serde::Serialize;
use tracing::info;

use crate::cli::QueryArgs;
use crate::commands::ingest::DB_FILENAME;

const MAX_QUERY_CANDIDATES: i64 = 256;
// trigram tokens never match shorter substrings
const MIN_FTS_TOKEN_CHARS: usize = 3;
const SNIPPET_CHARS: i64 = 160;

#[derive(Debug, Clone)]
struct QueryCandidate {
    score: f64,
    match_kind: &'static str,
    doc_id: String,
    name: String,
    english_name: String,
    snippet: String,
}

#[derive(Debug, Clone, Serialize)]
struct QueryResult {
    rank: usize,
    score: f64,
    match_kind: String,
    doc_id: String,
    name: String,
    english_name: String,
    snippet: String,
}

#[derive(Debug, Serialize)]
struct QueryResponse {
    query: String,
    limit: usize,
    returned: usize,
    results: Vec<QueryResult>,
}

pub fn run(args: QueryArgs) -> Result<()> {
    let query_text = args.query.trim();
    if query_text.is_empty() {
        bail!("query must not be empty");
    }

    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| args.cache_root.join(DB_FILENAME));

    let connection = Connection::open_with_flags(
        &db_path,
        OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
    )
    .with_context(|| format!("failed to open database read-only: {}", db_path.display()))?;

    let results = search(&connection, query_text, args.limit)?;

    info!(
        query = %query_text,
        result_count = results.len(),
        "query completed"
    );

    if args.json {
        write_json_response(query_text, args.limit, results)?;
    } else {
        write_text_response(query_text, &results)?;
    }

    Ok(())
}

fn search(connection: &Connection, query_text: &str, limit: usize) -> Result<Vec<QueryResult>> {
    let mut dedup = HashMap::<String, QueryCandidate>::new();

    for candidate in query_name_matches(connection, query_text)? {
        upsert_candidate(&mut dedup, candidate);
    }

    let text_candidates = if uses_fts(query_text) {
        query_fts_matches(connection, query_text)?
    } else {
        query_substring_matches(connection, query_text)?
    };
    for candidate in text_candidates {
        upsert_candidate(&mut dedup, candidate);
    }

    let mut candidates: Vec<QueryCandidate> = dedup.into_values().collect();
    candidates.sort_by(|left, right| {
        right
            .score
            .total_cmp(&left.score)
            .then(left.doc_id.cmp(&right.doc_id))
    });
    candidates.truncate(limit);

    Ok(to_results(candidates))
}

fn query_name_matches(connection: &Connection, query_text: &str) -> Result<Vec<QueryCandidate>> {
    let mut statement = connection.prepare(
        "
        SELECT
          doc_id,
          name,
          english_name,
          substr(content, 1, ?3)
        FROM records
        WHERE
          lower(name) = lower(?1)
          OR lower(english_name) = lower(?1)
          OR lower(name) LIKE '%' || lower(?1) || '%'
          OR lower(english_name) LIKE '%' || lower(?1) || '%'
        LIMIT ?2
        ",
    )?;

    let mut rows = statement.query(params![query_text, MAX_QUERY_CANDIDATES, SNIPPET_CHARS])?;

    let mut out = Vec::new();
    let query_lower = query_text.to_lowercase();

    while let Some(row) = rows.next()? {
        let name: String = row.get(1)?;
        let english_name: String = row.get(2)?;

        let name_lower = name.to_lowercase();
        let english_lower = english_name.to_lowercase();

        let (score, match_kind) = if name_lower == query_lower {
            (1_000.0, "exact_name")
        } else if english_lower == query_lower {
            (900.0, "exact_english_name")
        } else if name_lower.contains(&query_lower) {
            (700.0, "name_contains")
        } else {
            (600.0, "english_name_contains")
        };

        out.push(QueryCandidate {
            score,
            match_kind,
            doc_id: row.get(0)?,
            name,
            english_name,
            snippet: row.get(3)?,
        });
    }

    Ok(out)
}

fn query_fts_matches(connection: &Connection, query_text: &str) -> Result<Vec<QueryCandidate>> {
    let fts_query = to_fts_query(query_text);

    let mut statement = connection.prepare(
        "
        SELECT
          r.doc_id,
          r.name,
          r.english_name,
          snippet(records_fts, 3, '[', ']', ' ... ', 24)
        FROM records_fts
        JOIN records r ON r.rowid = records_fts.rowid
        WHERE records_fts MATCH ?1
        ORDER BY bm25(records_fts) ASC
        LIMIT ?2
        ",
    )?;

    let mut rows = statement.query(params![fts_query, MAX_QUERY_CANDIDATES])?;

    let mut out = Vec::new();
    let mut index = 0usize;

    while let Some(row) = rows.next()? {
        out.push(QueryCandidate {
            score: 500.0 - (index as f64),
            match_kind: "fts",
            doc_id: row.get(0)?,
            name: row.get(1)?,
            english_name: row.get(2)?,
            snippet: row.get(3)?,
        });
        index += 1;
    }

    Ok(out)
}

/// Fallback for queries the trigram index cannot answer, such as two-character
/// symptom terms.
fn query_substring_matches(
    connection: &Connection,
    query_text: &str,
) -> Result<Vec<QueryCandidate>> {
    let mut statement = connection.prepare(
        "
        SELECT
          doc_id,
          name,
          english_name,
          content,
          instr(content, ?1)
        FROM records
        WHERE instr(content, ?1) > 0
        ORDER BY populated_count DESC, doc_id ASC
        LIMIT ?2
        ",
    )?;

    let mut rows = statement.query(params![query_text, MAX_QUERY_CANDIDATES])?;

    let mut out = Vec::new();
    let mut index = 0usize;

    while let Some(row) = rows.next()? {
        let content: String = row.get(3)?;
        let position: i64 = row.get(4)?;
        out.push(QueryCandidate {
            score: 400.0 - (index as f64),
            match_kind: "content_substring",
            doc_id: row.get(0)?,
            name: row.get(1)?,
            english_name: row.get(2)?,
            snippet: snippet_around(&content, position),
        });
        index += 1;
    }

    Ok(out)
}

fn upsert_candidate(dedup: &mut HashMap<String, QueryCandidate>, candidate: QueryCandidate) {
    match dedup.get(&candidate.doc_id) {
        Some(existing) if existing.score >= candidate.score => {}
        _ => {
            dedup.insert(candidate.doc_id.clone(), candidate);
        }
    }
}

fn to_results(candidates: Vec<QueryCandidate>) -> Vec<QueryResult> {
    candidates
        .into_iter()
        .enumerate()
        .map(|(index, candidate)| QueryResult {
            rank: index + 1,
            score: candidate.score,
            match_kind: candidate.match_kind.to_string(),
            doc_id: candidate.doc_id,
            name: candidate.name,
            english_name: candidate.english_name,
            snippet: condense_whitespace(&candidate.snippet),
        })
        .collect()
}

fn write_json_response(query_text: &str, limit: usize, results: Vec<QueryResult>) -> Result<()> {
    let response = QueryResponse {
        query: query_text.to_string(),
        limit,
        returned: results.len(),
        results,
    };

    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, &response)
        .context("failed to serialize query json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

fn write_text_response(query_text: &str, results: &[QueryResult]) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Query: {query_text}")?;
    writeln!(output, "Results: {}", results.len())?;

    for result in results {
        let english_name = if result.english_name.is_empty() {
            "-"
        } else {
            result.english_name.as_str()
        };
        writeln!(
            output,
            "{}. {} ({}) [{} {:.0}]",
            result.rank, result.name, english_name, result.match_kind, result.score
        )?;
        writeln!(output, "\tdoc_id: {}", result.doc_id)?;
        writeln!(output, "\tsnippet: {}", result.snippet)?;
    }

    output.flush()?;
    Ok(())
}

fn uses_fts(query_text: &str) -> bool {
    let mut tokens = query_text.split_whitespace().peekable();
    tokens.peek().is_some() && tokens.all(|token| token.chars().count() >= MIN_FTS_TOKEN_CHARS)
}

fn to_fts_query(query_text: &str) -> String {
    query_text
        .split_whitespace()
        .filter(|token| !token.trim().is_empty())
        .map(|token| format!("\"{}\"", token.replace('"', "")))
        .collect::<Vec<String>>()
        .join(" ")
}

/// `position` is SQLite's 1-based character offset from `instr`.
fn snippet_around(content: &str, position: i64) -> String {
    let start = usize::try_from(position.saturating_sub(1)).unwrap_or(0);
    let lead = start.saturating_sub(12);
    content
        .chars()
        .skip(lead)
        .take(SNIPPET_CHARS as usize)
        .collect()
}

fn condense_whitespace(input: &str) -> String {
    input.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::ingest::{ensure_schema, sync_fts_index, upsert_records};
    use crate::model::DiseaseEntry;
    use crate::parse::{DocumentParser, RawDocument};

    fn seeded_connection() -> Connection {
        let mut connection = Connection::open_in_memory().expect("in-memory db");
        ensure_schema(&connection).expect("schema");

        let parser = DocumentParser::new().expect("parser");
        let documents = [
            (
                "登革熱",
                "登革熱（Dengue Fever）\n一、臨床條件\n突發性發燒且伴隨頭痛\n二、檢驗條件\n病毒分離",
            ),
            (
                "屈公病",
                "屈公病（Chikungunya Fever）\n一、臨床條件\n急性發燒及關節痛",
            ),
            ("狂犬病", "狂犬病（Rabies）\n一、臨床條件\n恐水症狀"),
        ];
        let entries = documents
            .iter()
            .map(|(name, text)| DiseaseEntry {
                doc_id: name.to_string(),
                name: name.to_string(),
                url: String::new(),
                source_category: String::new(),
                source_path: format!("texts/{name}.txt"),
                content: text.to_string(),
                record: parser.parse(&RawDocument::new(*name, *text)),
            })
            .collect::<Vec<DiseaseEntry>>();

        upsert_records(&mut connection, &entries, "2026-01-01T00:00:00Z").expect("records");
        sync_fts_index(&connection).expect("fts");
        connection
    }

    fn ids(results: &[QueryResult]) -> Vec<&str> {
        results.iter().map(|result| result.doc_id.as_str()).collect()
    }

    #[test]
    fn to_fts_query_quotes_each_token_and_drops_inner_quotes() {
        assert_eq!(to_fts_query("dengue  \"fever\""), "\"dengue\" \"fever\"");
        assert_eq!(to_fts_query("   "), "");
    }

    #[test]
    fn uses_fts_requires_three_characters_per_token() {
        assert!(uses_fts("關節痛"));
        assert!(uses_fts("Dengue Fever"));
        assert!(!uses_fts("發燒"));
        assert!(!uses_fts("關節痛 燒"));
        assert!(!uses_fts(""));
    }

    #[test]
    fn exact_name_outranks_other_matches() {
        let connection = seeded_connection();
        let results = search(&connection, "狂犬病", 10).expect("search");

        assert_eq!(results[0].doc_id, "狂犬病");
        assert_eq!(results[0].match_kind, "exact_name");
        assert_eq!(results[0].rank, 1);
    }

    #[test]
    fn english_name_matches_ignore_case() {
        let connection = seeded_connection();

        let exact = search(&connection, "rabies", 10).expect("search");
        assert_eq!(ids(&exact), vec!["狂犬病"]);
        assert_eq!(exact[0].match_kind, "exact_english_name");

        let partial = search(&connection, "fever", 10).expect("search");
        assert_eq!(ids(&partial), vec!["屈公病", "登革熱"]);
        assert!(
            partial
                .iter()
                .all(|result| result.match_kind == "english_name_contains")
        );
    }

    #[test]
    fn full_text_search_finds_section_text() {
        let connection = seeded_connection();
        let results = search(&connection, "關節痛", 10).expect("search");

        assert_eq!(ids(&results), vec!["屈公病"]);
        assert_eq!(results[0].match_kind, "fts");
        assert!(results[0].snippet.contains("[關節痛]"));
    }

    #[test]
    fn short_queries_fall_back_to_substring_scan() {
        let connection = seeded_connection();
        let results = search(&connection, "發燒", 10).expect("search");

        let mut found = ids(&results);
        found.sort_unstable();
        assert_eq!(found, vec!["屈公病", "登革熱"]);
        assert!(
            results
                .iter()
                .all(|result| result.match_kind == "content_substring")
        );
        assert!(results.iter().all(|result| result.snippet.contains("發燒")));
    }

    #[test]
    fn limit_truncates_ranked_results() {
        let connection = seeded_connection();
        let results = search(&connection, "fever", 1).expect("search");
        assert_eq!(results.len(), 1);
    }

    #[test]
    fn snippet_around_starts_shortly_before_the_hit() {
        let content = format!("{}發燒", "字".repeat(40));
        let snippet = snippet_around(&content, 41);
        assert!(snippet.starts_with(&"字".repeat(12)));
        assert!(snippet.ends_with("發燒"));
        assert_eq!(snippet.chars().count(), 14);
    }
}
