use super::*;

pub(crate) fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

pub(crate) fn ensure_schema(connection: &Connection) -> Result<()> {
    // docs rows are rebuilt from the inventory on every ingest, so a 0.1.0
    // table keyed by doc_id alone is dropped rather than migrated.
    if table_exists(connection, "docs")? && !table_has_column(connection, "docs", "document_kind")? {
        info!("dropping docs table from schema 0.1.0");
        connection
            .execute("DROP TABLE docs", [])
            .context("failed to drop docs table from schema 0.1.0")?;
    }

    connection.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS metadata (
          key TEXT PRIMARY KEY,
          value TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS docs (
          document_kind TEXT NOT NULL,
          doc_id TEXT NOT NULL,
          filename TEXT NOT NULL,
          sha256 TEXT NOT NULL,
          name TEXT NOT NULL,
          url TEXT,
          source_category TEXT,
          PRIMARY KEY(document_kind, doc_id)
        );

        CREATE TABLE IF NOT EXISTS records (
          doc_id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          content TEXT NOT NULL DEFAULT '',
          clinical_condition TEXT NOT NULL DEFAULT '',
          lab_criteria TEXT NOT NULL DEFAULT '',
          epidemiology_condition TEXT NOT NULL DEFAULT '',
          reporting_definition TEXT NOT NULL DEFAULT '',
          classification TEXT NOT NULL DEFAULT '',
          specimen_collection TEXT NOT NULL DEFAULT '',
          suspected_case TEXT NOT NULL DEFAULT '',
          probable_case TEXT NOT NULL DEFAULT '',
          confirmed_case TEXT NOT NULL DEFAULT '',
          english_name TEXT NOT NULL DEFAULT '',
          populated_count INTEGER NOT NULL DEFAULT 0,
          parsed_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS manual_records (
          doc_id TEXT PRIMARY KEY,
          name TEXT NOT NULL,
          content TEXT NOT NULL DEFAULT '',
          overview TEXT NOT NULL DEFAULT '',
          pathogen TEXT NOT NULL DEFAULT '',
          epidemiology TEXT NOT NULL DEFAULT '',
          reservoir TEXT NOT NULL DEFAULT '',
          transmission TEXT NOT NULL DEFAULT '',
          incubation_period TEXT NOT NULL DEFAULT '',
          communicable_period TEXT NOT NULL DEFAULT '',
          susceptibility TEXT NOT NULL DEFAULT '',
          case_definition TEXT NOT NULL DEFAULT '',
          specimen_collection TEXT NOT NULL DEFAULT '',
          control_measures TEXT NOT NULL DEFAULT '',
          populated_count INTEGER NOT NULL DEFAULT 0,
          parsed_at TEXT NOT NULL
        );
        ",
    )?;

    // trigram tokens: CJK text has no word separators for unicode61
    connection
        .execute(
            "
            CREATE VIRTUAL TABLE IF NOT EXISTS records_fts
            USING fts5(
              doc_id UNINDEXED, name, english_name, content,
              content='records', content_rowid='rowid', tokenize='trigram'
            )
            ",
            [],
        )
        .context("failed to initialize FTS5 table records_fts")?;

    connection.execute_batch(
        "
        CREATE INDEX IF NOT EXISTS idx_records_english_name ON records(english_name);
        CREATE INDEX IF NOT EXISTS idx_records_populated ON records(populated_count);
        ",
    )?;

    let now = now_utc_string();
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_schema_version', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [DB_SCHEMA_VERSION],
    )?;
    connection.execute(
        "INSERT INTO metadata(key, value) VALUES('db_updated_at', ?1)
         ON CONFLICT(key) DO UPDATE SET value=excluded.value",
        [now],
    )?;

    Ok(())
}

fn table_exists(connection: &Connection, table_name: &str) -> Result<bool> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = ?1",
        [table_name],
        |row| row.get(0),
    )?;
    Ok(count > 0)
}

fn table_has_column(connection: &Connection, table_name: &str, column_name: &str) -> Result<bool> {
    let pragma_sql = format!("PRAGMA table_info({table_name})");
    let mut statement = connection
        .prepare(&pragma_sql)
        .with_context(|| format!("failed to inspect schema for table {table_name}"))?;

    let mut rows = statement.query([])?;
    while let Some(row) = rows.next()? {
        let existing_name: String = row.get(1)?;
        if existing_name == column_name {
            return Ok(true);
        }
    }

    Ok(false)
}

/// Mirrors the inventory of one document kind: documents no longer listed
/// are dropped.
pub(crate) fn upsert_docs(
    connection: &mut Connection,
    kind: DocumentKind,
    inventory: &TextInventoryManifest,
) -> Result<usize> {
    let tx = connection.transaction()?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO docs(document_kind, doc_id, filename, sha256, name, url, source_category)
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(document_kind, doc_id) DO UPDATE SET
              filename=excluded.filename,
              sha256=excluded.sha256,
              name=excluded.name,
              url=excluded.url,
              source_category=excluded.source_category
            ",
        )?;

        for document in &inventory.documents {
            statement.execute(params![
                kind.as_str(),
                &document.doc_id,
                &document.filename,
                &document.sha256,
                &document.name,
                &document.url,
                &document.source_category,
            ])?;
        }
    }

    let listed = inventory
        .documents
        .iter()
        .map(|document| document.doc_id.as_str())
        .collect::<Vec<&str>>();
    let removed = tx.execute(
        "DELETE FROM docs
         WHERE document_kind = ?1
           AND doc_id NOT IN (SELECT value FROM json_each(?2))",
        params![kind.as_str(), encode_doc_ids(&listed)?],
    )?;
    if removed > 0 {
        info!(kind = kind.as_str(), removed, "removed docs no longer in inventory");
    }

    tx.commit()?;
    Ok(inventory.documents.len())
}

/// Makes `records` hold exactly `entries`: each record is replaced in full,
/// and rows for documents that were not parsed in this run are removed, so
/// the table always matches the export.
pub(crate) fn upsert_records(
    connection: &mut Connection,
    entries: &[DiseaseEntry],
    parsed_at: &str,
) -> Result<usize> {
    let tx = connection.transaction()?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO records(
              doc_id, name, content,
              clinical_condition, lab_criteria, epidemiology_condition,
              reporting_definition, classification, specimen_collection,
              suspected_case, probable_case, confirmed_case, english_name,
              populated_count, parsed_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(doc_id) DO UPDATE SET
              name=excluded.name,
              content=excluded.content,
              clinical_condition=excluded.clinical_condition,
              lab_criteria=excluded.lab_criteria,
              epidemiology_condition=excluded.epidemiology_condition,
              reporting_definition=excluded.reporting_definition,
              classification=excluded.classification,
              specimen_collection=excluded.specimen_collection,
              suspected_case=excluded.suspected_case,
              probable_case=excluded.probable_case,
              confirmed_case=excluded.confirmed_case,
              english_name=excluded.english_name,
              populated_count=excluded.populated_count,
              parsed_at=excluded.parsed_at
            ",
        )?;

        for entry in entries {
            let record = &entry.record;
            statement.execute(params![
                &entry.doc_id,
                &entry.name,
                &entry.content,
                &record.clinical_condition,
                &record.lab_criteria,
                &record.epidemiology_condition,
                &record.reporting_definition,
                &record.classification,
                &record.specimen_collection,
                &record.suspected_case,
                &record.probable_case,
                &record.confirmed_case,
                &record.english_name,
                record.populated_count() as i64,
                parsed_at,
            ])?;
        }
    }

    delete_unlisted_records(&tx, "records", entries)?;
    tx.commit()?;
    Ok(entries.len())
}

/// Manual counterpart of [`upsert_records`], with the same replacement rule.
pub(crate) fn upsert_manual_records(
    connection: &mut Connection,
    entries: &[ManualEntry],
    parsed_at: &str,
) -> Result<usize> {
    let tx = connection.transaction()?;

    {
        let mut statement = tx.prepare(
            "
            INSERT INTO manual_records(
              doc_id, name, content,
              overview, pathogen, epidemiology, reservoir, transmission,
              incubation_period, communicable_period, susceptibility,
              case_definition, specimen_collection, control_measures,
              populated_count, parsed_at
            )
            VALUES(?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16)
            ON CONFLICT(doc_id) DO UPDATE SET
              name=excluded.name,
              content=excluded.content,
              overview=excluded.overview,
              pathogen=excluded.pathogen,
              epidemiology=excluded.epidemiology,
              reservoir=excluded.reservoir,
              transmission=excluded.transmission,
              incubation_period=excluded.incubation_period,
              communicable_period=excluded.communicable_period,
              susceptibility=excluded.susceptibility,
              case_definition=excluded.case_definition,
              specimen_collection=excluded.specimen_collection,
              control_measures=excluded.control_measures,
              populated_count=excluded.populated_count,
              parsed_at=excluded.parsed_at
            ",
        )?;

        for entry in entries {
            let record = &entry.record;
            statement.execute(params![
                &entry.doc_id,
                &entry.name,
                &entry.content,
                &record.overview,
                &record.pathogen,
                &record.epidemiology,
                &record.reservoir,
                &record.transmission,
                &record.incubation_period,
                &record.communicable_period,
                &record.susceptibility,
                &record.case_definition,
                &record.specimen_collection,
                &record.control_measures,
                record.populated_count() as i64,
                parsed_at,
            ])?;
        }
    }

    delete_unlisted_records(&tx, "manual_records", entries)?;
    tx.commit()?;
    Ok(entries.len())
}

fn delete_unlisted_records<R>(
    connection: &Connection,
    table: &str,
    entries: &[DocumentEntry<R>],
) -> Result<usize> {
    let parsed = entries
        .iter()
        .map(|entry| entry.doc_id.as_str())
        .collect::<Vec<&str>>();
    let removed = connection
        .execute(
            &format!("DELETE FROM {table} WHERE doc_id NOT IN (SELECT value FROM json_each(?1))"),
            [encode_doc_ids(&parsed)?],
        )
        .with_context(|| format!("failed to prune stale rows from {table}"))?;

    if removed > 0 {
        info!(table, removed, "removed records not produced by this run");
    }
    Ok(removed)
}

fn encode_doc_ids(doc_ids: &[&str]) -> Result<String> {
    serde_json::to_string(doc_ids).context("failed to encode doc_id list")
}

pub(crate) fn sync_fts_index(connection: &Connection) -> Result<()> {
    connection
        .execute("INSERT INTO records_fts(records_fts) VALUES('rebuild')", [])
        .context("failed to rebuild FTS index")?;
    Ok(())
}

pub(crate) fn count_rows(connection: &Connection, sql: &str) -> Result<i64> {
    let count = connection.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}
