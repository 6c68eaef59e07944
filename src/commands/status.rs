use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rusqlite::{Connection, OpenFlags};
use tracing::{info, warn};

use crate::cli::{DocumentKind, StatusArgs};
use crate::commands::ingest::DB_FILENAME;
use crate::commands::inventory;
use crate::model::{IngestRunManifest, TextInventoryManifest};

pub fn run(args: StatusArgs) -> Result<()> {
    let manifest_dir = args.cache_root.join("manifests");
    let db_path = args.cache_root.join(DB_FILENAME);

    info!(cache_root = %args.cache_root.display(), "status requested");

    for kind in [DocumentKind::CaseDefinition, DocumentKind::Manual] {
        let inventory_path = inventory::default_manifest_path(&args.cache_root, kind);
        if inventory_path.exists() {
            let raw = fs::read(&inventory_path)
                .with_context(|| format!("failed to read {}", inventory_path.display()))?;
            let inventory: TextInventoryManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", inventory_path.display()))?;

            info!(
                kind = kind.as_str(),
                generated_at = %inventory.generated_at,
                document_count = inventory.document_count,
                catalog_matched_count = inventory.catalog_matched_count,
                "loaded inventory manifest"
            );
        } else {
            warn!(kind = kind.as_str(), path = %inventory_path.display(), "inventory manifest missing");
        }
    }

    match latest_ingest_manifest(&manifest_dir)? {
        Some(path) => {
            let raw =
                fs::read(&path).with_context(|| format!("failed to read {}", path.display()))?;
            let manifest: IngestRunManifest = serde_json::from_slice(&raw)
                .with_context(|| format!("failed to parse {}", path.display()))?;

            info!(
                run_id = %manifest.run_id,
                kind = %manifest.document_kind,
                status = %manifest.status,
                updated_at = %manifest.updated_at,
                processed = manifest.counts.processed_document_count,
                skipped = manifest.counts.skipped_document_count,
                structured = manifest.counts.structured_record_count,
                warnings = manifest.warnings.len(),
                "loaded latest ingest manifest"
            );
        }
        None => warn!(path = %manifest_dir.display(), "no ingest run manifest found"),
    }

    if db_path.exists() {
        let conn = Connection::open_with_flags(
            &db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .with_context(|| format!("failed to open {}", db_path.display()))?;
        let docs_count = query_count(&conn, "SELECT COUNT(*) FROM docs").unwrap_or(0);
        let records_count = query_count(&conn, "SELECT COUNT(*) FROM records").unwrap_or(0);
        let manual_records_count =
            query_count(&conn, "SELECT COUNT(*) FROM manual_records").unwrap_or(0);
        let english_count = query_count(
            &conn,
            "SELECT COUNT(*) FROM records WHERE english_name <> ''",
        )
        .unwrap_or(0);

        info!(
            path = %db_path.display(),
            docs = docs_count,
            records = records_count,
            manual_records = manual_records_count,
            with_english_name = english_count,
            "database status"
        );
    } else {
        warn!(path = %db_path.display(), "database file missing");
    }

    Ok(())
}

/// Run manifests carry a compact UTC timestamp in their name, so the
/// lexicographically greatest one is the newest.
fn latest_ingest_manifest(manifest_dir: &Path) -> Result<Option<PathBuf>> {
    if !manifest_dir.exists() {
        return Ok(None);
    }

    let mut latest: Option<PathBuf> = None;
    for entry in fs::read_dir(manifest_dir)
        .with_context(|| format!("failed to read directory {}", manifest_dir.display()))?
    {
        let path = entry?.path();
        let is_run_manifest = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(|name| name.starts_with("ingest_run_") && name.ends_with(".json"));
        if is_run_manifest && latest.as_ref().is_none_or(|current| path > *current) {
            latest = Some(path);
        }
    }

    Ok(latest)
}

fn query_count(conn: &Connection, sql: &str) -> Result<i64> {
    let count = conn.query_row(sql, [], |row| row.get(0))?;
    Ok(count)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn latest_ingest_manifest_picks_newest_run() {
        let dir = std::env::temp_dir().join(format!("casedef-status-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).expect("create dir");
        for name in [
            "ingest_run_20260101T000000Z.json",
            "ingest_run_20260301T000000Z.json",
            "text_inventory.json",
        ] {
            fs::write(dir.join(name), "{}").expect("write manifest");
        }

        let latest = latest_ingest_manifest(&dir).expect("scan").expect("found");
        assert_eq!(
            latest.file_name().and_then(|name| name.to_str()),
            Some("ingest_run_20260301T000000Z.json")
        );
        assert!(latest_ingest_manifest(&dir.join("missing")).expect("scan").is_none());

        let _ = fs::remove_dir_all(&dir);
    }
}
