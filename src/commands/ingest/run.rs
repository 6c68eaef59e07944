use super::*;

const CASE_DEFINITION_EXPORT_STEM: &str = "diseases";
const MANUAL_EXPORT_STEM: &str = "disease_manuals";

/// What one kind-specific branch of the run stored and exported.
struct StoredRun {
    records_table: &'static str,
    processed: usize,
    structured: usize,
    with_cases: usize,
    with_english_name: usize,
    warnings: Vec<String>,
    export_json_path: PathBuf,
    export_csv_path: PathBuf,
    notes: Vec<String>,
}

pub fn run(args: IngestArgs) -> Result<()> {
    let started_ts = Utc::now();
    let started_at = now_utc_string();
    let run_id = format!("run-{}", utc_compact_string(started_ts));

    let cache_root = args.cache_root.clone();
    let manifest_dir = cache_root.join("manifests");
    ensure_directory(&manifest_dir)?;

    let inventory_manifest_path = args
        .inventory_manifest_path
        .clone()
        .unwrap_or_else(|| inventory::default_manifest_path(&cache_root, args.kind));
    let ingest_manifest_path = args.ingest_manifest_path.clone().unwrap_or_else(|| {
        manifest_dir.join(format!(
            "ingest_run_{}.json",
            utc_compact_string(started_ts)
        ))
    });
    let catalog_path = args
        .catalog_path
        .clone()
        .unwrap_or_else(|| inventory::default_catalog_path(&cache_root, args.kind));
    let db_path = args
        .db_path
        .clone()
        .unwrap_or_else(|| cache_root.join(DB_FILENAME));
    let export_dir = args
        .export_dir
        .clone()
        .unwrap_or_else(|| cache_root.join("exports"));

    info!(
        cache_root = %cache_root.display(),
        run_id = %run_id,
        kind = args.kind.as_str(),
        "starting ingest"
    );

    let inventory = load_or_refresh_inventory(
        &cache_root,
        args.kind,
        &inventory_manifest_path,
        &catalog_path,
        args.refresh_inventory,
    )?;

    let parser = DocumentParser::new()?;
    let texts_dir = inventory::texts_dir(&cache_root, args.kind);

    let mut connection = Connection::open(&db_path)
        .with_context(|| format!("failed to open {}", db_path.display()))?;
    configure_connection(&connection)?;
    ensure_schema(&connection)?;

    let docs_upserted = upsert_docs(&mut connection, args.kind, &inventory)?;
    let parsed_at = now_utc_string();

    let stored = match args.kind {
        DocumentKind::CaseDefinition => {
            let outcome = parse_documents(&texts_dir, &inventory.documents, |document| {
                parser.parse(document)
            });
            upsert_records(&mut connection, &outcome.entries, &parsed_at)?;
            sync_fts_index(&connection)?;
            let (export_json_path, export_csv_path) =
                write_exports(&export_dir, CASE_DEFINITION_EXPORT_STEM, &outcome.entries)?;
            let (with_cases, with_english_name) = summarize_case_entries(&outcome.entries);

            StoredRun {
                records_table: "records",
                processed: outcome.entries.len(),
                structured: count_structured(&outcome.entries),
                with_cases,
                with_english_name,
                warnings: outcome.warnings,
                export_json_path,
                export_csv_path,
                notes: vec![
                    "Section segmentation uses full-line header matching on NFKC-normalized text."
                        .to_string(),
                    "Records without recognized headers keep their raw content for display."
                        .to_string(),
                ],
            }
        }
        DocumentKind::Manual => {
            let outcome = parse_documents(&texts_dir, &inventory.documents, |document| {
                parser.parse_manual(document)
            });
            upsert_manual_records(&mut connection, &outcome.entries, &parsed_at)?;
            let (export_json_path, export_csv_path) =
                write_exports(&export_dir, MANUAL_EXPORT_STEM, &outcome.entries)?;

            StoredRun {
                records_table: "manual_records",
                processed: outcome.entries.len(),
                structured: count_structured(&outcome.entries),
                with_cases: 0,
                with_english_name: 0,
                warnings: outcome.warnings,
                export_json_path,
                export_csv_path,
                notes: vec![
                    "Manual chapters require an ordinal and may carry an English gloss."
                        .to_string(),
                    "Running page headers and footers are dropped before segmentation."
                        .to_string(),
                ],
            }
        }
    };

    let docs_total = count_rows(&connection, "SELECT COUNT(*) FROM docs")?;
    let records_total = count_rows(
        &connection,
        &format!("SELECT COUNT(*) FROM {}", stored.records_table),
    )?;
    let processed = stored.processed;

    let manifest = IngestRunManifest {
        manifest_version: 1,
        run_id: run_id.clone(),
        document_kind: args.kind.as_str().to_string(),
        db_schema_version: DB_SCHEMA_VERSION.to_string(),
        status: "completed".to_string(),
        started_at,
        updated_at: now_utc_string(),
        command: render_ingest_command(&args),
        paths: IngestPaths {
            cache_root: cache_root.display().to_string(),
            manifest_dir: manifest_dir.display().to_string(),
            inventory_manifest_path: inventory_manifest_path.display().to_string(),
            db_path: db_path.display().to_string(),
            export_json_path: stored.export_json_path.display().to_string(),
            export_csv_path: stored.export_csv_path.display().to_string(),
        },
        counts: IngestCounts {
            document_count: inventory.document_count,
            processed_document_count: processed,
            skipped_document_count: inventory.documents.len().saturating_sub(processed),
            docs_upserted,
            docs_total,
            records_total,
            structured_record_count: stored.structured,
            unstructured_record_count: processed.saturating_sub(stored.structured),
            case_definition_record_count: stored.with_cases,
            english_name_count: stored.with_english_name,
        },
        source_hashes: inventory.documents,
        warnings: stored.warnings,
        notes: stored.notes,
    };

    write_json_pretty(&ingest_manifest_path, &manifest)?;

    info!(path = %ingest_manifest_path.display(), "wrote ingest run manifest");
    info!(
        docs = docs_total,
        records = records_total,
        structured = stored.structured,
        "ingest completed"
    );

    Ok(())
}

fn load_or_refresh_inventory(
    cache_root: &Path,
    kind: DocumentKind,
    inventory_manifest_path: &Path,
    catalog_path: &Path,
    refresh_inventory: bool,
) -> Result<TextInventoryManifest> {
    if refresh_inventory || !inventory_manifest_path.exists() {
        let manifest = inventory::build_manifest(cache_root, kind, catalog_path)?;
        write_json_pretty(inventory_manifest_path, &manifest)?;
        info!(
            path = %inventory_manifest_path.display(),
            document_count = manifest.document_count,
            "refreshed inventory manifest"
        );
        return Ok(manifest);
    }

    let raw = fs::read(inventory_manifest_path)
        .with_context(|| format!("failed to read {}", inventory_manifest_path.display()))?;
    let manifest: TextInventoryManifest = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", inventory_manifest_path.display()))?;

    info!(
        path = %inventory_manifest_path.display(),
        document_count = manifest.document_count,
        "loaded existing inventory manifest"
    );

    Ok(manifest)
}

pub(super) fn render_ingest_command(args: &IngestArgs) -> String {
    let mut command = vec![
        "casedef".to_string(),
        "ingest".to_string(),
        "--cache-root".to_string(),
        args.cache_root.display().to_string(),
    ];
    if args.kind != DocumentKind::CaseDefinition {
        command.push("--kind".to_string());
        command.push(args.kind.as_str().to_string());
    }

    let optional_paths = [
        ("--inventory-manifest-path", &args.inventory_manifest_path),
        ("--ingest-manifest-path", &args.ingest_manifest_path),
        ("--catalog-path", &args.catalog_path),
        ("--db-path", &args.db_path),
        ("--export-dir", &args.export_dir),
    ];
    for (flag, path) in optional_paths {
        if let Some(path) = path {
            command.push(flag.to_string());
            command.push(path.display().to_string());
        }
    }
    if args.refresh_inventory {
        command.push("--refresh-inventory".to_string());
    }

    command.join(" ")
}
