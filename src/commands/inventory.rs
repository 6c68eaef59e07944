use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tracing::{info, warn};

use crate::cli::{DocumentKind, InventoryArgs};
use crate::model::{CatalogEntry, TextEntry, TextInventoryManifest};
use crate::util::{now_utc_string, sha256_file, write_json_pretty};

const TEXTS_DIR: &str = "texts";
const MANUAL_TEXTS_DIR: &str = "manual_texts";

pub fn run(args: InventoryArgs) -> Result<()> {
    let catalog_path = args
        .catalog_path
        .clone()
        .unwrap_or_else(|| default_catalog_path(&args.cache_root, args.kind));
    let manifest = build_manifest(&args.cache_root, args.kind, &catalog_path)?;

    if args.dry_run {
        info!(
            kind = args.kind.as_str(),
            document_count = manifest.document_count,
            catalog_matched = manifest.catalog_matched_count,
            source = %manifest.source_directory,
            "inventory dry-run complete"
        );
        return Ok(());
    }

    let manifest_path = args
        .manifest_path
        .unwrap_or_else(|| default_manifest_path(&args.cache_root, args.kind));

    write_json_pretty(&manifest_path, &manifest)?;
    info!(path = %manifest_path.display(), "wrote inventory manifest");
    info!(document_count = manifest.document_count, "inventory completed");

    Ok(())
}

pub fn default_manifest_path(cache_root: &Path, kind: DocumentKind) -> PathBuf {
    let filename = match kind {
        DocumentKind::CaseDefinition => "text_inventory.json",
        DocumentKind::Manual => "manual_inventory.json",
    };
    cache_root.join("manifests").join(filename)
}

pub fn default_catalog_path(cache_root: &Path, kind: DocumentKind) -> PathBuf {
    let filename = match kind {
        DocumentKind::CaseDefinition => "catalog.json",
        DocumentKind::Manual => "manual_catalog.json",
    };
    cache_root.join(filename)
}

pub fn texts_dir(cache_root: &Path, kind: DocumentKind) -> PathBuf {
    match kind {
        DocumentKind::CaseDefinition => cache_root.join(TEXTS_DIR),
        DocumentKind::Manual => cache_root.join(MANUAL_TEXTS_DIR),
    }
}

pub fn build_manifest(
    cache_root: &Path,
    kind: DocumentKind,
    catalog_path: &Path,
) -> Result<TextInventoryManifest> {
    let source_dir = texts_dir(cache_root, kind);
    let mut text_paths = discover_texts(&source_dir)?;
    text_paths.sort();

    if text_paths.is_empty() {
        bail!("no extracted text files found in {}", source_dir.display());
    }

    let catalog = load_catalog(catalog_path)?;
    let catalog_by_name = catalog
        .into_iter()
        .map(|entry| (entry.name.clone(), entry))
        .collect::<HashMap<String, CatalogEntry>>();

    let mut documents = Vec::with_capacity(text_paths.len());
    let mut catalog_matched_count = 0usize;
    for path in text_paths {
        let filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .map(ToOwned::to_owned)
            .with_context(|| format!("invalid UTF-8 filename: {}", path.display()))?;
        let stem = path
            .file_stem()
            .and_then(|stem| stem.to_str())
            .map(str::trim)
            .filter(|stem| !stem.is_empty())
            .with_context(|| format!("text file has no usable stem: {}", path.display()))?
            .to_string();

        let sha256 = sha256_file(&path)?;
        let byte_count = fs::metadata(&path)
            .with_context(|| format!("failed to stat {}", path.display()))?
            .len();

        let catalog_entry = match_catalog(&stem, &catalog_by_name);
        if catalog_entry.is_some() {
            catalog_matched_count += 1;
        } else if !catalog_by_name.is_empty() {
            warn!(document = %stem, "document not found in catalog");
        }

        documents.push(TextEntry {
            doc_id: stem.clone(),
            filename,
            sha256,
            byte_count,
            name: catalog_entry
                .map(|entry| entry.name.clone())
                .unwrap_or(stem),
            url: catalog_entry.map(|entry| entry.url.clone()),
            source_category: catalog_entry.and_then(|entry| entry.source_category.clone()),
        });
    }

    Ok(TextInventoryManifest {
        manifest_version: 1,
        generated_at: now_utc_string(),
        document_kind: kind.as_str().to_string(),
        source_directory: source_dir.display().to_string(),
        catalog_path: catalog_path
            .exists()
            .then(|| catalog_path.display().to_string()),
        document_count: documents.len(),
        catalog_matched_count,
        documents,
    })
}

/// A missing catalog is not an error; documents then keep their file stem as
/// display name.
pub fn load_catalog(path: &Path) -> Result<Vec<CatalogEntry>> {
    if !path.exists() {
        info!(path = %path.display(), "no catalog file, using file names");
        return Ok(Vec::new());
    }

    let raw = fs::read(path).with_context(|| format!("failed to read {}", path.display()))?;
    let catalog: Vec<CatalogEntry> = serde_json::from_slice(&raw)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    info!(path = %path.display(), entries = catalog.len(), "loaded catalog");
    Ok(catalog)
}

/// Exact name first, then the name with `_` read back as `/` since file
/// names cannot carry slashes.
fn match_catalog<'a>(
    stem: &str,
    catalog: &'a HashMap<String, CatalogEntry>,
) -> Option<&'a CatalogEntry> {
    catalog
        .get(stem)
        .or_else(|| catalog.get(&stem.replace('_', "/")))
}

fn discover_texts(texts_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut texts = Vec::new();

    let entries = fs::read_dir(texts_dir)
        .with_context(|| format!("failed to read {}", texts_dir.display()))?;

    for entry in entries {
        let entry =
            entry.with_context(|| format!("failed to read entry in {}", texts_dir.display()))?;
        let path = entry.path();

        if !entry
            .file_type()
            .with_context(|| format!("failed to inspect file type: {}", path.display()))?
            .is_file()
        {
            continue;
        }

        let is_text = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("txt"))
            .unwrap_or(false);

        if is_text {
            texts.push(path);
        }
    }

    Ok(texts)
}
