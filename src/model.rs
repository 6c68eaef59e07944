use serde::{Deserialize, Serialize};

use crate::parse::{ManualRecord, StructuredRecord};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextEntry {
    pub doc_id: String,
    pub filename: String,
    pub sha256: String,
    pub byte_count: u64,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub source_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextInventoryManifest {
    pub manifest_version: u32,
    pub generated_at: String,
    #[serde(default)]
    pub document_kind: String,
    pub source_directory: String,
    pub catalog_path: Option<String>,
    pub document_count: usize,
    pub catalog_matched_count: usize,
    pub documents: Vec<TextEntry>,
}

/// One row of the disease listing collected alongside the PDFs.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub name: String,
    pub url: String,
    #[serde(default)]
    pub source_category: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestPaths {
    pub cache_root: String,
    pub manifest_dir: String,
    pub inventory_manifest_path: String,
    pub db_path: String,
    pub export_json_path: String,
    pub export_csv_path: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestCounts {
    pub document_count: usize,
    pub processed_document_count: usize,
    pub skipped_document_count: usize,
    pub docs_upserted: usize,
    pub docs_total: i64,
    pub records_total: i64,
    pub structured_record_count: usize,
    pub unstructured_record_count: usize,
    pub case_definition_record_count: usize,
    pub english_name_count: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestRunManifest {
    pub manifest_version: u32,
    pub run_id: String,
    #[serde(default)]
    pub document_kind: String,
    pub db_schema_version: String,
    pub status: String,
    pub started_at: String,
    pub updated_at: String,
    pub command: String,
    pub paths: IngestPaths,
    pub counts: IngestCounts,
    pub source_hashes: Vec<TextEntry>,
    pub warnings: Vec<String>,
    pub notes: Vec<String>,
}

/// Exported form of a parsed document: source metadata, the raw content for
/// fallback display, and the record keys flattened alongside.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentEntry<R> {
    pub doc_id: String,
    pub name: String,
    pub url: String,
    pub source_category: String,
    pub source_path: String,
    pub content: String,
    #[serde(flatten)]
    pub record: R,
}

pub type DiseaseEntry = DocumentEntry<StructuredRecord>;
pub type ManualEntry = DocumentEntry<ManualRecord>;
