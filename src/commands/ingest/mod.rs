use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use rayon::prelude::*;
use rusqlite::{Connection, params};
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::cli::{DocumentKind, IngestArgs};
use crate::commands::inventory;
use crate::model::{
    DiseaseEntry, DocumentEntry, IngestCounts, IngestPaths, IngestRunManifest, ManualEntry,
    TextEntry, TextInventoryManifest,
};
use crate::parse::{DocumentParser, RawDocument, RecordFields, StructuredRecord};
use crate::util::{
    ensure_directory, now_utc_string, utc_compact_string, write_json_pretty, write_text_with_bom,
};

pub(crate) const DB_SCHEMA_VERSION: &str = "0.2.0";
pub(crate) const DB_FILENAME: &str = "casedef_index.sqlite";

mod db_setup;
mod export;
mod parse_documents;
mod run;

pub use run::run;

pub(crate) use db_setup::*;
use export::*;
use parse_documents::*;
