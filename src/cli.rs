use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "casedef",
    version,
    about = "Structured extraction of notifiable-disease case definitions"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Inventory(InventoryArgs),
    Ingest(IngestArgs),
    Parse(ParseArgs),
    Query(QueryArgs),
    Status(StatusArgs),
    Validate(ValidateArgs),
}

/// Which family of source documents a command works on. Each kind keeps its
/// own text directory, inventory, table and export files.
#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum DocumentKind {
    CaseDefinition,
    Manual,
}

impl DocumentKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CaseDefinition => "case-definition",
            Self::Manual => "manual",
        }
    }
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, default_value = ".cache/casedef")]
    pub cache_root: PathBuf,

    #[arg(long, value_enum, default_value_t = DocumentKind::CaseDefinition)]
    pub kind: DocumentKind,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct IngestArgs {
    #[arg(long, default_value = ".cache/casedef")]
    pub cache_root: PathBuf,

    #[arg(long, value_enum, default_value_t = DocumentKind::CaseDefinition)]
    pub kind: DocumentKind,

    #[arg(long)]
    pub inventory_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub ingest_manifest_path: Option<PathBuf>,

    #[arg(long)]
    pub catalog_path: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub refresh_inventory: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ParseArgs {
    /// Extracted text file, or `-` for stdin.
    pub input: PathBuf,

    #[arg(long)]
    pub doc_id: Option<String>,

    #[arg(long, value_enum, default_value_t = DocumentKind::CaseDefinition)]
    pub kind: DocumentKind,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, default_value = ".cache/casedef")]
    pub cache_root: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct QueryArgs {
    #[arg(long, default_value = ".cache/casedef")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub query: String,

    #[arg(long, default_value_t = 10)]
    pub limit: usize,

    #[arg(long, default_value_t = false)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    #[arg(long, default_value = ".cache/casedef")]
    pub cache_root: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long)]
    pub coverage_report_path: Option<PathBuf>,

    #[arg(long, default_value_t = 3)]
    pub min_populated: usize,

    #[arg(long, default_value_t = false)]
    pub fail_on_flagged: bool,
}
