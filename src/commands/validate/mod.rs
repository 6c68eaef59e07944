use anyhow::{Context, Result, bail};
use rusqlite::{Connection, OpenFlags};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::ValidateArgs;
use crate::commands::ingest::DB_FILENAME;
use crate::parse::{RecordFields, StructuredRecord};
use crate::util::{now_utc_string, write_json_pretty};

mod coverage;
mod run;
#[cfg(test)]
mod tests;

use self::coverage::*;

pub use self::run::run;
