pub mod ingest;
pub mod inventory;
pub mod parse;
pub mod query;
pub mod status;
pub mod validate;
