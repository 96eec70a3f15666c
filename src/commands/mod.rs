pub mod cleanup;
pub mod ingest;
pub mod list;
pub mod section;
pub mod status;
