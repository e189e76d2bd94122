pub mod ingest;

pub use ingest::{ingest, IngestReport};
