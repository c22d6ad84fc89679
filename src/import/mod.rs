//! Bulk ingestion of log files / 日志文件批量导入
//!
//! The importer owns reading, batching, progress and interruption;
//! the search module only provides chunk commits (see `LogStore::begin_import`).

pub mod importer;
pub mod state;

pub use importer::{BulkImporter, ChunkSink, ImportOutcome, ImportReport, DEFAULT_CHUNK_SIZE};
pub use state::{ImportPhase, ImportProgress, ImportState};
