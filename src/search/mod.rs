//! Search module - deduplicated log store + FTS5 index primitives / 搜索模块
//!
//! Architecture principles / 架构原则：
//! - Search module only exposes primitive operations: insert, insert_batch, delete, search
//! - Importer controls reading, batching, progress and interruption
//! - Call direction: Import / API → Search (unidirectional) / 调用方向
//!
//! Index features / 索引特性：
//! - SQLite FTS5 external content table over logs_raw (no duplicated text)
//! - Store row and index entry written in the same transaction
//! - Phrase / prefix query translation with quote escaping

pub mod fingerprint;
pub mod query;
pub mod schema;
pub mod service;
pub mod store;
pub mod sync;

pub use fingerprint::fingerprint;
pub use query::{translate, FtsQuery, QueryMode};
pub use schema::{BatchReport, InsertOutcome, LogLine, PendingLine, SearchPage, StoreStats};
pub use service::SearchService;
pub use store::{ImportSession, LogStore};
