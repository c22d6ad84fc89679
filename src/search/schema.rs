//! Log store schema and value types / 日志存储的 Schema 定义

use serde::{Deserialize, Serialize};

use super::fingerprint::fingerprint;

/// Raw line table / 原始日志表
pub(crate) const CREATE_LOGS_RAW: &str = r#"
    CREATE TABLE IF NOT EXISTS logs_raw (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        content TEXT NOT NULL,
        content_hash TEXT UNIQUE NOT NULL
    )
"#;

/// FTS5 external content index over logs_raw.content / 全文索引（外部内容表）
pub(crate) const CREATE_LOGS_FTS: &str = r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS logs_fts
    USING fts5(content, content='logs_raw', content_rowid='id')
"#;

/// Read-only view onto the index's own postings, used to list indexed ids / 索引词条视图
pub(crate) const CREATE_LOGS_VOCAB: &str = r#"
    CREATE VIRTUAL TABLE IF NOT EXISTS logs_vocab
    USING fts5vocab(logs_fts, 'instance')
"#;

/// One stored log line / 一条日志
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct LogLine {
    pub id: i64,
    pub content: String,
    #[sqlx(rename = "content_hash")]
    pub fingerprint: String,
}

/// A line waiting in an import batch / 待写入的日志行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingLine {
    pub content: String,
    pub fingerprint: String,
}

impl PendingLine {
    pub fn new(content: impl Into<String>) -> Self {
        let content = content.into();
        let fingerprint = fingerprint(&content);
        Self { content, fingerprint }
    }
}

/// Result of a single insert / 单条写入结果
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum InsertOutcome {
    /// New row created with this id / 新建
    Inserted(i64),
    /// Fingerprint already present, nothing written / 重复，忽略
    Duplicate,
}

impl InsertOutcome {
    pub fn is_inserted(&self) -> bool {
        matches!(self, InsertOutcome::Inserted(_))
    }
}

/// Per-batch insert counts / 批量写入统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchReport {
    pub inserted: u64,
    pub duplicates: u64,
}

impl BatchReport {
    pub fn record(&mut self, outcome: InsertOutcome) {
        match outcome {
            InsertOutcome::Inserted(_) => self.inserted += 1,
            InsertOutcome::Duplicate => self.duplicates += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.inserted + self.duplicates
    }
}

/// One page of search results / 搜索结果页
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchPage {
    /// Matching lines in relevance order / 按相关度排序的行
    pub lines: Vec<String>,
    /// Exact number of matching rows / 匹配总数
    pub total_count: u64,
}

impl SearchPage {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Matches not included in `lines` / 未显示的结果数
    pub fn hidden(&self) -> u64 {
        self.total_count.saturating_sub(self.lines.len() as u64)
    }
}

/// Store statistics / 存储统计
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StoreStats {
    pub line_count: u64,
    /// Database + WAL + SHM size in bytes / 数据库文件大小
    pub db_size: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_line_fingerprint_matches_content() {
        let line = PendingLine::new("GET /index.html 200");
        assert_eq!(line.fingerprint, fingerprint("GET /index.html 200"));
    }

    #[test]
    fn test_batch_report_counts() {
        let mut report = BatchReport::default();
        report.record(InsertOutcome::Inserted(1));
        report.record(InsertOutcome::Duplicate);
        report.record(InsertOutcome::Inserted(2));
        assert_eq!(report.inserted, 2);
        assert_eq!(report.duplicates, 1);
        assert_eq!(report.total(), 3);
    }

    #[test]
    fn test_hidden_count() {
        let page = SearchPage {
            lines: vec!["a".into(), "b".into()],
            total_count: 5,
        };
        assert_eq!(page.hidden(), 3);
        assert_eq!(SearchPage::empty().hidden(), 0);
    }
}
