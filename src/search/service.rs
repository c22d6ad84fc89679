//! Search service: translate, match, materialize, count / 搜索服务

use std::sync::Arc;

use super::query::translate;
use super::schema::SearchPage;
use super::store::LogStore;
use crate::error::Result;

/// Bounded, relevance-ordered search over the log store / 搜索服务
#[derive(Clone)]
pub struct SearchService {
    store: Arc<LogStore>,
}

impl SearchService {
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Search / 搜索
    ///
    /// Returns at most `limit` lines ordered by FTS5 rank plus the exact
    /// number of matching rows. No match is an empty page, not an error.
    pub async fn search(&self, raw_query: &str, limit: usize) -> Result<SearchPage> {
        let query = translate(raw_query);
        if query.is_empty() {
            tracing::debug!("Query {:?} has no searchable tokens", raw_query);
            return Ok(SearchPage::empty());
        }

        // page, rows and count from one snapshot
        let mut tx = self.store.pool().begin().await?;

        let ids: Vec<(i64,)> = sqlx::query_as(
            r#"
            SELECT rowid
            FROM logs_fts
            WHERE logs_fts MATCH ?
            ORDER BY rank
            LIMIT ?
            "#,
        )
        .bind(&query.expr)
        .bind(limit as i64)
        .fetch_all(&mut *tx)
        .await?;

        let ids: Vec<i64> = ids.into_iter().map(|(id,)| id).collect();
        let lines = LogStore::fetch_contents(&mut tx, &ids).await?;

        let (total,): (i64,) = sqlx::query_as("SELECT count(*) FROM logs_fts WHERE logs_fts MATCH ?")
            .bind(&query.expr)
            .fetch_one(&mut *tx)
            .await?;

        tx.commit().await?;

        tracing::debug!(
            "Search {:?} ({:?}) -> {} lines of {}",
            raw_query,
            query.mode,
            lines.len(),
            total
        );

        Ok(SearchPage {
            lines,
            total_count: total as u64,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::search::schema::PendingLine;

    async fn service_with(lines: &[&str]) -> (tempfile::TempDir, SearchService) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open_and_init(dir.path().join("logs.db")).await.unwrap();
        let batch: Vec<PendingLine> = lines.iter().map(|l| PendingLine::new(*l)).collect();
        store.insert_batch(&batch).await.unwrap();
        (dir, SearchService::new(Arc::new(store)))
    }

    #[tokio::test]
    async fn test_limit_and_exact_total() {
        let lines: Vec<String> = (0..25).map(|i| format!("timeout contacting upstream node{}", i)).collect();
        let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
        let (_dir, service) = service_with(&refs).await;

        let page = service.search("timeout", 20).await.unwrap();
        assert_eq!(page.lines.len(), 20);
        assert_eq!(page.total_count, 25);
        assert_eq!(page.hidden(), 5);
    }

    #[tokio::test]
    async fn test_no_match_is_empty_page() {
        let (_dir, service) = service_with(&["connection reset by peer"]).await;

        let page = service.search("zebra", 20).await.unwrap();
        assert_eq!(page, SearchPage::empty());
    }

    #[tokio::test]
    async fn test_prefix_matches_ip_and_longer_tokens() {
        let (_dir, service) = service_with(&[
            "Accepted publickey from 192.168.1.1 port 22",
            "Accepted publickey from 192.168.1.10 port 22",
            "Accepted publickey from 10.0.0.1 port 22",
        ])
        .await;

        let page = service.search("192.168.1.1", 20).await.unwrap();
        assert_eq!(page.total_count, 2);

        let page = service.search("publ", 20).await.unwrap();
        assert_eq!(page.total_count, 3);
    }

    #[tokio::test]
    async fn test_phrase_requires_contiguous_words() {
        let (_dir, service) = service_with(&[
            "an error occurred while saving",
            "occurred: error while saving",
        ])
        .await;

        let page = service.search("error occurred", 20).await.unwrap();
        assert_eq!(page.lines, vec!["an error occurred while saving"]);
        assert_eq!(page.total_count, 1);
    }

    #[tokio::test]
    async fn test_quote_input_does_not_break_query() {
        let (_dir, service) = service_with(&["user \"admin\" logged in"]).await;

        let page = service.search("\"admin\" logged", 20).await.unwrap();
        assert_eq!(page.total_count, 1);

        assert!(service.search("a\" OR \"b", 20).await.is_ok());
    }

    #[tokio::test]
    async fn test_punctuation_only_query_is_empty() {
        let (_dir, service) = service_with(&["--- separator ---"]).await;
        assert_eq!(service.search("--", 20).await.unwrap(), SearchPage::empty());
    }

    #[tokio::test]
    async fn test_zero_limit_still_counts() {
        let (_dir, service) = service_with(&["kernel panic", "kernel oops"]).await;

        let page = service.search("kernel", 0).await.unwrap();
        assert!(page.lines.is_empty());
        assert_eq!(page.total_count, 2);
    }

    #[tokio::test]
    async fn test_storage_failure_is_error() {
        let (_dir, service) = service_with(&["closing soon"]).await;
        service.store().close().await;

        let err = service.search("closing", 20).await.unwrap_err();
        assert!(err.is_storage());
    }
}
