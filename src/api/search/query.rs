use axum::{
    extract::{ConnectInfo, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;
use std::sync::Arc;

use super::types::*;
use crate::api::ApiResponse;
use crate::state::AppState;

pub async fn search(
    State(state): State<Arc<AppState>>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Json(req): Json<SearchRequest>,
) -> Response {
    // 冷却期内的请求直接丢弃，不返回内容
    if !state.gate.admit_now(addr.ip()).is_allowed() {
        tracing::debug!("Dropped search from {} (cooldown)", addr.ip());
        return StatusCode::TOO_MANY_REQUESTS.into_response();
    }

    let query = req.query.trim();
    if query.chars().count() < state.min_query_chars {
        return Json(ApiResponse::<SearchResponse>::error("Query too short.")).into_response();
    }

    let limit = req.limit.unwrap_or(state.page_size).min(MAX_LIMIT);

    match state.search.search(query, limit).await {
        Ok(page) => {
            let hidden = page.hidden();
            Json(ApiResponse::success(SearchResponse {
                query: query.to_string(),
                results: page.lines,
                total: page.total_count,
                hidden,
            }))
            .into_response()
        }
        Err(e) => {
            tracing::error!("Search failed for {:?}: {}", query, e);
            Json(ApiResponse::<SearchResponse>::error(&format!("Database Error: {}", e))).into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::extract::connect_info::MockConnectInfo;
    use axum::http::Request;
    use logsift::config::AppConfig;
    use logsift::search::{LogStore, PendingLine, SearchService};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn test_app(lines: &[&str]) -> (tempfile::TempDir, axum::Router) {
        let dir = tempfile::tempdir().unwrap();
        let store = LogStore::open_and_init(dir.path().join("logs.db")).await.unwrap();
        let batch: Vec<PendingLine> = lines.iter().map(|l| PendingLine::new(*l)).collect();
        store.insert_batch(&batch).await.unwrap();

        let state = Arc::new(AppState::new(SearchService::new(Arc::new(store)), &AppConfig::default()));
        let app = crate::api::router(state).layer(MockConnectInfo(SocketAddr::from(([127, 0, 0, 1], 4000))));
        (dir, app)
    }

    fn search_request(body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/api/search")
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_search_returns_page() {
        let (_dir, app) = test_app(&["nginx: upstream timed out", "nginx: worker started"]).await;

        let response = app.oneshot(search_request(r#"{"query":"  upstream  "}"#)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body = json_body(response).await;
        assert_eq!(body["code"], 200);
        assert_eq!(body["data"]["results"][0], "nginx: upstream timed out");
        assert_eq!(body["data"]["total"], 1);
    }

    #[tokio::test]
    async fn test_short_query_rejected() {
        let (_dir, app) = test_app(&[]).await;

        let response = app.oneshot(search_request(r#"{"query":" x "}"#)).await.unwrap();
        let body = json_body(response).await;
        assert_eq!(body["code"], 500);
        assert_eq!(body["message"], "Query too short.");
    }

    #[tokio::test]
    async fn test_flood_from_same_ip_is_dropped() {
        let (_dir, app) = test_app(&["one line"]).await;

        let first = app.clone().oneshot(search_request(r#"{"query":"one"}"#)).await.unwrap();
        let second = app.oneshot(search_request(r#"{"query":"one"}"#)).await.unwrap();

        assert_eq!(first.status(), StatusCode::OK);
        assert_eq!(second.status(), StatusCode::TOO_MANY_REQUESTS);
        let bytes = axum::body::to_bytes(second.into_body(), usize::MAX).await.unwrap();
        assert!(bytes.is_empty());
    }
}
