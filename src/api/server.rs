use axum::{extract::State, Json};
use serde_json::{json, Value};
use std::sync::Arc;

use super::ApiResponse;
use crate::state::AppState;
use logsift::search::StoreStats;

/// 健康检查
pub async fn health_check() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
        "build_time": env!("BUILD_TIME"),
    }))
}

/// 日志库统计
pub async fn get_stats(State(state): State<Arc<AppState>>) -> Json<ApiResponse<StoreStats>> {
    match state.search.store().stats().await {
        Ok(stats) => Json(ApiResponse::success(stats)),
        Err(e) => {
            tracing::error!("Failed to read store stats: {}", e);
            Json(ApiResponse::error(&format!("Database Error: {}", e)))
        }
    }
}
