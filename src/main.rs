use std::net::SocketAddr;
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod state;

use logsift::config;
use logsift::search::{LogStore, SearchService};
use state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "logsift=debug,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration / 加载配置
    let app_config = config::load_config()?;
    tracing::info!("Server will listen on {}:{}", app_config.server.host, app_config.server.port);

    // Open (and create if needed) the log database / 打开日志数据库
    let db_path = app_config.get_db_path();
    let store = Arc::new(LogStore::open_and_init(&db_path).await?);
    let stats = store.stats().await?;
    tracing::info!("Log store ready: {} lines, {} bytes", stats.line_count, stats.db_size);

    let state = Arc::new(AppState::new(SearchService::new(store.clone()), &app_config));
    tracing::info!("Search cooldown per caller: {:?}", state.gate.cooldown());

    let app = api::router(state);

    let bind_addr = app_config.get_bind_address();
    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!("Server running at http://{}", bind_addr);

    axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
        .with_graceful_shutdown(async {
            tokio::signal::ctrl_c().await.ok();
            tracing::info!("Shutdown requested");
        })
        .await?;

    store.close().await;
    tracing::info!("Server stopped");
    Ok(())
}
