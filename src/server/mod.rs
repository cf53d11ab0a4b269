// HTTP API server.
// Axum router exposing pull request listings and helpers to web frontends and agents.

pub mod error;
pub mod handlers;
pub mod middleware;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::{Router, routing::get};
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::error::Result;

pub use error::ApiError;
pub use state::AppState;

/// Create the API router.
pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/pull-requests", get(handlers::list_pull_requests))
        .route("/api/user/repos", get(handlers::list_user_repositories))
        .route("/api/agent/tools", get(handlers::list_agent_tools))
        .route("/api/pr/{number}/summary", get(handlers::summarize_pull_request))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::cors_layer())
        .with_state(state)
}

/// Serve the API on `addr` until Ctrl-C.
pub async fn serve(state: AppState, addr: SocketAddr) -> Result<()> {
    let listener = TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "listening");

    axum::serve(listener, create_router(Arc::new(state)))
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await?;
    Ok(())
}
