//! HTTP front end: the analysis page, a JSON API and a health check.

mod handlers;
pub mod render;

use std::net::SocketAddr;

use axum::{
    routing::{get, post},
    Router,
};
use log::info;

use crate::scorer::global::SharedScorer;

pub use handlers::{AnalyzeForm, AnalyzeRequest};

/// Shared state for the HTTP handlers
#[derive(Clone)]
pub struct AppState {
    pub scorer: SharedScorer,
}

impl AppState {
    pub fn new(scorer: SharedScorer) -> Self {
        Self { scorer }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/analyze", post(handlers::analyze_form))
        .route("/api/analyze", post(handlers::analyze_json))
        .route("/health", get(handlers::health))
        .with_state(state)
}

/// Serve the front end until the process is stopped
pub async fn serve(addr: SocketAddr, state: AppState) -> std::io::Result<()> {
    let app = router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, app).await
}
