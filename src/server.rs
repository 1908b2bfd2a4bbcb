use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::collaborator::claude::ClaudeClient;
use crate::config::AppConfig;
use crate::sandbox::Sandbox;

/// Shared application state. Runs are independent of each other, so this
/// holds only immutable handles: the config, the collaborator client, and
/// the sandbox. Per-run state lives inside each engine invocation.
pub struct AppState {
    pub config: AppConfig,
    pub claude: ClaudeClient,
    pub sandbox: Sandbox,
}

impl AppState {
    pub fn new(config: AppConfig) -> Self {
        let claude = ClaudeClient::new(
            &config.claude.api_key,
            &config.claude.model,
            config.claude.max_tokens,
        );
        let sandbox = Sandbox::new(&config.sandbox);

        Self {
            config,
            claude,
            sandbox,
        }
    }
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/api/repair", post(crate::api::handlers::repair))
        .route("/api/optimize", post(crate::api::handlers::optimize))
        .route("/api/harden", post(crate::api::handlers::harden))
        .route("/health", get(health_check))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn health_check() -> &'static str {
    "ok"
}
