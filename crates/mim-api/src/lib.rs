//! MIM-7 Compliance Checker API

pub mod config;
pub mod middleware;
pub mod routes;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use chrono::{DateTime, Utc};
use config::ApiConfig;
use mim_core::{CoreResult, Dispatcher};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers
pub struct AppState {
    pub dispatcher: Dispatcher,
    pub config: ApiConfig,
    /// Set once at startup; only `/ping` reads it
    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(config: ApiConfig) -> CoreResult<Self> {
        let dispatcher = Dispatcher::with_config(&config.probe)?;
        Ok(Self::with_dispatcher(dispatcher, config))
    }

    pub fn with_dispatcher(dispatcher: Dispatcher, config: ApiConfig) -> Self {
        Self {
            dispatcher,
            config,
            started_at: Utc::now(),
        }
    }
}

/// Build the router
pub fn app(state: Arc<AppState>) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        // Liveness
        .route("/ping", get(routes::ping))

        // Compliance checks
        .route("/r1", get(routes::compliance::check_service))
        .route(
            "/r2",
            post(routes::geopackage::check_geopackage).layer(DefaultBodyLimit::max(upload_limit)),
        )

        // Request correlation
        .layer(axum::middleware::from_fn(middleware::request_context))

        // CORS
        .layer(CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any))

        // Tracing
        .layer(TraceLayer::new_for_http())

        // State
        .with_state(state)
}
