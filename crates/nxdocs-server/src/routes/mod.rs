//! HTTP route modules.
//!
//! Each submodule exposes a `router()` returning `Router<Arc<AppState>>`.
//! [`build_router`] nests them under `/api` and applies the shared layers.

pub mod modules;
pub mod protocols;
pub mod saved_commands;
pub mod tutorials;

use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderValue, Method, header};
use tower_http::cors::{Any, CorsLayer};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

/// Build the complete application router.
pub fn build_router(state: Arc<AppState>) -> Router {
    let api = Router::new()
        .nest("/modules", modules::router())
        .nest("/protocols", protocols::router())
        .nest("/tutorials", tutorials::router())
        .nest("/saved-commands", saved_commands::router());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE]);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(SetResponseHeaderLayer::overriding(
            header::X_CONTENT_TYPE_OPTIONS,
            HeaderValue::from_static("nosniff"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            header::X_FRAME_OPTIONS,
            HeaderValue::from_static("DENY"),
        ))
        .with_state(state)
}
