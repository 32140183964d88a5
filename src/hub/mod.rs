//! Collaboration hub: a room-scoped relay for presence, cursor, and
//! document-update traffic.
//!
//! SYSTEM CONTEXT
//! ==============
//! The hub owns transient presence per room and nothing else. Document
//! authority lives on the clients; board persistence and authentication are
//! external collaborators. The router exposes the websocket endpoint plus a
//! health check.

pub mod state;
pub mod ws;

use axum::Router;
use axum::http::StatusCode;
use axum::routing::get;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use state::AppState;

/// Build the hub router.
#[must_use]
pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/ws", get(ws::handle_ws))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
