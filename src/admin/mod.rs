//! Operational routes.
//!
//! Read-only views for operators: liveness, version and breaker states.

pub mod handlers;

use axum::{routing::get, Router};

use self::handlers::*;
use crate::http::server::AppState;

pub fn setup_admin_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(get_health))
        .route("/admin/status", get(get_status))
        .route("/admin/breakers", get(get_breakers))
}
