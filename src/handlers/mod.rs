pub mod referrals;
pub mod webhooks;

use axum::{Json, Router, routing::get};
use serde::Serialize;

use crate::db::AppState;

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// All routes served by the attribution service.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .merge(referrals::router())
        .merge(webhooks::router())
}
