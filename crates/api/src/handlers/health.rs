//! Health check endpoint for load balancers and monitoring.
//!
//! Returns 200 OK if the database is reachable, 503 Service Unavailable
//! otherwise. Published catalog counts are included when available.

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use serde::Serialize;

use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(health_check))
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    database: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_products: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    published_assets: Option<i64>,
}

async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let db_ok = state.repos.status.health_check().await.unwrap_or(false);

    let counts = if db_ok {
        state.repos.status.published_counts().await.ok()
    } else {
        None
    };

    let response = HealthResponse {
        status: if db_ok { "ok" } else { "unhealthy" },
        database: db_ok,
        published_products: counts.map(|c| c.products),
        published_assets: counts.map(|c| c.assets),
    };

    let status = if db_ok {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status, Json(response))
}
