//! Audit log endpoint.
//!
//! - GET /admin/audit?entity=&limit= - Most recent admin mutations first

use axum::{
    Json, Router, debug_handler,
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
};
use shared::api::{AuditEntry, AuditLogQuery, AuditLogResponse};

use crate::{
    error::AppError,
    middleware::auth::AdminUser,
    repos::{AuditQuery, clamp_limit},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(get_audit_log))
}

#[debug_handler]
async fn get_audit_log(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(query): Query<AuditLogQuery>,
) -> Result<impl IntoResponse, AppError> {
    let events = state
        .repos
        .audit
        .query(AuditQuery {
            entity: query.entity.filter(|e| !e.trim().is_empty()),
            limit: clamp_limit(query.limit),
        })
        .await?;

    let entries = events
        .into_iter()
        .map(|e| AuditEntry {
            id: e.id,
            actor_id: e.actor_id,
            entity: e.entity,
            entity_id: e.entity_id,
            action: e.action,
            diff: e.diff,
            created_at: e.created_at,
        })
        .collect();

    Ok(Json(AuditLogResponse { entries }))
}
