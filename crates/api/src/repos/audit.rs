//! Audit log repository for PostgreSQL.
//!
//! Admin mutations are recorded fire-and-forget: a failed insert is logged but
//! never fails the mutation that triggered it.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use crate::models::{AuditAction, AuditEvent};

/// Default and maximum number of events returned by a query.
pub const DEFAULT_AUDIT_LIMIT: i64 = 50;
pub const MAX_AUDIT_LIMIT: i64 = 500;

/// Query parameters for audit log filtering.
#[derive(Debug, Default)]
pub struct AuditQuery {
    pub entity: Option<String>,
    pub limit: i64,
}

/// Repository for audit log operations.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait AuditRepo: Send + Sync {
    /// Append an audit event (fire-and-forget, errors are logged but not propagated).
    async fn log(
        &self,
        actor_id: Option<Uuid>,
        entity: &str,
        entity_id: Uuid,
        action: AuditAction,
        diff: Option<serde_json::Value>,
    );

    /// Most recent events first.
    async fn query(&self, params: AuditQuery) -> Result<Vec<AuditEvent>>;
}

/// PostgreSQL implementation of AuditRepo.
#[derive(Clone)]
pub struct PgAuditRepo {
    pool: Pool<Postgres>,
}

impl PgAuditRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepo for PgAuditRepo {
    async fn log(
        &self,
        actor_id: Option<Uuid>,
        entity: &str,
        entity_id: Uuid,
        action: AuditAction,
        diff: Option<serde_json::Value>,
    ) {
        let result = sqlx::query(
            r#"
            INSERT INTO audit_events (id, actor_id, entity, entity_id, action, diff)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(Uuid::new_v4())
        .bind(actor_id)
        .bind(entity)
        .bind(entity_id)
        .bind(action.as_str())
        .bind(diff)
        .execute(&self.pool)
        .await;

        if let Err(e) = result {
            tracing::error!(
                actor_id = ?actor_id,
                entity = %entity,
                entity_id = %entity_id,
                action = action.as_str(),
                error = %e,
                "Failed to log audit event"
            );
        }
    }

    async fn query(&self, params: AuditQuery) -> Result<Vec<AuditEvent>> {
        let mut conditions = Vec::new();
        let mut param_idx = 1;

        if params.entity.is_some() {
            conditions.push(format!("entity = ${}", param_idx));
            param_idx += 1;
        }

        let where_clause = if conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", conditions.join(" AND "))
        };
        let query = format!(
            r#"
            SELECT id, actor_id, entity, entity_id, action, diff, created_at
            FROM audit_events
            {}
            ORDER BY created_at DESC, id DESC
            LIMIT ${}
            "#,
            where_clause, param_idx
        );

        let mut q = sqlx::query_as::<_, AuditEvent>(&query);
        if let Some(entity) = params.entity {
            q = q.bind(entity);
        }
        q = q.bind(params.limit);

        Ok(q.fetch_all(&self.pool).await?)
    }
}

/// Clamp a requested limit into `1..=MAX_AUDIT_LIMIT`.
pub fn clamp_limit(requested: Option<i64>) -> i64 {
    requested
        .unwrap_or(DEFAULT_AUDIT_LIMIT)
        .clamp(1, MAX_AUDIT_LIMIT)
}
