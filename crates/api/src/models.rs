use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

pub use shared::api::{AssetFileInfo as AssetFile, PublishStatus, Role};

use crate::catalog::json_text;

/// Stored status values that don't parse are hidden rather than published.
fn decode_status(raw: &str, id: Uuid) -> PublishStatus {
    PublishStatus::parse(raw).unwrap_or_else(|| {
        tracing::warn!(record_id = %id, status = %raw, "unknown publish status, treating as draft");
        PublishStatus::Draft
    })
}

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, FromRow)]
pub struct UserRow {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub role: String,
    pub created_at: DateTime<Utc>,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            role: Role::parse(&row.role).unwrap_or(Role::Customer),
            created_at: row.created_at,
        }
    }
}

/// Paid catalog item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    /// Markdown/MDX source, rendered by the frontend.
    pub description: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: PublishStatus,
    pub price_cents: i64,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `products` row as stored. Array columns hold JSON text.
#[derive(Debug, FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub status: String,
    pub price_cents: i64,
    pub images: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            status: decode_status(&row.status, row.id),
            categories: json_text::decode_list(row.categories.as_deref()),
            tags: json_text::decode_list(row.tags.as_deref()),
            images: json_text::decode_list(row.images.as_deref()),
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            price_cents: row.price_cents,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Free downloadable Roblox Studio asset.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Asset {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub status: PublishStatus,
    pub version: String,
    pub license: String,
    pub download_count: i64,
    pub files: Vec<AssetFile>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// `assets` row as stored. Array columns hold JSON text.
#[derive(Debug, FromRow)]
pub struct AssetRow {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub description: String,
    pub categories: Option<String>,
    pub tags: Option<String>,
    pub status: String,
    pub version: String,
    pub license: String,
    pub download_count: i64,
    pub files: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<AssetRow> for Asset {
    fn from(row: AssetRow) -> Self {
        Self {
            status: decode_status(&row.status, row.id),
            categories: json_text::decode_list(row.categories.as_deref()),
            tags: json_text::decode_list(row.tags.as_deref()),
            files: json_text::decode(row.files.as_deref()),
            id: row.id,
            slug: row.slug,
            title: row.title,
            description: row.description,
            version: row.version,
            license: row.license,
            download_count: row.download_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Mutation recorded in the audit log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuditAction {
    Create,
    Update,
    Delete,
}

impl AuditAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "CREATE",
            AuditAction::Update => "UPDATE",
            AuditAction::Delete => "DELETE",
        }
    }
}

/// Append-only audit log row.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct AuditEvent {
    pub id: Uuid,
    pub actor_id: Option<Uuid>,
    pub entity: String,
    pub entity_id: Uuid,
    pub action: String,
    pub diff: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}
