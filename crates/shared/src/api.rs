//! Shared API request/response types used by the storefront server and its clients.

use chrono::{DateTime, Utc};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Max categories or tags on a single record.
const MAX_LABELS: usize = 32;
/// Max files attached to a single asset.
const MAX_ASSET_FILES: usize = 20;
/// Max images attached to a single product.
const MAX_PRODUCT_IMAGES: usize = 20;

// ============================================================================
// Enums
// ============================================================================

/// Visibility state of a catalog record. Only `Published` records are public.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishStatus {
    Draft,
    Published,
    Archived,
}

impl PublishStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PublishStatus::Draft => "DRAFT",
            PublishStatus::Published => "PUBLISHED",
            PublishStatus::Archived => "ARCHIVED",
        }
    }

    /// Parses a status name, ignoring ASCII case.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_uppercase().as_str() {
            "DRAFT" => Some(PublishStatus::Draft),
            "PUBLISHED" => Some(PublishStatus::Published),
            "ARCHIVED" => Some(PublishStatus::Archived),
            _ => None,
        }
    }
}

fn default_status() -> PublishStatus {
    PublishStatus::Draft
}

/// Account role. Admin endpoints require `Admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Customer,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Customer => "CUSTOMER",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "ADMIN" => Some(Role::Admin),
            "CUSTOMER" => Some(Role::Customer),
            _ => None,
        }
    }
}

// ============================================================================
// Catalog query types
// ============================================================================

/// Raw catalog query string parameters.
///
/// Everything is kept as an optional string so malformed values (e.g. `page=abc`)
/// can be normalized by the server instead of rejected.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CatalogQueryParams {
    /// Free-text search over title and description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub q: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
    /// Sort key, e.g. `newest`, `price-asc`, `popular`, `name`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort: Option<String>,
    /// 1-based page number.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<String>,
    /// Publish status. Only honored on admin listings.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

/// One page of catalog results.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogPage<T> {
    pub items: Vec<T>,
    /// Number of records matching the filters across all pages.
    pub total: i64,
    pub page: u32,
    pub page_size: u32,
    /// Always at least 1, even for an empty result.
    pub page_count: u32,
}

/// Distinct categories and tags available for narrowing a catalog query.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterOptions {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// Product as listed in a catalog page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub price_cents: i64,
    /// First product image, used as the listing thumbnail.
    pub thumbnail: Option<String>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// Asset as listed in a catalog page.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssetSummary {
    pub id: Uuid,
    pub slug: String,
    pub title: String,
    pub version: String,
    pub license: String,
    pub download_count: i64,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub created_at: DateTime<Utc>,
}

// ============================================================================
// Admin payloads
// ============================================================================

/// Create or replace a product.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProductPayload {
    #[garde(length(min = 1, max = 120), pattern(r"^[a-z0-9]+(-[a-z0-9]+)*$"))]
    pub slug: String,
    #[garde(length(min = 1, max = 200))]
    pub title: String,
    /// Long-form Markdown/MDX description, stored verbatim.
    #[garde(length(max = 100_000))]
    pub description: String,
    #[garde(length(max = MAX_LABELS), inner(length(min = 1, max = 64)))]
    #[serde(default)]
    pub categories: Vec<String>,
    #[garde(length(max = MAX_LABELS), inner(length(min = 1, max = 64)))]
    #[serde(default)]
    pub tags: Vec<String>,
    #[garde(skip)]
    #[serde(default = "default_status")]
    pub status: PublishStatus,
    #[garde(range(min = 0))]
    pub price_cents: i64,
    #[garde(length(max = MAX_PRODUCT_IMAGES), inner(length(min = 1, max = 2048)))]
    #[serde(default)]
    pub images: Vec<String>,
}

/// Create or replace a free asset.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssetPayload {
    #[garde(length(min = 1, max = 120), pattern(r"^[a-z0-9]+(-[a-z0-9]+)*$"))]
    pub slug: String,
    #[garde(length(min = 1, max = 200))]
    pub title: String,
    #[garde(length(max = 100_000))]
    pub description: String,
    #[garde(length(max = MAX_LABELS), inner(length(min = 1, max = 64)))]
    #[serde(default)]
    pub categories: Vec<String>,
    #[garde(length(max = MAX_LABELS), inner(length(min = 1, max = 64)))]
    #[serde(default)]
    pub tags: Vec<String>,
    #[garde(skip)]
    #[serde(default = "default_status")]
    pub status: PublishStatus,
    #[garde(length(min = 1, max = 32))]
    pub version: String,
    #[garde(length(min = 1, max = 64))]
    pub license: String,
    #[garde(length(max = MAX_ASSET_FILES), dive)]
    #[serde(default)]
    pub files: Vec<AssetFileInfo>,
}

/// A downloadable file attached to an asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Validate)]
pub struct AssetFileInfo {
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    /// Either a local upload path (`/uploads/...`) or an absolute URL.
    #[garde(length(min = 1, max = 2048))]
    pub url: String,
    #[garde(range(min = 0))]
    pub size: i64,
    #[garde(length(max = 16))]
    pub extension: String,
    /// Lowercase hex SHA-256 of the file contents.
    #[garde(length(max = 64))]
    pub content_hash: String,
}

// ============================================================================
// Auth types
// ============================================================================

/// Credentials submitted to POST /auth/login.
#[derive(Debug, Serialize, Deserialize, Validate)]
pub struct LoginPayload {
    #[garde(email)]
    pub email: String,
    #[garde(length(min = 1, max = 256))]
    pub password: String,
}

/// Returned after a successful login.
#[derive(Debug, Serialize, Deserialize)]
pub struct LoginResponse {
    /// Bearer token for the Authorization header.
    pub token: String,
    pub role: Role,
    pub expires_at: DateTime<Utc>,
}

/// Response from GET /auth/me.
#[derive(Debug, Serialize, Deserialize)]
pub struct MeResponse {
    pub id: Uuid,
    pub email: String,
    pub role: Role,
}

// ============================================================================
// Audit log types
// ============================================================================

/// A single audit log entry.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: Uuid,
    /// Admin who performed the action (None for system actions).
    pub actor_id: Option<Uuid>,
    /// Entity kind: "product" or "asset".
    pub entity: String,
    pub entity_id: Uuid,
    /// CREATE, UPDATE or DELETE.
    pub action: String,
    /// Snapshot of the change, if recorded.
    pub diff: Option<serde_json::Value>,
    pub created_at: DateTime<Utc>,
}

/// Query parameters for the audit log endpoint.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AuditLogQuery {
    /// Filter by entity kind.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub entity: Option<String>,
    /// Max entries to return (default 50, capped at 500).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i64>,
}

/// Response from the audit log endpoint.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuditLogResponse {
    pub entries: Vec<AuditEntry>,
}
