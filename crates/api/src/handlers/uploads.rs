//! Admin file uploads.
//!
//! ## Endpoints
//!
//! - POST /admin/uploads - Multipart upload of a single `file` field
//!
//! The stored name is a fresh UUID plus the original extension, so uploads never
//! collide or overwrite each other. The response is the file descriptor to
//! attach to an asset, including the SHA-256 of the contents.

use axum::{
    Json, Router, debug_handler,
    extract::{Multipart, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};
use sha2::{Digest, Sha256};
use uuid::Uuid;

use crate::{error::AppError, middleware::auth::AdminUser, models::AssetFile, state::AppState};

const FILE_FIELD: &str = "file";
const MAX_EXTENSION_LEN: usize = 16;
const MAX_NAME_LEN: usize = 255;

pub fn router() -> Router<AppState> {
    Router::new().route("/", post(upload))
}

/// Lowercased extension of `name`, if it is short and alphanumeric.
fn extension_of(name: &str) -> Option<String> {
    let (stem, ext) = name.rsplit_once('.')?;
    if stem.is_empty()
        || ext.is_empty()
        || ext.len() > MAX_EXTENSION_LEN
        || !ext.chars().all(|c| c.is_ascii_alphanumeric())
    {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}

/// Original file name without any client-supplied directories.
fn display_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or(raw);
    base.chars()
        .filter(|c| !c.is_control())
        .take(MAX_NAME_LEN)
        .collect()
}

#[debug_handler]
async fn upload(
    admin: AdminUser,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(e.body_text()))?
    {
        if field.name() != Some(FILE_FIELD) {
            continue;
        }

        let name = field
            .file_name()
            .map(display_name)
            .filter(|n| !n.is_empty())
            .ok_or_else(|| AppError::Validation("file name is required".to_string()))?;

        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(e.body_text()))?;

        if bytes.is_empty() {
            return Err(AppError::Validation("file is empty".to_string()));
        }
        if bytes.len() > state.config.max_upload_bytes {
            return Err(AppError::External(
                StatusCode::PAYLOAD_TOO_LARGE,
                "File exceeds upload limit",
            ));
        }

        let content_hash = hex::encode(Sha256::digest(&bytes));
        let extension = extension_of(&name).unwrap_or_default();
        let stored_name = if extension.is_empty() {
            Uuid::new_v4().to_string()
        } else {
            format!("{}.{}", Uuid::new_v4(), extension)
        };
        let size = bytes.len() as i64;

        let url = state.files.save(&stored_name, bytes.to_vec()).await?;

        tracing::info!(
            actor_id = %admin.id,
            url = %url,
            size,
            content_hash = %content_hash,
            "File uploaded"
        );

        return Ok((
            StatusCode::CREATED,
            Json(AssetFile {
                name,
                url,
                size,
                extension,
                content_hash,
            }),
        ));
    }

    Err(AppError::Validation(format!(
        "multipart field '{}' is required",
        FILE_FIELD
    )))
}
