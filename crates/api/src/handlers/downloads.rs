//! Asset file downloads.
//!
//! ## Endpoints
//!
//! - GET /downloads/{asset_id}?file={name} - Download one of an asset's files
//!
//! Requests are throttled per client IP (`download:{ip}`). Locally stored files
//! are served directly; files hosted elsewhere are answered with a redirect.
//! Every served download increments the asset's `download_count`.

use axum::{
    Router, debug_handler,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Redirect, Response},
    routing::get,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    middleware::{
        client_ip::ClientIp,
        rate_limit::{scopes, throttle},
    },
    models::{AssetFile, PublishStatus},
    services::FileLocation,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/{asset_id}", get(download))
}

#[derive(Debug, Default, Deserialize)]
struct DownloadQuery {
    /// File name within the asset. Defaults to the first file.
    file: Option<String>,
}

fn select_file<'a>(files: &'a [AssetFile], name: Option<&str>) -> Option<&'a AssetFile> {
    match name {
        Some(name) => files.iter().find(|f| f.name == name),
        None => files.first(),
    }
}

fn attachment(file_name: &str) -> String {
    let safe: String = file_name
        .chars()
        .filter(|c| *c != '"' && *c != '\\' && !c.is_control())
        .collect();
    format!("attachment; filename=\"{}\"", safe)
}

#[debug_handler]
async fn download(
    ClientIp(ip): ClientIp,
    State(state): State<AppState>,
    Path(asset_id): Path<Uuid>,
    Query(query): Query<DownloadQuery>,
) -> Result<Response, AppError> {
    throttle(&state, scopes::DOWNLOAD, &ip, state.config.download_policy()).await?;

    let asset = state
        .repos
        .assets
        .find_by_id(asset_id)
        .await?
        .filter(|a| a.status == PublishStatus::Published)
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Asset not found"))?;

    let file = select_file(&asset.files, query.file.as_deref())
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "File not found"))?;

    let response = match FileLocation::classify(&file.url) {
        Some(FileLocation::Local(name)) => {
            let Some(bytes) = state.files.read(&name).await? else {
                tracing::warn!(asset_id = %asset.id, file = %name, "Asset file missing from storage");
                return Err(AppError::External(StatusCode::NOT_FOUND, "File not found"));
            };
            (
                [
                    (header::CONTENT_TYPE, "application/octet-stream".to_string()),
                    (header::CONTENT_DISPOSITION, attachment(&file.name)),
                ],
                bytes,
            )
                .into_response()
        }
        Some(FileLocation::External(url)) => Redirect::temporary(&url).into_response(),
        None => {
            tracing::warn!(asset_id = %asset.id, url = %file.url, "Asset file has unusable URL");
            return Err(AppError::External(StatusCode::NOT_FOUND, "File not found"));
        }
    };

    state.repos.assets.record_download(asset.id).await?;

    tracing::info!(asset_id = %asset.id, file = %file.name, "Asset downloaded");

    Ok(response)
}
