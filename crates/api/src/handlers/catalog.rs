//! Public catalog endpoints.
//!
//! Only `PUBLISHED` records are visible here; a `status` query parameter is
//! ignored. Malformed `sort`/`page` values fall back to defaults.
//!
//! ## Endpoints
//!
//! - GET /catalog/products - Paginated product listing
//! - GET /catalog/products/filters - Available categories and tags
//! - GET /catalog/products/{slug} - Product detail
//! - GET /catalog/assets, /catalog/assets/filters, /catalog/assets/{slug} - Same for assets

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use shared::api::{CatalogQueryParams, PublishStatus};

use crate::{
    catalog::{CatalogFilters, list_filter_options, query_catalog},
    error::AppError,
    models::{Asset, Product},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/products/filters", get(product_filters))
        .route("/products/{slug}", get(get_product))
        .route("/assets", get(list_assets))
        .route("/assets/filters", get(asset_filters))
        .route("/assets/{slug}", get(get_asset))
}

#[debug_handler]
async fn list_products(
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let filters = CatalogFilters::from_params(&params);
    let page = query_catalog::<Product, _>(&*state.repos.products, &filters).await?;
    Ok(Json(page))
}

#[debug_handler]
async fn product_filters(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let options =
        list_filter_options::<Product, _>(&*state.repos.products, PublishStatus::Published)
            .await?;
    Ok(Json(options))
}

#[debug_handler]
async fn get_product(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .repos
        .products
        .find_by_slug(&slug)
        .await?
        .filter(|p| p.status == PublishStatus::Published)
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Product not found"))?;
    Ok(Json(product))
}

#[debug_handler]
async fn list_assets(
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let filters = CatalogFilters::from_params(&params);
    let page = query_catalog::<Asset, _>(&*state.repos.assets, &filters).await?;
    Ok(Json(page))
}

#[debug_handler]
async fn asset_filters(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let options =
        list_filter_options::<Asset, _>(&*state.repos.assets, PublishStatus::Published).await?;
    Ok(Json(options))
}

#[debug_handler]
async fn get_asset(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    let asset = state
        .repos
        .assets
        .find_by_slug(&slug)
        .await?
        .filter(|a| a.status == PublishStatus::Published)
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Asset not found"))?;
    Ok(Json(asset))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{TestStateBuilder, mock_asset, mock_product};
    use axum::response::Response;
    use http_body_util::BodyExt;
    use serde_json::Value;

    async fn json_body(response: Response) -> Value {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn list_products_only_returns_published() {
        let mut draft = mock_product("Secret Kit", &["combat"]);
        draft.status = PublishStatus::Draft;
        let state = TestStateBuilder::new()
            .with_products(vec![mock_product("Combat Kit", &["combat"]), draft])
            .build();

        let params = CatalogQueryParams {
            tag: Some("combat".into()),
            status: Some("DRAFT".into()),
            ..Default::default()
        };
        let response = list_products(State(state), Query(params))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["title"], "Combat Kit");
        assert_eq!(body["page_count"], 1);
    }

    #[tokio::test]
    async fn malformed_page_and_sort_fall_back() {
        let state = TestStateBuilder::new()
            .with_assets(vec![mock_asset("Door", 1)])
            .build();

        let params = CatalogQueryParams {
            page: Some("abc".into()),
            sort: Some("cheapest".into()),
            ..Default::default()
        };
        let response = list_assets(State(state), Query(params))
            .await
            .unwrap()
            .into_response();

        let body = json_body(response).await;
        assert_eq!(body["page"], 1);
        assert_eq!(body["items"].as_array().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn filters_endpoint_lists_published_labels() {
        let mut tree = mock_asset("Tree", 0);
        tree.categories = vec!["models".into()];
        tree.tags = vec!["nature".into()];
        let mut hidden = mock_asset("Hidden", 0);
        hidden.status = PublishStatus::Archived;
        hidden.tags = vec!["secret".into()];
        let state = TestStateBuilder::new()
            .with_assets(vec![tree, hidden])
            .build();

        let response = asset_filters(State(state)).await.unwrap().into_response();

        let body = json_body(response).await;
        assert_eq!(body["categories"], serde_json::json!(["models"]));
        assert_eq!(body["tags"], serde_json::json!(["nature"]));
    }

    #[tokio::test]
    async fn detail_hides_unpublished() {
        let mut draft = mock_product("Secret Kit", &[]);
        draft.status = PublishStatus::Draft;
        let slug = draft.slug.clone();
        let state = TestStateBuilder::new().with_products(vec![draft]).build();

        let result = get_product(State(state), Path(slug)).await;

        match result {
            Err(AppError::External(status, _)) => assert_eq!(status, StatusCode::NOT_FOUND),
            _ => panic!("expected 404"),
        }
    }

    #[tokio::test]
    async fn detail_returns_published_asset() {
        let asset = mock_asset("Door Script", 3);
        let state = TestStateBuilder::new()
            .with_assets(vec![asset.clone()])
            .build();

        let response = get_asset(State(state), Path(asset.slug.clone()))
            .await
            .unwrap()
            .into_response();

        let body = json_body(response).await;
        assert_eq!(body["id"], asset.id.to_string());
        assert_eq!(body["download_count"], 3);
    }
}
