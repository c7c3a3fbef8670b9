//! Admin catalog management.
//!
//! Every route requires an `ADMIN` bearer token. Mutations append an audit
//! event with a field-level diff; audit failures are logged and never fail the
//! request.
//!
//! ## Endpoints
//!
//! - GET /admin/products - Listing with `?status=` (default PUBLISHED) plus the public filters
//! - POST /admin/products - Create
//! - GET/PUT/DELETE /admin/products/{id} - Read, replace, delete
//! - Same for /admin/assets

use axum::{
    Json, Router, debug_handler,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use garde::Validate;
use serde_json::{Map, Value};
use shared::api::{AssetPayload, CatalogQueryParams, ProductPayload};
use uuid::Uuid;

use crate::{
    catalog::{CatalogEntry, CatalogFilters, query_catalog},
    error::AppError,
    middleware::auth::AdminUser,
    models::{Asset, AuditAction, Product},
    repos::{CatalogRepo, SlugTaken},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(update_product).delete(delete_product),
        )
        .route("/assets", get(list_assets).post(create_asset))
        .route(
            "/assets/{id}",
            get(get_asset).put(update_asset).delete(delete_asset),
        )
}

/// Fields excluded from audit diffs.
const UNAUDITED_FIELDS: &[&str] = &["updated_at"];

/// Changed top-level fields as `{ field: { "from": old, "to": new } }`.
fn field_diff(before: &Value, after: &Value) -> Value {
    let (Value::Object(before), Value::Object(after)) = (before, after) else {
        return serde_json::json!({ "from": before, "to": after });
    };

    let mut changes = Map::new();
    for (field, new) in after {
        if UNAUDITED_FIELDS.contains(&field.as_str()) {
            continue;
        }
        let old = before.get(field).unwrap_or(&Value::Null);
        if old != new {
            changes.insert(
                field.clone(),
                serde_json::json!({ "from": old, "to": new }),
            );
        }
    }
    Value::Object(changes)
}

fn write_error(err: anyhow::Error) -> AppError {
    if err.downcast_ref::<SlugTaken>().is_some() {
        AppError::External(StatusCode::CONFLICT, "Slug is already in use")
    } else {
        AppError::Internal(err)
    }
}

async fn create_entry<E, R>(
    state: &AppState,
    repo: &R,
    actor: Uuid,
    draft: &E::Draft,
) -> Result<E, AppError>
where
    E: CatalogEntry,
    R: CatalogRepo<E> + ?Sized,
{
    let record = repo.create(draft).await.map_err(write_error)?;

    tracing::info!(
        entity = E::COLLECTION.entity(),
        id = %record.id(),
        actor_id = %actor,
        "Catalog record created"
    );
    state
        .repos
        .audit
        .log(
            Some(actor),
            E::COLLECTION.entity(),
            record.id(),
            AuditAction::Create,
            serde_json::to_value(&record).ok(),
        )
        .await;

    Ok(record)
}

async fn update_entry<E, R>(
    state: &AppState,
    repo: &R,
    actor: Uuid,
    id: Uuid,
    draft: &E::Draft,
) -> Result<Option<E>, AppError>
where
    E: CatalogEntry,
    R: CatalogRepo<E> + ?Sized,
{
    let Some(revision) = repo.update(id, draft).await.map_err(write_error)? else {
        return Ok(None);
    };

    let diff = match (
        serde_json::to_value(&revision.before),
        serde_json::to_value(&revision.after),
    ) {
        (Ok(before), Ok(after)) => Some(field_diff(&before, &after)),
        _ => None,
    };

    tracing::info!(
        entity = E::COLLECTION.entity(),
        id = %id,
        actor_id = %actor,
        "Catalog record updated"
    );
    state
        .repos
        .audit
        .log(
            Some(actor),
            E::COLLECTION.entity(),
            id,
            AuditAction::Update,
            diff,
        )
        .await;

    Ok(Some(revision.after))
}

async fn delete_entry<E, R>(
    state: &AppState,
    repo: &R,
    actor: Uuid,
    id: Uuid,
) -> Result<bool, AppError>
where
    E: CatalogEntry,
    R: CatalogRepo<E> + ?Sized,
{
    let Some(deleted) = repo.delete(id).await? else {
        return Ok(false);
    };

    tracing::info!(
        entity = E::COLLECTION.entity(),
        id = %id,
        actor_id = %actor,
        "Catalog record deleted"
    );
    state
        .repos
        .audit
        .log(
            Some(actor),
            E::COLLECTION.entity(),
            id,
            AuditAction::Delete,
            serde_json::to_value(&deleted).ok(),
        )
        .await;

    Ok(true)
}

// ============================================================================
// Products
// ============================================================================

#[debug_handler]
async fn list_products(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let filters = CatalogFilters::from_admin_params(&params);
    let page = query_catalog::<Product, _>(&*state.repos.products, &filters).await?;
    Ok(Json(page))
}

#[debug_handler]
async fn get_product(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let product = state
        .repos
        .products
        .find_by_id(id)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Product not found"))?;
    Ok(Json(product))
}

#[debug_handler]
async fn create_product(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product =
        create_entry::<Product, _>(&state, &*state.repos.products, admin.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(product)))
}

#[debug_handler]
async fn update_product(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ProductPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let product =
        update_entry::<Product, _>(&state, &*state.repos.products, admin.id, id, &payload)
            .await?
            .ok_or(AppError::External(StatusCode::NOT_FOUND, "Product not found"))?;
    Ok(Json(product))
}

#[debug_handler]
async fn delete_product(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if delete_entry::<Product, _>(&state, &*state.repos.products, admin.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::External(StatusCode::NOT_FOUND, "Product not found"))
    }
}

// ============================================================================
// Assets
// ============================================================================

#[debug_handler]
async fn list_assets(
    _admin: AdminUser,
    State(state): State<AppState>,
    Query(params): Query<CatalogQueryParams>,
) -> Result<impl IntoResponse, AppError> {
    let filters = CatalogFilters::from_admin_params(&params);
    let page = query_catalog::<Asset, _>(&*state.repos.assets, &filters).await?;
    Ok(Json(page))
}

#[debug_handler]
async fn get_asset(
    _admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let asset = state
        .repos
        .assets
        .find_by_id(id)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Asset not found"))?;
    Ok(Json(asset))
}

#[debug_handler]
async fn create_asset(
    admin: AdminUser,
    State(state): State<AppState>,
    Json(payload): Json<AssetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let asset = create_entry::<Asset, _>(&state, &*state.repos.assets, admin.id, &payload).await?;
    Ok((StatusCode::CREATED, Json(asset)))
}

#[debug_handler]
async fn update_asset(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<AssetPayload>,
) -> Result<impl IntoResponse, AppError> {
    payload
        .validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    let asset = update_entry::<Asset, _>(&state, &*state.repos.assets, admin.id, id, &payload)
        .await?
        .ok_or(AppError::External(StatusCode::NOT_FOUND, "Asset not found"))?;
    Ok(Json(asset))
}

#[debug_handler]
async fn delete_asset(
    admin: AdminUser,
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    if delete_entry::<Asset, _>(&state, &*state.repos.assets, admin.id, id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::External(StatusCode::NOT_FOUND, "Asset not found"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repos::MockAuditRepo;
    use crate::test_utils::{TestStateBuilder, asset_payload, mock_asset, mock_product, product_payload};
    use mockall::predicate::{always, eq};
    use serde_json::json;
    use shared::api::PublishStatus;

    fn admin() -> AdminUser {
        AdminUser { id: Uuid::nil() }
    }

    #[test]
    fn diff_lists_only_changed_fields() {
        let before = json!({ "title": "A", "price_cents": 100, "updated_at": "t1", "tags": ["x"] });
        let after = json!({ "title": "B", "price_cents": 100, "updated_at": "t2", "tags": ["x"] });

        assert_eq!(
            field_diff(&before, &after),
            json!({ "title": { "from": "A", "to": "B" } })
        );
    }

    #[tokio::test]
    async fn create_product_audits_and_returns_201() {
        let mut audit = MockAuditRepo::new();
        audit
            .expect_log()
            .with(
                eq(Some(Uuid::nil())),
                eq("product"),
                always(),
                eq(AuditAction::Create),
                always(),
            )
            .times(1)
            .returning(|_, _, _, _, _| ());
        let state = TestStateBuilder::new().with_audit_repo(audit).build();

        let response = create_product(admin(), State(state.clone()), Json(product_payload("combat-kit")))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::CREATED);
        assert!(
            state
                .repos
                .products
                .find_by_slug("combat-kit")
                .await
                .unwrap()
                .is_some()
        );
    }

    #[tokio::test]
    async fn duplicate_slug_is_409() {
        let mut existing = mock_product("Combat Kit", &[]);
        existing.slug = "combat-kit".into();
        let state = TestStateBuilder::new().with_products(vec![existing]).build();

        let result = create_product(admin(), State(state), Json(product_payload("combat-kit"))).await;

        assert!(matches!(
            result,
            Err(AppError::External(StatusCode::CONFLICT, _))
        ));
    }

    #[tokio::test]
    async fn invalid_payload_is_400() {
        let state = TestStateBuilder::new().build();

        let result = create_asset(admin(), State(state), Json(asset_payload("Not A Slug"))).await;

        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn update_asset_keeps_download_count_and_audits_diff() {
        let asset = mock_asset("Door Script", 12);
        let id = asset.id;
        let mut audit = MockAuditRepo::new();
        audit
            .expect_log()
            .withf(move |actor, entity, entity_id, action, diff| {
                *actor == Some(Uuid::nil())
                    && entity == "asset"
                    && *entity_id == id
                    && *action == AuditAction::Update
                    && diff
                        .as_ref()
                        .is_some_and(|d| d.get("slug").is_some() && d.get("download_count").is_none())
            })
            .times(1)
            .returning(|_, _, _, _, _| ());
        let state = TestStateBuilder::new()
            .with_assets(vec![asset])
            .with_audit_repo(audit)
            .build();

        update_asset(admin(), State(state.clone()), Path(id), Json(asset_payload("door-v2")))
            .await
            .unwrap();

        let stored = state.repos.assets.find_by_id(id).await.unwrap().unwrap();
        assert_eq!(stored.slug, "door-v2");
        assert_eq!(stored.download_count, 12);
    }

    #[tokio::test]
    async fn update_missing_is_404() {
        let state = TestStateBuilder::new().build();

        let result = update_product(
            admin(),
            State(state),
            Path(Uuid::new_v4()),
            Json(product_payload("combat-kit")),
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::External(StatusCode::NOT_FOUND, _))
        ));
    }

    #[tokio::test]
    async fn delete_removes_record() {
        let product = mock_product("Combat Kit", &[]);
        let id = product.id;
        let state = TestStateBuilder::new().with_products(vec![product]).build();

        let response = delete_product(admin(), State(state.clone()), Path(id))
            .await
            .unwrap()
            .into_response();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        assert!(state.repos.products.find_by_id(id).await.unwrap().is_none());

        let again = delete_product(admin(), State(state), Path(id)).await;
        assert!(matches!(
            again,
            Err(AppError::External(StatusCode::NOT_FOUND, _))
        ));
    }

    #[tokio::test]
    async fn admin_listing_honors_status() {
        let mut draft = mock_product("Draft Kit", &[]);
        draft.status = PublishStatus::Draft;
        let state = TestStateBuilder::new()
            .with_products(vec![draft, mock_product("Live Kit", &[])])
            .build();

        let params = CatalogQueryParams {
            status: Some("draft".into()),
            ..Default::default()
        };
        let response = list_products(admin(), State(state), Query(params))
            .await
            .unwrap()
            .into_response();

        let bytes = http_body_util::BodyExt::collect(response.into_body())
            .await
            .unwrap()
            .to_bytes();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["total"], 1);
        assert_eq!(body["items"][0]["title"], "Draft Kit");
    }
}
