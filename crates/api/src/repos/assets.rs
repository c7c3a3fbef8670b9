//! Asset repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use shared::api::{AssetPayload, PublishStatus};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::catalog::{
    CatalogRepo, LabelSet, Revision, count_matching, fetch_labels, fetch_page, map_write_error,
};
use crate::catalog::{AssetSort, CatalogEntry, Predicate, json_text, order_by_clause};
use crate::models::{Asset, AssetRow};

const TABLE: &str = Asset::COLLECTION.table();
const COLUMNS: &str = "id, slug, title, description, categories, tags, status, version, license, download_count, files, created_at, updated_at";

/// Asset-specific operations on top of the catalog repository.
#[async_trait]
pub trait AssetRepo: CatalogRepo<Asset> {
    /// Increment the download counter. Does not touch `updated_at`.
    async fn record_download(&self, id: Uuid) -> Result<()>;
}

/// PostgreSQL implementation of AssetRepo.
#[derive(Clone)]
pub struct PgAssetRepo {
    pool: Pool<Postgres>,
}

impl PgAssetRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepo<Asset> for PgAssetRepo {
    async fn find_many(
        &self,
        predicate: &Predicate,
        sort: AssetSort,
        skip: i64,
        take: i64,
    ) -> Result<Vec<Asset>> {
        let rows: Vec<AssetRow> = fetch_page(
            &self.pool,
            TABLE,
            COLUMNS,
            predicate,
            &order_by_clause(sort),
            skip,
            take,
        )
        .await?;
        Ok(rows.into_iter().map(Asset::from).collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64> {
        count_matching(&self.pool, TABLE, predicate).await
    }

    async fn taxonomy(&self, status: PublishStatus) -> Result<Vec<LabelSet>> {
        fetch_labels(&self.pool, TABLE, status).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            COLUMNS, TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Asset::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM {} WHERE slug = $1",
            COLUMNS, TABLE
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Asset::from))
    }

    async fn create(&self, draft: &AssetPayload) -> Result<Asset> {
        let asset = Asset::from_draft(Uuid::new_v4(), draft, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO assets (id, slug, title, description, categories, tags, status, version, license, download_count, files, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
            "#,
        )
        .bind(asset.id)
        .bind(&asset.slug)
        .bind(&asset.title)
        .bind(&asset.description)
        .bind(json_text::encode_list(&asset.categories))
        .bind(json_text::encode_list(&asset.tags))
        .bind(asset.status.as_str())
        .bind(&asset.version)
        .bind(&asset.license)
        .bind(asset.download_count)
        .bind(json_text::encode(&asset.files))
        .bind(asset.created_at)
        .bind(asset.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(asset)
    }

    async fn update(&self, id: Uuid, draft: &AssetPayload) -> Result<Option<Revision<Asset>>> {
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, AssetRow>(&format!(
            "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
            COLUMNS, TABLE
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Asset::from);

        let Some(before) = before else {
            return Ok(None);
        };
        let after = before.revise(draft, Utc::now());

        // download_count is left alone so concurrent downloads aren't lost.
        sqlx::query(
            r#"
            UPDATE assets
            SET slug = $2, title = $3, description = $4, categories = $5, tags = $6,
                status = $7, version = $8, license = $9, files = $10, updated_at = $11
            WHERE id = $1
            "#,
        )
        .bind(after.id)
        .bind(&after.slug)
        .bind(&after.title)
        .bind(&after.description)
        .bind(json_text::encode_list(&after.categories))
        .bind(json_text::encode_list(&after.tags))
        .bind(after.status.as_str())
        .bind(&after.version)
        .bind(&after.license)
        .bind(json_text::encode(&after.files))
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;

        Ok(Some(Revision { before, after }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Asset>> {
        let row = sqlx::query_as::<_, AssetRow>(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING {}",
            TABLE, COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Asset::from))
    }
}

#[async_trait]
impl AssetRepo for PgAssetRepo {
    async fn record_download(&self, id: Uuid) -> Result<()> {
        sqlx::query("UPDATE assets SET download_count = download_count + 1 WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
