//! Product repository for PostgreSQL.

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use shared::api::{ProductPayload, PublishStatus};
use sqlx::{Pool, Postgres};
use uuid::Uuid;

use super::catalog::{
    CatalogRepo, LabelSet, Revision, count_matching, fetch_labels, fetch_page, map_write_error,
};
use crate::catalog::{CatalogEntry, Predicate, ProductSort, json_text, order_by_clause};
use crate::models::{Product, ProductRow};

const TABLE: &str = Product::COLLECTION.table();
const COLUMNS: &str = "id, slug, title, description, categories, tags, status, price_cents, images, created_at, updated_at";

/// PostgreSQL implementation of CatalogRepo for products.
#[derive(Clone)]
pub struct PgProductRepo {
    pool: Pool<Postgres>,
}

impl PgProductRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CatalogRepo<Product> for PgProductRepo {
    async fn find_many(
        &self,
        predicate: &Predicate,
        sort: ProductSort,
        skip: i64,
        take: i64,
    ) -> Result<Vec<Product>> {
        let rows: Vec<ProductRow> = fetch_page(
            &self.pool,
            TABLE,
            COLUMNS,
            predicate,
            &order_by_clause(sort),
            skip,
            take,
        )
        .await?;
        Ok(rows.into_iter().map(Product::from).collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64> {
        count_matching(&self.pool, TABLE, predicate).await
    }

    async fn taxonomy(&self, status: PublishStatus) -> Result<Vec<LabelSet>> {
        fetch_labels(&self.pool, TABLE, status).await
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM {} WHERE id = $1",
            COLUMNS, TABLE
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM {} WHERE slug = $1",
            COLUMNS, TABLE
        ))
        .bind(slug)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }

    async fn create(&self, draft: &ProductPayload) -> Result<Product> {
        let product = Product::from_draft(Uuid::new_v4(), draft, Utc::now());

        sqlx::query(
            r#"
            INSERT INTO products (id, slug, title, description, categories, tags, status, price_cents, images, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            "#,
        )
        .bind(product.id)
        .bind(&product.slug)
        .bind(&product.title)
        .bind(&product.description)
        .bind(json_text::encode_list(&product.categories))
        .bind(json_text::encode_list(&product.tags))
        .bind(product.status.as_str())
        .bind(product.price_cents)
        .bind(json_text::encode_list(&product.images))
        .bind(product.created_at)
        .bind(product.updated_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_error)?;

        Ok(product)
    }

    async fn update(&self, id: Uuid, draft: &ProductPayload) -> Result<Option<Revision<Product>>> {
        let mut tx = self.pool.begin().await?;

        let before = sqlx::query_as::<_, ProductRow>(&format!(
            "SELECT {} FROM {} WHERE id = $1 FOR UPDATE",
            COLUMNS, TABLE
        ))
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?
        .map(Product::from);

        let Some(before) = before else {
            return Ok(None);
        };
        let after = before.revise(draft, Utc::now());

        sqlx::query(
            r#"
            UPDATE products
            SET slug = $2, title = $3, description = $4, categories = $5, tags = $6,
                status = $7, price_cents = $8, images = $9, updated_at = $10
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
        .bind(after.price_cents)
        .bind(json_text::encode_list(&after.images))
        .bind(after.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(map_write_error)?;

        tx.commit().await?;

        Ok(Some(Revision { before, after }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!(
            "DELETE FROM {} WHERE id = $1 RETURNING {}",
            TABLE, COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(Product::from))
    }
}
