//! Status repository for health checks.

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Pool, Postgres};

/// Published record counts reported by the health endpoint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CatalogCounts {
    pub products: i64,
    pub assets: i64,
}

/// Repository for database health checks.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait StatusRepo: Send + Sync {
    /// Health check - verify database connectivity.
    async fn health_check(&self) -> Result<bool>;

    /// Number of published products and assets.
    async fn published_counts(&self) -> Result<CatalogCounts>;
}

/// PostgreSQL implementation of StatusRepo.
#[derive(Clone)]
pub struct PgStatusRepo {
    pool: Pool<Postgres>,
}

impl PgStatusRepo {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl StatusRepo for PgStatusRepo {
    async fn health_check(&self) -> Result<bool> {
        let result: i32 = sqlx::query_scalar("SELECT 1").fetch_one(&self.pool).await?;
        Ok(result == 1)
    }

    async fn published_counts(&self) -> Result<CatalogCounts> {
        let (products, assets): (i64, i64) = sqlx::query_as(
            r#"
            SELECT
                (SELECT COUNT(*) FROM products WHERE status = 'PUBLISHED'),
                (SELECT COUNT(*) FROM assets WHERE status = 'PUBLISHED')
            "#,
        )
        .fetch_one(&self.pool)
        .await?;
        Ok(CatalogCounts { products, assets })
    }
}
