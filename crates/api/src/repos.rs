//! Database repositories (PostgreSQL).
//!
//! This module contains traits and implementations for database access.
//! Each repository is abstracted behind a trait to enable mocking in tests.
//!
//! ## Repositories
//!
//! - **products / assets** - Catalog collections, see [`CatalogRepo`]
//! - **users** - Accounts and credentials
//! - **audit** - Append-only log of admin mutations
//! - **status** - Health checks
//!
//! ## Usage in Handlers
//!
//! Repositories are accessed via `state.repos`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let user = state.repos.users.find_by_id(user_id).await?;
//!     let asset = state.repos.assets.find_by_slug(slug).await?;
//! }
//! ```

mod assets;
mod audit;
mod catalog;
#[cfg(test)]
mod memory;
mod products;
mod status;
mod users;

pub use assets::{AssetRepo, PgAssetRepo};
pub use audit::{AuditQuery, AuditRepo, PgAuditRepo, clamp_limit};
pub use catalog::{CatalogRepo, LabelSet, Revision, SlugTaken};
pub use products::PgProductRepo;
pub use status::{CatalogCounts, PgStatusRepo, StatusRepo};
pub use users::{PgUserRepo, UserRepo};

#[cfg(test)]
pub use audit::MockAuditRepo;
#[cfg(test)]
pub use memory::MemoryCatalogRepo;
#[cfg(test)]
pub use status::MockStatusRepo;
#[cfg(test)]
pub use users::MockUserRepo;

use std::sync::Arc;

use crate::models::Product;

/// Collection of all database repositories.
#[derive(Clone)]
pub struct Repos {
    pub users: Arc<dyn UserRepo>,
    pub products: Arc<dyn CatalogRepo<Product>>,
    pub assets: Arc<dyn AssetRepo>,
    pub audit: Arc<dyn AuditRepo>,
    pub status: Arc<dyn StatusRepo>,
}
