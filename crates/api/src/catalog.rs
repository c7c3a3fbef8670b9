//! Catalog query engine.
//!
//! Products and assets share one parameterized implementation: each kind
//! implements [`CatalogEntry`] (fields, sort keys, summary shape) and the
//! engine filters, orders and paginates through a [`CatalogRepo`](crate::repos::CatalogRepo).
//!
//! ## Query semantics
//!
//! - **status** - public listings only see `PUBLISHED`
//! - **category / tag** - exact membership in the decoded JSON array
//! - **search** - case-insensitive substring of title or description
//! - **order** - sort key, then `created_at DESC`, then `id ASC`
//! - **paging** - 12 per page; pages past the end are empty, not errors

mod entry;
mod filter;
pub mod json_text;
mod query;
mod sort;

pub use entry::CatalogEntry;
pub use filter::{CatalogFilters, Predicate};
pub use query::{list_filter_options, query_catalog};
pub use sort::{AssetSort, ProductSort, order_by_clause};
