//! Paginated catalog queries and filter-option discovery.

use std::collections::BTreeSet;

use anyhow::Result;
use shared::api::{CatalogPage, FilterOptions, PublishStatus};

use super::entry::CatalogEntry;
use super::filter::CatalogFilters;
use super::sort::SortKey;
use crate::repos::CatalogRepo;

/// Records per page, for both collections.
pub const PAGE_SIZE: u32 = 12;

/// Number of pages needed for `total` records, at least 1.
pub fn page_count(total: i64, page_size: u32) -> u32 {
    let size = i64::from(page_size.max(1));
    let pages = (total.max(0) + size - 1) / size;
    pages.clamp(1, i64::from(u32::MAX)) as u32
}

/// Run a catalog query against storage.
///
/// Filtering and ordering are pushed down to the repository. A page past the
/// end yields an empty item list, not an error.
pub async fn query_catalog<E, R>(
    repo: &R,
    filters: &CatalogFilters<E::Sort>,
) -> Result<CatalogPage<E::Summary>>
where
    E: CatalogEntry,
    R: CatalogRepo<E> + ?Sized,
{
    let predicate = filters.predicate();
    let total = repo.count(&predicate).await?;

    let skip = i64::from(filters.page.saturating_sub(1)) * i64::from(PAGE_SIZE);
    let items = if skip >= total {
        Vec::new()
    } else {
        repo.find_many(&predicate, filters.sort, skip, i64::from(PAGE_SIZE))
            .await?
            .iter()
            .map(CatalogEntry::summary)
            .collect()
    };

    tracing::debug!(
        collection = E::COLLECTION.entity(),
        total,
        page = filters.page,
        sort = filters.sort.as_str(),
        returned = items.len(),
        "catalog query"
    );

    Ok(CatalogPage {
        items,
        total,
        page: filters.page,
        page_size: PAGE_SIZE,
        page_count: page_count(total, PAGE_SIZE),
    })
}

/// Sorted, deduplicated categories and tags across every record with `status`.
pub async fn list_filter_options<E, R>(repo: &R, status: PublishStatus) -> Result<FilterOptions>
where
    E: CatalogEntry,
    R: CatalogRepo<E> + ?Sized,
{
    let mut categories = BTreeSet::new();
    let mut tags = BTreeSet::new();

    for labels in repo.taxonomy(status).await? {
        categories.extend(labels.categories);
        tags.extend(labels.tags);
    }

    Ok(FilterOptions {
        categories: categories.into_iter().collect(),
        tags: tags.into_iter().collect(),
    })
}
