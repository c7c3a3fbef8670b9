//! Catalog filters and their normalization from raw query parameters.
//!
//! Malformed input is never an error: unknown sort keys become the collection
//! default, missing or invalid pages become 1, blank strings are ignored.

use shared::api::{CatalogQueryParams, PublishStatus};

use super::sort::SortKey;

/// Storage-facing filter: which records match, independent of order and paging.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Predicate {
    pub status: PublishStatus,
    /// Lowercased search term, matched as a substring of title or description.
    pub search: Option<String>,
    /// Exact, case-sensitive category membership.
    pub category: Option<String>,
    /// Exact, case-sensitive tag membership.
    pub tag: Option<String>,
}

impl Predicate {
    pub fn status(status: PublishStatus) -> Self {
        Self {
            status,
            search: None,
            category: None,
            tag: None,
        }
    }

    /// Evaluate the predicate against a loaded record.
    #[cfg(test)]
    pub fn matches<E: super::CatalogEntry>(&self, record: &E) -> bool {
        if record.status() != self.status {
            return false;
        }
        if let Some(category) = &self.category
            && !record.categories().iter().any(|c| c == category)
        {
            return false;
        }
        if let Some(tag) = &self.tag
            && !record.tags().iter().any(|t| t == tag)
        {
            return false;
        }
        if let Some(search) = &self.search {
            return record.title().to_lowercase().contains(search.as_str())
                || record.description().to_lowercase().contains(search.as_str());
        }
        true
    }
}

/// Normalized catalog query.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogFilters<S> {
    pub search: Option<String>,
    pub category: Option<String>,
    pub tag: Option<String>,
    pub sort: S,
    /// 1-based.
    pub page: u32,
    pub status: PublishStatus,
}

impl<S: SortKey> Default for CatalogFilters<S> {
    fn default() -> Self {
        Self {
            search: None,
            category: None,
            tag: None,
            sort: S::default(),
            page: 1,
            status: PublishStatus::Published,
        }
    }
}

impl<S: SortKey> CatalogFilters<S> {
    /// Normalize public query parameters. The status parameter is ignored:
    /// public listings only ever see published records.
    pub fn from_params(params: &CatalogQueryParams) -> Self {
        Self {
            search: search_term(params.q.as_deref()),
            category: non_blank(params.category.as_deref()),
            tag: non_blank(params.tag.as_deref()),
            sort: params
                .sort
                .as_deref()
                .and_then(S::parse)
                .unwrap_or_default(),
            page: parse_page(params.page.as_deref()),
            status: PublishStatus::Published,
        }
    }

    /// Normalize admin query parameters, honoring `status` (default published).
    pub fn from_admin_params(params: &CatalogQueryParams) -> Self {
        Self {
            status: params
                .status
                .as_deref()
                .and_then(PublishStatus::parse)
                .unwrap_or(PublishStatus::Published),
            ..Self::from_params(params)
        }
    }

    pub fn predicate(&self) -> Predicate {
        Predicate {
            status: self.status,
            search: self.search.as_ref().map(|s| s.to_lowercase()),
            category: self.category.clone(),
            tag: self.tag.clone(),
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

/// The search term as given, or None if it is blank. Surrounding spaces are
/// part of the substring match.
fn search_term(raw: Option<&str>) -> Option<String> {
    raw.filter(|s| !s.trim().is_empty()).map(str::to_string)
}

fn parse_page(raw: Option<&str>) -> u32 {
    raw.and_then(|r| r.trim().parse::<u32>().ok())
        .filter(|page| *page >= 1)
        .unwrap_or(1)
}
