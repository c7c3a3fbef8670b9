//! Catalog repository trait and the SQL shared by both collections.
//!
//! Category and tag columns hold JSON text. Membership filters go through the
//! `json_text_array(text)` database function (see migrations), which decodes the
//! column as JSONB and yields `[]` for malformed values or arrays holding
//! anything but strings, matching [`json_text::decode_list`]. `tag = "ui"` never
//! matches a record tagged `"uikit"`.

use std::fmt;

use anyhow::Result;
use async_trait::async_trait;
use shared::api::PublishStatus;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, Pool, Postgres};
use uuid::Uuid;

use crate::catalog::{CatalogEntry, Predicate, json_text};

/// Categories and tags of one record, used for filter-option discovery.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSet {
    pub categories: Vec<String>,
    pub tags: Vec<String>,
}

/// A record before and after an update.
#[derive(Debug, Clone)]
pub struct Revision<E> {
    pub before: E,
    pub after: E,
}

/// Another record already uses the requested slug.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlugTaken;

impl fmt::Display for SlugTaken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("slug is already in use")
    }
}

impl std::error::Error for SlugTaken {}

/// Repository for one catalog collection.
#[async_trait]
pub trait CatalogRepo<E: CatalogEntry>: Send + Sync {
    /// Records matching `predicate`, ordered by `sort` then the tiebreak.
    async fn find_many(
        &self,
        predicate: &Predicate,
        sort: E::Sort,
        skip: i64,
        take: i64,
    ) -> Result<Vec<E>>;

    /// Number of records matching `predicate`.
    async fn count(&self, predicate: &Predicate) -> Result<i64>;

    /// Labels of every record with `status`.
    async fn taxonomy(&self, status: PublishStatus) -> Result<Vec<LabelSet>>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>>;

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>>;

    /// Insert a new record. Fails with [`SlugTaken`] on a duplicate slug.
    async fn create(&self, draft: &E::Draft) -> Result<E>;

    /// Replace a record's editable fields. Returns None if it doesn't exist.
    async fn update(&self, id: Uuid, draft: &E::Draft) -> Result<Option<Revision<E>>>;

    /// Delete a record, returning it if it existed.
    async fn delete(&self, id: Uuid) -> Result<Option<E>>;
}

/// WHERE clause with its positional string binds ($1..$n).
#[derive(Debug, PartialEq, Eq)]
pub(crate) struct SqlFilter {
    pub clause: String,
    pub binds: Vec<String>,
}

/// Escape LIKE metacharacters and wrap in wildcards.
pub(crate) fn like_pattern(term: &str) -> String {
    let mut pattern = String::with_capacity(term.len() + 2);
    pattern.push('%');
    for c in term.chars() {
        if matches!(c, '\\' | '%' | '_') {
            pattern.push('\\');
        }
        pattern.push(c);
    }
    pattern.push('%');
    pattern
}

pub(crate) fn where_clause(predicate: &Predicate) -> SqlFilter {
    let mut conditions = vec!["status = $1".to_string()];
    let mut binds = vec![predicate.status.as_str().to_string()];

    if let Some(category) = &predicate.category {
        binds.push(category.clone());
        conditions.push(format!("json_text_array(categories) ? ${}", binds.len()));
    }

    if let Some(tag) = &predicate.tag {
        binds.push(tag.clone());
        conditions.push(format!("json_text_array(tags) ? ${}", binds.len()));
    }

    if let Some(search) = &predicate.search {
        binds.push(like_pattern(&search.to_lowercase()));
        let idx = binds.len();
        conditions.push(format!(
            r"(LOWER(title) LIKE ${idx} ESCAPE '\' OR LOWER(description) LIKE ${idx} ESCAPE '\')"
        ));
    }

    SqlFilter {
        clause: conditions.join(" AND "),
        binds,
    }
}

pub(crate) async fn fetch_page<R>(
    pool: &Pool<Postgres>,
    table: &str,
    columns: &str,
    predicate: &Predicate,
    order_by: &str,
    skip: i64,
    take: i64,
) -> Result<Vec<R>>
where
    R: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let filter = where_clause(predicate);
    let next = filter.binds.len() + 1;
    let query = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {} OFFSET ${} LIMIT ${}",
        columns,
        table,
        filter.clause,
        order_by,
        next,
        next + 1
    );

    let mut q = sqlx::query_as::<_, R>(&query);
    for value in filter.binds {
        q = q.bind(value);
    }
    q = q.bind(skip).bind(take);

    Ok(q.fetch_all(pool).await?)
}

pub(crate) async fn count_matching(
    pool: &Pool<Postgres>,
    table: &str,
    predicate: &Predicate,
) -> Result<i64> {
    let filter = where_clause(predicate);
    let query = format!("SELECT COUNT(*) FROM {} WHERE {}", table, filter.clause);

    let mut q = sqlx::query_scalar::<_, i64>(&query);
    for value in filter.binds {
        q = q.bind(value);
    }

    Ok(q.fetch_one(pool).await?)
}

pub(crate) async fn fetch_labels(
    pool: &Pool<Postgres>,
    table: &str,
    status: PublishStatus,
) -> Result<Vec<LabelSet>> {
    let query = format!("SELECT categories, tags FROM {} WHERE status = $1", table);

    let rows = sqlx::query_as::<_, (Option<String>, Option<String>)>(&query)
        .bind(status.as_str())
        .fetch_all(pool)
        .await?;

    Ok(rows
        .into_iter()
        .map(|(categories, tags)| LabelSet {
            categories: json_text::decode_list(categories.as_deref()),
            tags: json_text::decode_list(tags.as_deref()),
        })
        .collect())
}

/// Turn a unique violation on insert/update into [`SlugTaken`].
pub(crate) fn map_write_error(err: sqlx::Error) -> anyhow::Error {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => SlugTaken.into(),
        _ => err.into(),
    }
}
