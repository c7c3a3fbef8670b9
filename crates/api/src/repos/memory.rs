//! In-memory catalog repository for tests.
//!
//! Evaluates predicates and ordering in Rust with the same semantics the SQL
//! path pushes down to Postgres.

use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use chrono::Utc;
use shared::api::PublishStatus;
use uuid::Uuid;

use super::assets::AssetRepo;
use super::catalog::{CatalogRepo, LabelSet, Revision, SlugTaken};
use crate::catalog::{CatalogEntry, Predicate};
use crate::models::Asset;

pub struct MemoryCatalogRepo<E> {
    records: Mutex<Vec<E>>,
}

impl<E: CatalogEntry> MemoryCatalogRepo<E> {
    pub fn new() -> Self {
        Self::with_records(Vec::new())
    }

    pub fn with_records(records: Vec<E>) -> Self {
        Self {
            records: Mutex::new(records),
        }
    }

    pub fn snapshot(&self) -> Vec<E> {
        self.records.lock().unwrap().clone()
    }

    fn slug_taken(records: &[E], slug: &str, except: Option<Uuid>) -> bool {
        records
            .iter()
            .any(|r| r.slug() == slug && Some(r.id()) != except)
    }
}

impl<E: CatalogEntry> Default for MemoryCatalogRepo<E> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<E: CatalogEntry> CatalogRepo<E> for MemoryCatalogRepo<E> {
    async fn find_many(
        &self,
        predicate: &Predicate,
        sort: E::Sort,
        skip: i64,
        take: i64,
    ) -> Result<Vec<E>> {
        let mut matching: Vec<E> = self
            .records
            .lock()
            .unwrap()
            .iter()
            .filter(|r| predicate.matches(*r))
            .cloned()
            .collect();

        matching.sort_by(|a, b| {
            a.compare_primary(b, sort)
                .then_with(|| b.created_at().cmp(&a.created_at()))
                .then_with(|| a.id().cmp(&b.id()))
        });

        Ok(matching
            .into_iter()
            .skip(skip.max(0) as usize)
            .take(take.max(0) as usize)
            .collect())
    }

    async fn count(&self, predicate: &Predicate) -> Result<i64> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().filter(|r| predicate.matches(*r)).count() as i64)
    }

    async fn taxonomy(&self, status: PublishStatus) -> Result<Vec<LabelSet>> {
        let records = self.records.lock().unwrap();
        Ok(records
            .iter()
            .filter(|r| r.status() == status)
            .map(|r| LabelSet {
                categories: r.categories().to_vec(),
                tags: r.tags().to_vec(),
            })
            .collect())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<E>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.id() == id).cloned())
    }

    async fn find_by_slug(&self, slug: &str) -> Result<Option<E>> {
        let records = self.records.lock().unwrap();
        Ok(records.iter().find(|r| r.slug() == slug).cloned())
    }

    async fn create(&self, draft: &E::Draft) -> Result<E> {
        let record = E::from_draft(Uuid::new_v4(), draft, Utc::now());
        let mut records = self.records.lock().unwrap();
        if Self::slug_taken(&records, record.slug(), None) {
            return Err(SlugTaken.into());
        }
        records.push(record.clone());
        Ok(record)
    }

    async fn update(&self, id: Uuid, draft: &E::Draft) -> Result<Option<Revision<E>>> {
        let mut records = self.records.lock().unwrap();
        let Some(index) = records.iter().position(|r| r.id() == id) else {
            return Ok(None);
        };

        let before = records[index].clone();
        let after = before.revise(draft, Utc::now());
        if Self::slug_taken(&records, after.slug(), Some(id)) {
            return Err(SlugTaken.into());
        }
        records[index] = after.clone();

        Ok(Some(Revision { before, after }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<E>> {
        let mut records = self.records.lock().unwrap();
        let index = records.iter().position(|r| r.id() == id);
        Ok(index.map(|i| records.remove(i)))
    }
}

#[async_trait]
impl AssetRepo for MemoryCatalogRepo<Asset> {
    async fn record_download(&self, id: Uuid) -> Result<()> {
        let mut records = self.records.lock().unwrap();
        if let Some(asset) = records.iter_mut().find(|a| a.id == id) {
            asset.download_count += 1;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Product;
    use crate::test_utils::{mock_product, product_payload};

    #[tokio::test]
    async fn create_rejects_duplicate_slug() {
        let repo = MemoryCatalogRepo::<Product>::new();
        repo.create(&product_payload("combat-kit")).await.unwrap();

        let err = repo
            .create(&product_payload("combat-kit"))
            .await
            .unwrap_err();

        assert!(err.downcast_ref::<SlugTaken>().is_some());
    }

    #[tokio::test]
    async fn update_returns_before_and_after() {
        let existing = mock_product("Combat Kit", &["combat"]);
        let id = existing.id;
        let repo = MemoryCatalogRepo::with_records(vec![existing.clone()]);

        let revision = repo
            .update(id, &product_payload("combat-kit-2"))
            .await
            .unwrap()
            .unwrap();

        assert_eq!(revision.before, existing);
        assert_eq!(revision.after.slug, "combat-kit-2");
        assert_eq!(revision.after.created_at, existing.created_at);
        assert_eq!(repo.snapshot()[0].slug, "combat-kit-2");
    }

    #[tokio::test]
    async fn update_missing_is_none() {
        let repo = MemoryCatalogRepo::<Product>::new();

        let result = repo
            .update(Uuid::new_v4(), &product_payload("x"))
            .await
            .unwrap();

        assert!(result.is_none());
    }
}
