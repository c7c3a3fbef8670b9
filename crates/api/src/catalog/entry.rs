//! Per-kind configuration of the two catalog collections.

use chrono::{DateTime, Utc};
use serde::Serialize;
use shared::api::{AssetPayload, AssetSummary, ProductPayload, ProductSummary, PublishStatus};
use uuid::Uuid;

use super::sort::{AssetSort, ProductSort, SortKey};
use crate::models::{Asset, Product};

/// The queryable collections.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Collection {
    Products,
    Assets,
}

impl Collection {
    pub const fn table(&self) -> &'static str {
        match self {
            Collection::Products => "products",
            Collection::Assets => "assets",
        }
    }

    /// Entity name used in logs and audit events.
    pub const fn entity(&self) -> &'static str {
        match self {
            Collection::Products => "product",
            Collection::Assets => "asset",
        }
    }
}

/// A record kind the catalog engine can filter, sort and paginate.
pub trait CatalogEntry: Clone + Serialize + Send + Sync + 'static {
    type Sort: SortKey;
    type Summary: Serialize + Send;
    /// Admin create/replace payload.
    type Draft: Send + Sync;

    const COLLECTION: Collection;

    fn id(&self) -> Uuid;
    fn slug(&self) -> &str;
    fn title(&self) -> &str;
    fn description(&self) -> &str;
    fn categories(&self) -> &[String];
    fn tags(&self) -> &[String];
    fn status(&self) -> PublishStatus;
    fn created_at(&self) -> DateTime<Utc>;

    fn summary(&self) -> Self::Summary;

    /// New record from an admin payload.
    fn from_draft(id: Uuid, draft: &Self::Draft, now: DateTime<Utc>) -> Self;

    /// Replace the editable fields, keeping identity, creation time and counters.
    fn revise(&self, draft: &Self::Draft, now: DateTime<Utc>) -> Self;

    /// Primary comparator for in-memory ordering, before the tiebreak.
    #[cfg(test)]
    fn compare_primary(&self, other: &Self, sort: Self::Sort) -> std::cmp::Ordering;
}

impl CatalogEntry for Product {
    type Sort = ProductSort;
    type Summary = ProductSummary;
    type Draft = ProductPayload;

    const COLLECTION: Collection = Collection::Products;

    fn id(&self) -> Uuid {
        self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn status(&self) -> PublishStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            price_cents: self.price_cents,
            thumbnail: self.images.first().cloned(),
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
        }
    }

    fn from_draft(id: Uuid, draft: &ProductPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            slug: draft.slug.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            categories: draft.categories.clone(),
            tags: draft.tags.clone(),
            status: draft.status,
            price_cents: draft.price_cents,
            images: draft.images.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn revise(&self, draft: &ProductPayload, now: DateTime<Utc>) -> Self {
        Self {
            created_at: self.created_at,
            ..Self::from_draft(self.id, draft, now)
        }
    }

    #[cfg(test)]
    fn compare_primary(&self, other: &Self, sort: ProductSort) -> std::cmp::Ordering {
        match sort {
            ProductSort::Newest => std::cmp::Ordering::Equal,
            ProductSort::PriceAsc => self.price_cents.cmp(&other.price_cents),
            ProductSort::PriceDesc => other.price_cents.cmp(&self.price_cents),
        }
    }
}

impl CatalogEntry for Asset {
    type Sort = AssetSort;
    type Summary = AssetSummary;
    type Draft = AssetPayload;

    const COLLECTION: Collection = Collection::Assets;

    fn id(&self) -> Uuid {
        self.id
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn title(&self) -> &str {
        &self.title
    }

    fn description(&self) -> &str {
        &self.description
    }

    fn categories(&self) -> &[String] {
        &self.categories
    }

    fn tags(&self) -> &[String] {
        &self.tags
    }

    fn status(&self) -> PublishStatus {
        self.status
    }

    fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    fn summary(&self) -> AssetSummary {
        AssetSummary {
            id: self.id,
            slug: self.slug.clone(),
            title: self.title.clone(),
            version: self.version.clone(),
            license: self.license.clone(),
            download_count: self.download_count,
            categories: self.categories.clone(),
            tags: self.tags.clone(),
            created_at: self.created_at,
        }
    }

    fn from_draft(id: Uuid, draft: &AssetPayload, now: DateTime<Utc>) -> Self {
        Self {
            id,
            slug: draft.slug.clone(),
            title: draft.title.clone(),
            description: draft.description.clone(),
            categories: draft.categories.clone(),
            tags: draft.tags.clone(),
            status: draft.status,
            version: draft.version.clone(),
            license: draft.license.clone(),
            download_count: 0,
            files: draft.files.clone(),
            created_at: now,
            updated_at: now,
        }
    }

    fn revise(&self, draft: &AssetPayload, now: DateTime<Utc>) -> Self {
        Self {
            created_at: self.created_at,
            download_count: self.download_count,
            ..Self::from_draft(self.id, draft, now)
        }
    }

    #[cfg(test)]
    fn compare_primary(&self, other: &Self, sort: AssetSort) -> std::cmp::Ordering {
        match sort {
            AssetSort::Newest => std::cmp::Ordering::Equal,
            AssetSort::Popular => other.download_count.cmp(&self.download_count),
            AssetSort::Name => self.title.to_lowercase().cmp(&other.title.to_lowercase()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeDelta;

    fn asset_payload(title: &str) -> AssetPayload {
        AssetPayload {
            slug: "door-script".into(),
            title: title.into(),
            description: "Opens doors".into(),
            categories: vec!["scripts".into()],
            tags: vec!["doors".into()],
            status: PublishStatus::Published,
            version: "1.0.0".into(),
            license: "MIT".into(),
            files: vec![],
        }
    }

    #[test]
    fn revise_keeps_identity_created_at_and_downloads() {
        let created = Utc::now() - TimeDelta::days(3);
        let mut asset = Asset::from_draft(Uuid::new_v4(), &asset_payload("Door"), created);
        asset.download_count = 42;

        let now = Utc::now();
        let revised = asset.revise(&asset_payload("Door v2"), now);

        assert_eq!(revised.id, asset.id);
        assert_eq!(revised.created_at, created);
        assert_eq!(revised.updated_at, now);
        assert_eq!(revised.download_count, 42);
        assert_eq!(revised.title, "Door v2");
    }

    #[test]
    fn product_summary_uses_first_image_as_thumbnail() {
        let product = Product::from_draft(
            Uuid::new_v4(),
            &ProductPayload {
                slug: "kit".into(),
                title: "Kit".into(),
                description: String::new(),
                categories: vec![],
                tags: vec![],
                status: PublishStatus::Draft,
                price_cents: 999,
                images: vec!["/uploads/a.png".into(), "/uploads/b.png".into()],
            },
            Utc::now(),
        );

        let summary = product.summary();

        assert_eq!(summary.thumbnail.as_deref(), Some("/uploads/a.png"));
        assert_eq!(summary.price_cents, 999);
    }

    #[test]
    fn collections_map_to_tables() {
        assert_eq!(Product::COLLECTION.table(), "products");
        assert_eq!(Asset::COLLECTION.table(), "assets");
        assert_eq!(Asset::COLLECTION.entity(), "asset");
    }
}
