//! Shared test utilities for API handler tests.
//!
//! Provides common fixture factories and a flexible `TestStateBuilder` for
//! constructing `AppState` instances with only the mocks needed for each test.
//! Catalog collections are backed by in-memory repositories rather than mocks.
//!
//! ## Usage
//!
//! ```ignore
//! use crate::test_utils::{TestStateBuilder, mock_asset};
//!
//! let state = TestStateBuilder::new()
//!     .with_assets(vec![mock_asset("Door Script", 0)])
//!     .build();
//! ```

use std::sync::Arc;

use chrono::{TimeDelta, Utc};
use shared::api::{AssetPayload, ProductPayload, PublishStatus};
use uuid::Uuid;

use crate::clock::{Clock, ManualClock};
use crate::config::{Config, RateLimitBackend};
use crate::models::{Asset, AssetFile, Product, Role, User};
use crate::repos::{MemoryCatalogRepo, MockAuditRepo, MockStatusRepo, MockUserRepo, Repos};
use crate::services::{AuthService, FileStorage, MockAuthService, MockFileStorage};
use crate::state::AppState;
use crate::stores::{InMemoryRateLimiter, MockRateLimiter, RateLimiter, Stores};

/// Creates a test configuration with dummy values.
pub fn test_config() -> Config {
    Config {
        host: "127.0.0.1".to_string(),
        port: 3000,
        database_url: "postgres://test".to_string(),
        redis_url: None,
        rate_limit_backend: RateLimitBackend::Memory,
        jwt_secret: "test-secret".to_string(),
        token_ttl_hours: 24,
        upload_dir: "uploads".to_string(),
        max_upload_bytes: 1024 * 1024,
        login_limit: 5,
        login_window_ms: 15 * 60 * 1000,
        download_limit: 30,
        download_window_ms: 60 * 1000,
        env: "test".to_string(),
        sentry_dsn: None,
    }
}

/// Creates a mock user with the given role.
pub fn mock_user(role: Role) -> User {
    User {
        id: Uuid::new_v4(),
        email: "admin@example.com".to_string(),
        password_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
        role,
        created_at: Utc::now(),
    }
}

fn slugify(title: &str) -> String {
    title
        .to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

/// Creates a published product titled `title` with the given tags.
pub fn mock_product(title: &str, tags: &[&str]) -> Product {
    let now = Utc::now();
    Product {
        id: Uuid::new_v4(),
        slug: format!("{}-{}", slugify(title), &Uuid::new_v4().simple().to_string()[..8]),
        title: title.to_string(),
        description: String::new(),
        categories: vec![],
        tags: tags.iter().map(|t| t.to_string()).collect(),
        status: PublishStatus::Published,
        price_cents: 1_000,
        images: vec![],
        created_at: now - TimeDelta::hours(1),
        updated_at: now,
    }
}

/// Creates a published asset titled `title` with one local file.
pub fn mock_asset(title: &str, downloads: i64) -> Asset {
    let now = Utc::now();
    let slug = slugify(title);
    Asset {
        id: Uuid::new_v4(),
        files: vec![AssetFile {
            name: format!("{}.rbxm", slug),
            url: format!("/uploads/{}.rbxm", slug),
            size: 5,
            extension: "rbxm".to_string(),
            content_hash: "ab".repeat(32),
        }],
        slug,
        title: title.to_string(),
        description: String::new(),
        categories: vec![],
        tags: vec![],
        status: PublishStatus::Published,
        version: "1.0.0".to_string(),
        license: "MIT".to_string(),
        download_count: downloads,
        created_at: now - TimeDelta::hours(1),
        updated_at: now,
    }
}

pub fn product_payload(slug: &str) -> ProductPayload {
    ProductPayload {
        slug: slug.to_string(),
        title: "Combat Kit".to_string(),
        description: "Melee framework".to_string(),
        categories: vec!["systems".to_string()],
        tags: vec!["combat".to_string()],
        status: PublishStatus::Published,
        price_cents: 1_499,
        images: vec![],
    }
}

pub fn asset_payload(slug: &str) -> AssetPayload {
    AssetPayload {
        slug: slug.to_string(),
        title: "Door Script".to_string(),
        description: "Opens doors".to_string(),
        categories: vec!["scripts".to_string()],
        tags: vec!["doors".to_string()],
        status: PublishStatus::Published,
        version: "1.0.0".to_string(),
        license: "MIT".to_string(),
        files: vec![],
    }
}

/// Builder for constructing test `AppState` with custom mocks.
///
/// Uses default (empty) mocks for any repo/store/service not explicitly set.
/// The audit repo accepts any log call, catalogs start empty and the rate
/// limiter is a real in-memory limiter driven by the builder's clock.
pub struct TestStateBuilder {
    config: Config,
    user_repo: Option<MockUserRepo>,
    products: Vec<Product>,
    assets: Vec<Asset>,
    audit_repo: Option<MockAuditRepo>,
    status_repo: Option<MockStatusRepo>,
    rate_limiter: Option<Arc<dyn RateLimiter>>,
    auth_service: Option<MockAuthService>,
    file_storage: Option<MockFileStorage>,
    clock: Arc<ManualClock>,
}

impl TestStateBuilder {
    /// Creates a new builder with no mocks configured.
    pub fn new() -> Self {
        Self {
            config: test_config(),
            user_repo: None,
            products: vec![],
            assets: vec![],
            audit_repo: None,
            status_repo: None,
            rate_limiter: None,
            auth_service: None,
            file_storage: None,
            clock: Arc::new(ManualClock::new(Utc::now())),
        }
    }

    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    pub fn with_user_repo(mut self, repo: MockUserRepo) -> Self {
        self.user_repo = Some(repo);
        self
    }

    pub fn with_products(mut self, products: Vec<Product>) -> Self {
        self.products = products;
        self
    }

    pub fn with_assets(mut self, assets: Vec<Asset>) -> Self {
        self.assets = assets;
        self
    }

    pub fn with_audit_repo(mut self, repo: MockAuditRepo) -> Self {
        self.audit_repo = Some(repo);
        self
    }

    pub fn with_status_repo(mut self, repo: MockStatusRepo) -> Self {
        self.status_repo = Some(repo);
        self
    }

    pub fn with_rate_limiter(mut self, limiter: MockRateLimiter) -> Self {
        self.rate_limiter = Some(Arc::new(limiter));
        self
    }

    pub fn with_auth_service(mut self, service: MockAuthService) -> Self {
        self.auth_service = Some(service);
        self
    }

    pub fn with_file_storage(mut self, storage: MockFileStorage) -> Self {
        self.file_storage = Some(storage);
        self
    }

    /// Shares the clock so a test can advance it after building.
    pub fn with_clock(mut self, clock: Arc<ManualClock>) -> Self {
        self.clock = clock;
        self
    }

    /// Builds the `AppState` using configured mocks or defaults.
    pub fn build(self) -> AppState {
        let clock: Arc<dyn Clock> = self.clock;

        let repos = Repos {
            users: Arc::new(self.user_repo.unwrap_or_else(MockUserRepo::new)),
            products: Arc::new(MemoryCatalogRepo::with_records(self.products)),
            assets: Arc::new(MemoryCatalogRepo::with_records(self.assets)),
            audit: Arc::new(self.audit_repo.unwrap_or_else(permissive_audit_repo)),
            status: Arc::new(self.status_repo.unwrap_or_else(MockStatusRepo::new)),
        };

        let stores = Stores {
            rate_limiter: self
                .rate_limiter
                .unwrap_or_else(|| Arc::new(InMemoryRateLimiter::new(clock.clone())) as Arc<dyn RateLimiter>),
        };

        let auth = Arc::new(self.auth_service.unwrap_or_else(MockAuthService::new))
            as Arc<dyn AuthService>;
        let files = Arc::new(self.file_storage.unwrap_or_else(MockFileStorage::new))
            as Arc<dyn FileStorage>;

        AppState {
            config: self.config,
            repos,
            stores,
            auth,
            files,
            clock,
        }
    }
}

impl Default for TestStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Creates an audit repo mock that accepts any log call.
fn permissive_audit_repo() -> MockAuditRepo {
    let mut repo = MockAuditRepo::new();
    repo.expect_log().returning(|_, _, _, _, _| ());
    repo
}
