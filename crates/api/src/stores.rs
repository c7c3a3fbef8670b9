//! Ephemeral stores.
//!
//! This module contains traits and implementations for short-lived request
//! accounting that does not belong in PostgreSQL.
//!
//! ## Stores
//!
//! - **rate_limit** - Fixed-window counters guarding login and downloads,
//!   process-local (dashmap) or shared (Redis)
//!
//! ## Key Patterns
//!
//! ```text
//! login:{client_ip}       → login attempts per window
//! download:{client_ip}    → downloads per window
//! ratelimit:{key}         → Redis counter for the above (auto-expires)
//! ```
//!
//! ## Usage in Handlers
//!
//! Stores are accessed via `state.stores`:
//!
//! ```ignore
//! async fn handler(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
//!     let decision = state.stores.rate_limiter.check_and_consume(&key, policy).await?;
//! }
//! ```

mod rate_limit;

pub use rate_limit::{
    InMemoryRateLimiter, RateLimitDecision, RateLimitPolicy, RateLimiter, RedisRateLimiter,
    spawn_sweeper,
};

#[cfg(test)]
pub use rate_limit::MockRateLimiter;

use std::sync::Arc;

/// Collection of all ephemeral stores.
#[derive(Clone)]
pub struct Stores {
    pub rate_limiter: Arc<dyn RateLimiter>,
}
