//! Per-endpoint rate limiting on top of the [`RateLimiter`](crate::stores::RateLimiter) store.

use crate::{error::AppError, state::AppState, stores::RateLimitPolicy};

/// Key scopes, so login and download budgets for one IP are independent.
pub mod scopes {
    pub const LOGIN: &str = "login";
    pub const DOWNLOAD: &str = "download";
}

pub fn rate_limit_key(scope: &str, ip: &str) -> String {
    format!("{}:{}", scope, ip)
}

/// Consume one request from `scope` for `ip`.
///
/// Rejections become [`AppError::Throttled`]. A failing store lets the request
/// through with a warning.
pub async fn throttle(
    state: &AppState,
    scope: &str,
    ip: &str,
    policy: RateLimitPolicy,
) -> Result<(), AppError> {
    let key = rate_limit_key(scope, ip);

    let decision = match state.stores.rate_limiter.check_and_consume(&key, policy).await {
        Ok(decision) => decision,
        Err(e) => {
            tracing::warn!(key = %key, error = %e, "Rate limiter unavailable, allowing request");
            return Ok(());
        }
    };

    if !decision.allowed {
        let retry_after_secs = decision.retry_after_secs(state.clock.now());
        tracing::info!(key = %key, retry_after_secs, "Rate limit exceeded");
        return Err(AppError::Throttled { retry_after_secs });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stores::{MockRateLimiter, RateLimitDecision};
    use crate::test_utils::TestStateBuilder;
    use chrono::{TimeDelta, Utc};
    use std::time::Duration;

    fn policy() -> RateLimitPolicy {
        RateLimitPolicy::new(5, Duration::from_secs(900))
    }

    #[test]
    fn keys_are_scoped() {
        assert_eq!(rate_limit_key(scopes::LOGIN, "1.2.3.4"), "login:1.2.3.4");
        assert_ne!(
            rate_limit_key(scopes::LOGIN, "1.2.3.4"),
            rate_limit_key(scopes::DOWNLOAD, "1.2.3.4")
        );
    }

    #[tokio::test]
    async fn rejection_maps_to_throttled() {
        let reset_at = Utc::now() + TimeDelta::seconds(30);
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_check_and_consume()
            .withf(|key, _| key == "login:1.2.3.4")
            .returning(move |_, _| {
                Ok(RateLimitDecision {
                    allowed: false,
                    remaining: 0,
                    reset_at,
                })
            });
        let state = TestStateBuilder::new().with_rate_limiter(limiter).build();

        let err = throttle(&state, scopes::LOGIN, "1.2.3.4", policy())
            .await
            .unwrap_err();

        match err {
            AppError::Throttled { retry_after_secs } => {
                assert!((29..=30).contains(&retry_after_secs))
            }
            _ => panic!("expected throttled"),
        }
    }

    #[tokio::test]
    async fn store_failure_fails_open() {
        let mut limiter = MockRateLimiter::new();
        limiter
            .expect_check_and_consume()
            .returning(|_, _| Err(anyhow::anyhow!("redis down")));
        let state = TestStateBuilder::new().with_rate_limiter(limiter).build();

        assert!(
            throttle(&state, scopes::DOWNLOAD, "1.2.3.4", policy())
                .await
                .is_ok()
        );
    }
}
