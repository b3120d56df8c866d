//! Seam to the external rate-limit counter store.
//!
//! Counting happens elsewhere; this process only derives keys (see
//! [`crate::keys`]) and turns the store's decision into the error contract.

use async_trait::async_trait;

use sitegate_core::{DomainError, Failure};

pub const RATE_LIMITED_MESSAGE: &str = "Too many requests, please try again later";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Record one hit against `key` and report whether it is within limits.
    async fn hit(&self, key: &str) -> anyhow::Result<RateLimitDecision>;
}

/// Allows everything. Used when no limiter is wired in.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnlimitedRateLimiter;

#[async_trait]
impl RateLimiter for UnlimitedRateLimiter {
    async fn hit(&self, _key: &str) -> anyhow::Result<RateLimitDecision> {
        Ok(RateLimitDecision::Allowed)
    }
}

/// Fails closed: a limiter that cannot answer is an internal failure.
pub async fn enforce(limiter: &dyn RateLimiter, key: &str) -> Result<(), Failure> {
    match limiter.hit(key).await.map_err(Failure::internal)? {
        RateLimitDecision::Allowed => Ok(()),
        RateLimitDecision::Limited { retry_after_secs } => {
            tracing::info!(key, retry_after_secs, "rate limit exceeded");
            Err(DomainError::rate_limited(RATE_LIMITED_MESSAGE).into())
        }
    }
}
