//! Request throttling
//!
//! Token bucket throttling via the governor crate, keeping long exports
//! under the API's secondary rate limits.

use governor::clock::DefaultClock;
use governor::middleware::NoOpMiddleware;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Configuration for request throttling
#[derive(Debug, Clone)]
pub struct ThrottleConfig {
    /// Maximum requests per second
    pub requests_per_second: u32,
    /// Burst size (max tokens in the bucket)
    pub burst_size: u32,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        Self {
            requests_per_second: 5,
            burst_size: 5,
        }
    }
}

impl ThrottleConfig {
    /// Create a throttle config
    pub fn new(requests_per_second: u32, burst_size: u32) -> Self {
        Self {
            requests_per_second,
            burst_size,
        }
    }
}

/// Token bucket throttle shared across request attempts
#[derive(Clone)]
pub struct Throttle {
    limiter: Arc<RateLimiter<NotKeyed, InMemoryState, DefaultClock, NoOpMiddleware>>,
}

impl Throttle {
    /// Create a throttle with the given config
    pub fn new(config: &ThrottleConfig) -> Self {
        let one = NonZeroU32::MIN;
        let quota = Quota::per_second(NonZeroU32::new(config.requests_per_second).unwrap_or(one))
            .allow_burst(NonZeroU32::new(config.burst_size).unwrap_or(one));

        Self {
            limiter: Arc::new(RateLimiter::direct(quota)),
        }
    }

    /// Wait until the next request may be sent
    pub async fn wait(&self) {
        self.limiter.until_ready().await;
    }

    /// Check whether a request could be sent immediately
    pub fn check(&self) -> bool {
        self.limiter.check().is_ok()
    }
}

impl std::fmt::Debug for Throttle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Throttle").finish()
    }
}
