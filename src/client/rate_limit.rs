//! Reactive rate limiting for GitHub API calls
//!
//! Limiters stay dormant until GitHub answers with a rate-limit error, then
//! pace further calls in the same category. Nothing is retried here; the
//! failing call still surfaces its error to the caller.

use std::collections::HashMap;
use std::num::NonZeroU32;
use std::sync::atomic::{AtomicBool, Ordering};

use governor::clock::DefaultClock;
use governor::state::{InMemoryState, NotKeyed};
use governor::{Quota, RateLimiter};
use log::debug;

/// Categories of API calls with their own limits.
///
/// GitHub allows 5000 requests/hour per token for reads, and applies a
/// secondary limit of 80 content-creating requests/minute to mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointCategory {
    /// GET requests - 1 req/sec once throttled
    Read,
    /// POST/PATCH/DELETE requests - 80/min once throttled
    Mutation,
}

impl EndpointCategory {
    /// All endpoint categories for initialization.
    pub const ALL: [EndpointCategory; 2] = [EndpointCategory::Read, EndpointCategory::Mutation];

    /// Categorize a request by its HTTP method.
    pub fn from_method(method: &reqwest::Method) -> Self {
        if *method == reqwest::Method::GET || *method == reqwest::Method::HEAD {
            EndpointCategory::Read
        } else {
            EndpointCategory::Mutation
        }
    }

    fn quota(&self) -> Quota {
        match self {
            EndpointCategory::Read => Quota::per_second(NonZeroU32::MIN),
            EndpointCategory::Mutation => {
                Quota::per_minute(NonZeroU32::new(80).unwrap_or(NonZeroU32::MIN))
            }
        }
    }
}

/// Rate limiter state for a single endpoint category.
pub struct EndpointRateLimiter {
    limiter: RateLimiter<NotKeyed, InMemoryState, DefaultClock>,
    active: AtomicBool,
    category: EndpointCategory,
}

impl EndpointRateLimiter {
    pub fn new(category: EndpointCategory) -> Self {
        Self {
            limiter: RateLimiter::direct(category.quota()),
            active: AtomicBool::new(false),
            category,
        }
    }

    /// Activate rate limiting for this category.
    pub fn activate(&self) {
        let was_active = self.active.swap(true, Ordering::SeqCst);
        if !was_active {
            debug!("Rate limiting activated for {:?}", self.category);
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::SeqCst)
    }

    /// Wait for permission if rate limiting is active.
    pub async fn wait_if_active(&self) {
        if self.is_active() {
            debug!("Waiting for rate limiter {:?}", self.category);
            self.limiter.until_ready().await;
        }
    }
}

/// Collection of rate limiters for all endpoint categories.
pub struct RateLimiterSet {
    limiters: HashMap<EndpointCategory, EndpointRateLimiter>,
}

impl Default for RateLimiterSet {
    fn default() -> Self {
        Self::new()
    }
}

impl RateLimiterSet {
    pub fn new() -> Self {
        let limiters = EndpointCategory::ALL
            .into_iter()
            .map(|category| (category, EndpointRateLimiter::new(category)))
            .collect();

        Self { limiters }
    }

    /// Wait for rate limit permission for a category (if active).
    pub async fn wait_for(&self, category: EndpointCategory) {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.wait_if_active().await;
        }
    }

    /// Activate rate limiting for a category (called on a rate-limit answer).
    pub fn activate(&self, category: EndpointCategory) {
        if let Some(limiter) = self.limiters.get(&category) {
            limiter.activate();
        }
    }

    pub fn is_active(&self, category: EndpointCategory) -> bool {
        self.limiters
            .get(&category)
            .is_some_and(EndpointRateLimiter::is_active)
    }
}
