//! Per-caller rate limiting with per-route policies.
//!
//! Every route has a default limit tracked per caller. A route can replace it
//! with its own limit ([`LimitPolicy::Override`]) or demand a token from both
//! ([`LimitPolicy::Additive`]).

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::{
    body::Body,
    extract::{ConnectInfo, State},
    http::Request,
    middleware::Next,
    response::{IntoResponse, Response},
};
use dashmap::DashMap;

use crate::config::RateLimitConfig;
use crate::error::GatewayError;
use crate::observability::metrics;

/// A simple token bucket rate limiter.
#[derive(Debug)]
struct TokenBucket {
    tokens: f64,
    last_update: Instant,
}

impl TokenBucket {
    fn new(capacity: f64, now: Instant) -> Self {
        Self {
            tokens: capacity,
            last_update: now,
        }
    }

    fn try_acquire(&mut self, limit: Rate, now: Instant) -> bool {
        let elapsed = now.saturating_duration_since(self.last_update).as_secs_f64();

        // Refill tokens
        self.tokens = (self.tokens + elapsed * limit.refill_per_sec()).min(limit.capacity());
        self.last_update = now;

        if self.tokens >= 1.0 {
            self.tokens -= 1.0;
            true
        } else {
            false
        }
    }

    fn refund(&mut self, limit: Rate) {
        self.tokens = (self.tokens + 1.0).min(limit.capacity());
    }
}

/// `requests` per `per`; the bucket holds at most `requests` tokens.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rate {
    pub requests: u32,
    pub per: Duration,
}

impl Rate {
    pub fn per_second(requests: u32) -> Self {
        Self {
            requests,
            per: Duration::from_secs(1),
        }
    }

    fn capacity(self) -> f64 {
        self.requests as f64
    }

    fn refill_per_sec(self) -> f64 {
        self.requests as f64 / self.per.as_secs_f64()
    }
}

/// How a route combines its own limit with the default one.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LimitPolicy {
    /// Only the default limit.
    Default,
    /// Only the route limit.
    Override(Rate),
    /// Both limits must admit the request.
    Additive(Rate),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Tier {
    Default,
    Route,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct BucketKey {
    scope: &'static str,
    tier: Tier,
    client: String,
}

/// Shared limiter. Owned by the server and injected into each route's middleware.
#[derive(Debug)]
pub struct RateLimiter {
    buckets: DashMap<BucketKey, TokenBucket>,
    default_rate: Rate,
    enabled: bool,
}

impl RateLimiter {
    pub fn new(default_rate: Rate) -> Self {
        Self {
            buckets: DashMap::new(),
            default_rate,
            enabled: true,
        }
    }

    /// A limiter that admits everything.
    pub fn disabled() -> Self {
        Self {
            enabled: false,
            ..Self::new(Rate::per_second(1))
        }
    }

    pub fn from_config(config: &RateLimitConfig) -> Self {
        if config.enabled {
            Self::new(Rate::per_second(config.default_per_second))
        } else {
            Self::disabled()
        }
    }

    /// Take a token for `client` on the route named `scope`.
    pub fn check(&self, scope: &'static str, client: &str, policy: LimitPolicy) -> bool {
        self.check_at(scope, client, policy, Instant::now())
    }

    fn check_at(&self, scope: &'static str, client: &str, policy: LimitPolicy, now: Instant) -> bool {
        if !self.enabled {
            return true;
        }
        match policy {
            LimitPolicy::Default => self.acquire(scope, Tier::Default, client, self.default_rate, now),
            LimitPolicy::Override(rate) => self.acquire(scope, Tier::Route, client, rate, now),
            LimitPolicy::Additive(rate) => {
                if !self.acquire(scope, Tier::Default, client, self.default_rate, now) {
                    return false;
                }
                if self.acquire(scope, Tier::Route, client, rate, now) {
                    return true;
                }
                self.refund(scope, Tier::Default, client, self.default_rate);
                false
            }
        }
    }

    // One shard lock at a time; never hold two entries at once.
    fn acquire(&self, scope: &'static str, tier: Tier, client: &str, rate: Rate, now: Instant) -> bool {
        let key = BucketKey {
            scope,
            tier,
            client: client.to_string(),
        };
        let mut bucket = self
            .buckets
            .entry(key)
            .or_insert_with(|| TokenBucket::new(rate.capacity(), now));
        bucket.try_acquire(rate, now)
    }

    fn refund(&self, scope: &'static str, tier: Tier, client: &str, rate: Rate) {
        let key = BucketKey {
            scope,
            tier,
            client: client.to_string(),
        };
        if let Some(mut bucket) = self.buckets.get_mut(&key) {
            bucket.refund(rate);
        }
    }

    /// Drop buckets idle for longer than `idle`. Returns how many were removed.
    pub fn prune(&self, idle: Duration) -> usize {
        self.prune_at(idle, Instant::now())
    }

    fn prune_at(&self, idle: Duration, now: Instant) -> usize {
        let before = self.buckets.len();
        self.buckets
            .retain(|_, bucket| now.saturating_duration_since(bucket.last_update) < idle);
        before.saturating_sub(self.buckets.len())
    }

    /// Number of tracked buckets.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
}

/// Middleware state for one route.
#[derive(Clone)]
pub struct RouteLimit {
    pub limiter: Arc<RateLimiter>,
    pub scope: &'static str,
    pub policy: LimitPolicy,
}

/// Caller key: peer IP when the connection info is available.
pub fn client_key(request: &Request<Body>) -> String {
    request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

/// Middleware function enforcing a route's limit before its handler runs.
pub async fn rate_limit_middleware(
    State(route): State<RouteLimit>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let client = client_key(&request);

    if route.limiter.check(route.scope, &client, route.policy) {
        next.run(request).await
    } else {
        tracing::warn!(client = %client, scope = route.scope, "Rate limit exceeded");
        metrics::record_rate_limited(route.scope);
        GatewayError::RateLimited.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SCOPE: &str = "api_test";

    #[test]
    fn test_default_policy_one_per_second() {
        let limiter = RateLimiter::new(Rate::per_second(1));
        let t0 = Instant::now();

        assert!(limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0));
        assert!(!limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0));
        assert!(!limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0 + Duration::from_millis(500)));
        assert!(limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0 + Duration::from_millis(1600)));
    }

    #[test]
    fn test_callers_are_independent() {
        let limiter = RateLimiter::new(Rate::per_second(1));
        let t0 = Instant::now();

        assert!(limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0));
        assert!(limiter.check_at(SCOPE, "2.2.2.2", LimitPolicy::Default, t0));
        assert!(!limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0));
    }

    #[test]
    fn test_routes_are_independent() {
        let limiter = RateLimiter::new(Rate::per_second(1));
        let t0 = Instant::now();

        assert!(limiter.check_at("api_search", "1.1.1.1", LimitPolicy::Default, t0));
        assert!(limiter.check_at("api_reservations", "1.1.1.1", LimitPolicy::Default, t0));
    }

    #[test]
    fn test_override_ignores_default() {
        let limiter = RateLimiter::new(Rate::per_second(1));
        let policy = LimitPolicy::Override(Rate::per_second(10));
        let t0 = Instant::now();

        let admitted = (0..15)
            .filter(|_| limiter.check_at(SCOPE, "1.1.1.1", policy, t0))
            .count();
        assert_eq!(admitted, 10);
    }

    #[test]
    fn test_additive_needs_both() {
        let limiter = RateLimiter::new(Rate::per_second(1));
        let policy = LimitPolicy::Additive(Rate::per_second(10));
        let t0 = Instant::now();

        let admitted = (0..15)
            .filter(|_| limiter.check_at(SCOPE, "1.1.1.1", policy, t0))
            .count();
        assert_eq!(admitted, 1);
    }

    #[test]
    fn test_additive_refunds_default_when_route_rejects() {
        let limiter = RateLimiter::new(Rate::per_second(10));
        let policy = LimitPolicy::Additive(Rate::per_second(1));
        let t0 = Instant::now();

        assert!(limiter.check_at(SCOPE, "1.1.1.1", policy, t0));
        for _ in 0..5 {
            assert!(!limiter.check_at(SCOPE, "1.1.1.1", policy, t0));
        }
        // The rejected attempts did not drain the default bucket.
        let remaining = (0..20)
            .filter(|_| limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0))
            .count();
        assert_eq!(remaining, 9);
    }

    #[test]
    fn test_disabled_admits_everything() {
        let limiter = RateLimiter::disabled();
        for _ in 0..100 {
            assert!(limiter.check(SCOPE, "1.1.1.1", LimitPolicy::Default));
        }
        assert!(limiter.is_empty());
    }

    #[test]
    fn test_prune_idle_buckets() {
        let limiter = RateLimiter::new(Rate::per_second(1));
        let t0 = Instant::now();

        limiter.check_at(SCOPE, "1.1.1.1", LimitPolicy::Default, t0);
        limiter.check_at(SCOPE, "2.2.2.2", LimitPolicy::Default, t0 + Duration::from_secs(50));
        assert_eq!(limiter.len(), 2);

        let removed = limiter.prune_at(Duration::from_secs(30), t0 + Duration::from_secs(60));
        assert_eq!(removed, 1);
        assert_eq!(limiter.len(), 1);
    }

    #[test]
    fn test_concurrent_callers_share_one_bucket() {
        let limiter = Arc::new(RateLimiter::new(Rate::per_second(50)));
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let limiter = limiter.clone();
                std::thread::spawn(move || {
                    (0..20)
                        .filter(|_| limiter.check(SCOPE, "1.1.1.1", LimitPolicy::Default))
                        .count()
                })
            })
            .collect();

        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();
        // 160 attempts against a 50-token bucket; a few tokens may refill mid-test.
        assert!((50..=60).contains(&admitted), "admitted {admitted}");
    }
}
