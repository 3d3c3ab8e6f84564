//! Fixed-window rate limiting keyed by client address.
//!
//! Counters live behind the [`CounterStore`] trait: an in-process DashMap
//! for single-instance deployments, or Redis when several gateway
//! instances must share one count.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use axum::{
    body::Body,
    extract::{Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::Response,
};
use dashmap::DashMap;
use redis::{aio::MultiplexedConnection, Client, Script};

use crate::config::validation::{is_redis_url, redact};
use crate::config::{RateLimitConfig, MEMORY_STORAGE_URL};
use crate::error::GatewayError;
use crate::http::request::client_address;
use crate::http::server::AppState;
use crate::observability::metrics;
use crate::security::ip_ranges::IpRangeSet;
use crate::security::limit_key::{LimitKey, LimitKeyResolver};

/// Hard cap on in-memory windows before expired ones are swept.
const MAX_ENTRIES: usize = 100_000;
const REDIS_KEY_PREFIX: &str = "rl:";
const REDIS_CONNECT_TIMEOUT: Duration = Duration::from_secs(5);
const REDIS_OP_TIMEOUT: Duration = Duration::from_secs(1);

/// INCR the window counter, arm its expiry on the first hit, return {count, ttl}.
const HIT_SCRIPT: &str = r#"
local current = redis.call('INCR', KEYS[1])
if current == 1 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
end
local ttl = redis.call('TTL', KEYS[1])
if ttl < 0 then
    redis.call('EXPIRE', KEYS[1], ARGV[1])
    ttl = tonumber(ARGV[1])
end
return {current, ttl}
"#;

/// Counter state after recording one hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowHit {
    pub count: u64,
    pub resets_in: Duration,
}

/// Atomic increment-and-read of a per-key window counter.
#[async_trait]
pub trait CounterStore: Send + Sync {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, GatewayError>;

    fn backend(&self) -> &'static str;
}

struct WindowSlot {
    started: Instant,
    count: u64,
}

/// Process-local counters. Only consistent within a single instance.
#[derive(Default)]
pub struct MemoryStore {
    windows: DashMap<String, WindowSlot>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    fn purge_expired(&self, now: Instant, window: Duration) {
        let before = self.windows.len();
        self.windows
            .retain(|_, slot| now.duration_since(slot.started) < window);
        tracing::debug!(
            before,
            after = self.windows.len(),
            "Purged expired rate limit windows"
        );
    }
}

#[async_trait]
impl CounterStore for MemoryStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, GatewayError> {
        let now = Instant::now();
        if self.windows.len() >= MAX_ENTRIES {
            self.purge_expired(now, window);
        }

        let mut slot = self
            .windows
            .entry(key.to_string())
            .or_insert_with(|| WindowSlot {
                started: now,
                count: 0,
            });
        if now.duration_since(slot.started) >= window {
            slot.started = now;
            slot.count = 0;
        }
        slot.count += 1;

        Ok(WindowHit {
            count: slot.count,
            resets_in: window.saturating_sub(now.duration_since(slot.started)),
        })
    }

    fn backend(&self) -> &'static str {
        "memory"
    }
}

/// Counters shared through Redis.
pub struct RedisStore {
    conn: MultiplexedConnection,
    script: Script,
}

impl RedisStore {
    /// Open a multiplexed connection and verify it with `PING`.
    pub async fn connect(url: &str) -> Result<Self, GatewayError> {
        let client = Client::open(url).map_err(storage_error)?;
        let mut conn = tokio::time::timeout(
            REDIS_CONNECT_TIMEOUT,
            client.get_multiplexed_async_connection(),
        )
        .await
        .map_err(|_| GatewayError::StorageUnavailable("connection timed out".into()))?
        .map_err(storage_error)?;

        let pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(storage_error)?;
        tracing::debug!(reply = %pong, "Redis rate limit storage reachable");

        Ok(Self {
            conn,
            script: Script::new(HIT_SCRIPT),
        })
    }
}

#[async_trait]
impl CounterStore for RedisStore {
    async fn hit(&self, key: &str, window: Duration) -> Result<WindowHit, GatewayError> {
        let mut conn = self.conn.clone();
        let mut invocation = self.script.key(format!("{REDIS_KEY_PREFIX}{key}"));
        invocation.arg(window.as_secs().max(1));

        let (count, ttl): (u64, i64) =
            tokio::time::timeout(REDIS_OP_TIMEOUT, invocation.invoke_async(&mut conn))
                .await
                .map_err(|_| GatewayError::StorageUnavailable("operation timed out".into()))?
                .map_err(storage_error)?;

        Ok(WindowHit {
            count,
            resets_in: Duration::from_secs(ttl.max(0) as u64),
        })
    }

    fn backend(&self) -> &'static str {
        "redis"
    }
}

fn storage_error(err: redis::RedisError) -> GatewayError {
    GatewayError::StorageUnavailable(err.to_string())
}

/// Outcome of an admission check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allowed { remaining: u64 },
    /// Client is in an exempt range; nothing was counted.
    Exempt,
    Limited { retry_after: Duration },
}

pub struct RateLimiter {
    store: Arc<dyn CounterStore>,
    resolver: LimitKeyResolver,
    quota: u64,
    window: Duration,
}

impl RateLimiter {
    pub fn new(
        store: Arc<dyn CounterStore>,
        resolver: LimitKeyResolver,
        quota: u64,
        window: Duration,
    ) -> Self {
        Self {
            store,
            resolver,
            quota,
            window,
        }
    }

    /// Build the limiter and its storage backend.
    ///
    /// `storage_url` is `memory://` or a `redis://` / `rediss://` URL.
    pub async fn connect(config: &RateLimitConfig, storage_url: &str) -> Result<Self, GatewayError> {
        let exempt = IpRangeSet::parse(&config.exempt_ranges)
            .map_err(|e| GatewayError::Internal(format!("rate_limit.exempt_ranges: {e}")))?;

        let store: Arc<dyn CounterStore> = if storage_url.starts_with(MEMORY_STORAGE_URL) {
            Arc::new(MemoryStore::new())
        } else if is_redis_url(storage_url) {
            Arc::new(RedisStore::connect(storage_url).await?)
        } else {
            return Err(GatewayError::StorageUnavailable(format!(
                "unsupported storage url {}",
                redact(storage_url)
            )));
        };

        tracing::info!(
            backend = store.backend(),
            quota = config.requests_per_window,
            window_secs = config.window_secs,
            exempt_ranges = exempt.len(),
            "Rate limiter ready"
        );

        Ok(Self::new(
            store,
            LimitKeyResolver::new(exempt),
            config.requests_per_window,
            Duration::from_secs(config.window_secs),
        ))
    }

    pub fn resolver(&self) -> &LimitKeyResolver {
        &self.resolver
    }

    pub fn quota(&self) -> u64 {
        self.quota
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Count one request against `key`.
    ///
    /// Storage failures admit the request.
    pub async fn check(&self, key: &LimitKey) -> Decision {
        let client = match key {
            LimitKey::Unlimited => return Decision::Exempt,
            LimitKey::Client(client) => client,
        };

        match self.store.hit(client, self.window).await {
            Ok(hit) if hit.count > self.quota => Decision::Limited {
                retry_after: hit.resets_in,
            },
            Ok(hit) => Decision::Allowed {
                remaining: self.quota - hit.count,
            },
            Err(err) => {
                tracing::error!(
                    error = %err,
                    backend = self.store.backend(),
                    client = %client,
                    "Rate limit storage failed, admitting request"
                );
                metrics::record_storage_error(self.store.backend());
                Decision::Allowed {
                    remaining: self.quota,
                }
            }
        }
    }

    /// Human-readable quota, e.g. `10 per 1 minute`.
    pub fn describe(&self) -> String {
        let secs = self.window.as_secs();
        let (amount, unit) = if secs > 0 && secs % 3600 == 0 {
            (secs / 3600, "hour")
        } else if secs > 0 && secs % 60 == 0 {
            (secs / 60, "minute")
        } else {
            (secs, "second")
        };
        let plural = if amount == 1 { "" } else { "s" };
        format!("{} per {amount} {unit}{plural}", self.quota)
    }
}

/// Middleware for per-client fixed-window limits.
pub async fn rate_limit_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let Some(limiter) = state.limiter.as_ref() else {
        return next.run(request).await;
    };

    let client = client_address(&request, state.trust_forwarded_for);
    let key = limiter.resolver().resolve_or_fallback(&client);

    match limiter.check(&key).await {
        Decision::Exempt | Decision::Allowed { .. } => next.run(request).await,
        Decision::Limited { retry_after } => {
            tracing::warn!(client = %key.as_str(), limit = %limiter.describe(), "Rate limit exceeded");
            metrics::record_rate_limited();
            too_many_requests(limiter, retry_after)
        }
    }
}

fn too_many_requests(limiter: &RateLimiter, retry_after: Duration) -> Response {
    let body = format!("429 Too Many Requests: {}", limiter.describe());
    let mut response = Response::new(Body::from(body));
    *response.status_mut() = StatusCode::TOO_MANY_REQUESTS;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; charset=utf-8"),
    );
    headers.insert(
        header::RETRY_AFTER,
        HeaderValue::from(retry_after.as_secs().max(1)),
    );
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FailingStore;

    #[async_trait]
    impl CounterStore for FailingStore {
        async fn hit(&self, _key: &str, _window: Duration) -> Result<WindowHit, GatewayError> {
            Err(GatewayError::StorageUnavailable("connection refused".into()))
        }

        fn backend(&self) -> &'static str {
            "failing"
        }
    }

    fn limiter(quota: u64) -> RateLimiter {
        RateLimiter::new(
            Arc::new(MemoryStore::new()),
            LimitKeyResolver::default(),
            quota,
            Duration::from_secs(60),
        )
    }

    #[tokio::test]
    async fn test_quota_plus_one_is_first_rejection() {
        let limiter = limiter(3);
        let key = LimitKey::Client("203.0.113.7".into());

        for n in 1..=3 {
            assert_eq!(
                limiter.check(&key).await,
                Decision::Allowed { remaining: 3 - n }
            );
        }
        assert!(matches!(limiter.check(&key).await, Decision::Limited { .. }));
    }

    #[tokio::test]
    async fn test_keys_are_counted_separately() {
        let limiter = limiter(1);
        let a = LimitKey::Client("198.51.100.1".into());
        let b = LimitKey::Client("198.51.100.2".into());

        assert!(matches!(limiter.check(&a).await, Decision::Allowed { .. }));
        assert!(matches!(limiter.check(&b).await, Decision::Allowed { .. }));
        assert!(matches!(limiter.check(&a).await, Decision::Limited { .. }));
    }

    #[tokio::test]
    async fn test_unlimited_key_is_never_counted() {
        let limiter = limiter(1);
        for _ in 0..20 {
            assert_eq!(limiter.check(&LimitKey::Unlimited).await, Decision::Exempt);
        }
    }

    #[tokio::test]
    async fn test_storage_failure_admits() {
        let limiter = RateLimiter::new(
            Arc::new(FailingStore),
            LimitKeyResolver::default(),
            1,
            Duration::from_secs(60),
        );
        let key = LimitKey::Client("203.0.113.7".into());
        for _ in 0..5 {
            assert!(matches!(limiter.check(&key).await, Decision::Allowed { .. }));
        }
    }

    #[tokio::test]
    async fn test_memory_window_resets() {
        let store = MemoryStore::new();
        let window = Duration::from_millis(50);

        assert_eq!(store.hit("k", window).await.unwrap().count, 1);
        assert_eq!(store.hit("k", window).await.unwrap().count, 2);
        tokio::time::sleep(Duration::from_millis(80)).await;
        assert_eq!(store.hit("k", window).await.unwrap().count, 1);
    }

    #[tokio::test]
    async fn test_connect_rejects_unknown_scheme() {
        let config = RateLimitConfig::default();
        let err = RateLimiter::connect(&config, "memcached://localhost").await;
        assert!(matches!(err, Err(GatewayError::StorageUnavailable(_))));
    }

    #[tokio::test]
    async fn test_connect_unreachable_redis_fails() {
        let config = RateLimitConfig::default();
        let err = RateLimiter::connect(&config, "redis://127.0.0.1:1/0").await;
        assert!(matches!(err, Err(GatewayError::StorageUnavailable(_))));
    }

    #[test]
    fn test_describe() {
        assert_eq!(limiter(10).describe(), "10 per 1 minute");
        let hourly = RateLimiter::new(
            Arc::new(MemoryStore::new()),
            LimitKeyResolver::default(),
            100,
            Duration::from_secs(7200),
        );
        assert_eq!(hourly.describe(), "100 per 2 hours");
        let short = RateLimiter::new(
            Arc::new(MemoryStore::new()),
            LimitKeyResolver::default(),
            5,
            Duration::from_secs(30),
        );
        assert_eq!(short.describe(), "5 per 30 seconds");
    }
}
