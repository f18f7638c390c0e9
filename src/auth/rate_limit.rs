//! Redemption Rate Limiting
//!
//! Sliding-window throttle keyed by (limiter kind, caller identity).
//! Purely in-memory; a periodic purge keeps the table from growing with
//! one record per address the server has ever seen.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;

/// How often stale limiter records are purged.
pub const PURGE_INTERVAL: StdDuration = StdDuration::from_secs(60);

/// Throttle policy: how many attempts fit in one window.
#[derive(Debug, Clone)]
pub struct RateLimitConfig {
    /// Attempts allowed inside a window.
    pub max_attempts: usize,
    /// Window length.
    pub window: Duration,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            window: Duration::seconds(30),
        }
    }
}

/// Outcome of a limiter check. Denial is a first-class result, never an
/// error: it carries what the caller needs to answer "try again later".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateDecision {
    /// Attempt admitted and recorded.
    Allowed,
    /// Attempt rejected.
    Denied {
        /// Instant after which a retry can be admitted.
        retry_after: DateTime<Utc>,
        /// Which limiter fired, so the caller can say why.
        kind: String,
    },
}

impl RateDecision {
    /// Whether the attempt was admitted.
    pub fn is_allowed(&self) -> bool {
        matches!(self, RateDecision::Allowed)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct RateKey {
    kind: String,
    identity: String,
}

/// Timestamps of admitted attempts, oldest first. Denied attempts are not
/// recorded, so the retry-after for a throttled caller stays put until the
/// window frees and then resets.
#[derive(Debug, Default)]
struct AttemptWindow {
    attempts: Vec<DateTime<Utc>>,
}

/// Owner of the per-key attempt records.
pub struct RateLimiter {
    config: RateLimitConfig,
    records: RwLock<BTreeMap<RateKey, AttemptWindow>>,
}

impl RateLimiter {
    /// Create a limiter with the given policy.
    pub fn new(config: RateLimitConfig) -> Self {
        Self {
            config,
            records: RwLock::new(BTreeMap::new()),
        }
    }

    /// Check one attempt for `(kind, identity)` against the policy.
    pub async fn check(&self, kind: &str, identity: &str) -> RateDecision {
        self.check_at(Utc::now(), kind, identity).await
    }

    /// Drop records whose window has fully elapsed.
    pub async fn purge_expired(&self) {
        self.purge_at(Utc::now()).await;
    }

    /// Clock-injected check. Holds the table write lock across the whole
    /// read-decide-write sequence, so concurrent checks for the same key
    /// serialize.
    pub async fn check_at(&self, now: DateTime<Utc>, kind: &str, identity: &str) -> RateDecision {
        let key = RateKey {
            kind: kind.to_string(),
            identity: identity.to_string(),
        };
        let window_start = now - self.config.window;

        let mut records = self.records.write().await;
        let record = records.entry(key).or_default();
        record.attempts.retain(|t| *t > window_start);

        if record.attempts.len() >= self.config.max_attempts {
            // Capacity frees when the oldest recorded attempt leaves the
            // window.
            let retry_after = record.attempts[0] + self.config.window;
            return RateDecision::Denied {
                retry_after,
                kind: kind.to_string(),
            };
        }

        record.attempts.push(now);
        RateDecision::Allowed
    }

    /// Clock-injected purge.
    pub async fn purge_at(&self, now: DateTime<Utc>) {
        let window_start = now - self.config.window;
        let mut records = self.records.write().await;
        records.retain(|_, record| record.attempts.iter().any(|t| *t > window_start));
    }

    /// Number of live records, for diagnostics.
    pub async fn record_count(&self) -> usize {
        self.records.read().await.len()
    }

    /// Spawn the recurring purge task. Runs until the shutdown channel
    /// fires.
    pub fn spawn_purger(
        limiter: Arc<Self>,
        tick: StdDuration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = interval.tick() => limiter.purge_expired().await,
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(RateLimitConfig::default())
    }
}

// =============================================================================
// TESTS
// =============================================================================
