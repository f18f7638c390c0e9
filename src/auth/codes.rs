//! Login Code Registry
//!
//! In-memory one-time 4-digit codes that let a second device authenticate
//! as an existing user without a password. Nothing here touches disk; a
//! restart forgets every outstanding code, which is fine at a 15-second
//! lifetime.
//!
//! Per digit string the lifecycle is a strict three-state machine:
//!
//! ```text
//! absent ──issue──► Valid ──redeem / expiry──► Reserved ──cool-down──► absent
//! ```
//!
//! `Valid` never goes straight back to absent. The `Reserved` cool-down
//! keeps a just-consumed (or just-lapsed) digit string out of circulation
//! so a delayed duplicate request cannot redeem a code that was meanwhile
//! reissued to someone else, and so an observer cannot tell "was used"
//! from "timed out" by how quickly the string frees up.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tokio::sync::{broadcast, RwLock};
use tokio::task::JoinHandle;
use tracing::debug;

/// Default lifetime of a freshly issued code.
pub const CODE_VALIDITY_MS: i64 = 15 * 1000;

/// Cool-down during which a consumed or expired digit string cannot be
/// reissued.
pub const RESERVE_WINDOW_MS: i64 = 5 * 1000;

/// How often the background sweep visits the table.
pub const SWEEP_INTERVAL: StdDuration = StdDuration::from_millis(500);

// =============================================================================
// TABLE ENTRIES
// =============================================================================

/// One table entry, keyed by its 4-digit string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CodeEntry {
    /// Redeemable, bound to exactly one user.
    Valid {
        /// The user this code authenticates as.
        user_id: String,
        /// Instant after which the code can no longer be redeemed.
        expires_at: DateTime<Utc>,
    },
    /// Not redeemable; exists only to keep the digit string out of
    /// circulation until the cool-down elapses.
    Reserved {
        /// Instant after which the digit string becomes reissuable.
        expires_at: DateTime<Utc>,
    },
}

/// Everything the caller needs to hand a fresh code to a client.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssuedCode {
    /// The 4-digit code, left-padded with zeros.
    pub code: String,
    /// When the code was minted.
    pub issued_at: DateTime<Utc>,
    /// When the code stops being redeemable.
    pub expires_at: DateTime<Utc>,
}

// =============================================================================
// DENYLIST
// =============================================================================

/// Cosmetic filter for candidate codes. Rejects the literal substring
/// `"666"`, four consecutive ascending digits (`0123` … `6789`), four
/// consecutive descending digits (`9876` … `3210`), and four identical
/// digits. These are superstition/typo filters, not security filters, and
/// the rule set is fixed for client compatibility.
pub fn is_denylisted(code: &str) -> bool {
    let digits = code.as_bytes();
    debug_assert_eq!(digits.len(), 4);

    if code.contains("666") {
        return true;
    }
    let ascending = digits.windows(2).all(|w| w[1] == w[0] + 1);
    let descending = digits.windows(2).all(|w| w[0] == w[1] + 1);
    let identical = digits.windows(2).all(|w| w[0] == w[1]);
    ascending || descending || identical
}

// =============================================================================
// REGISTRY
// =============================================================================

/// Owner of the code table. All access goes through [`issue`], [`redeem`]
/// and the background [`sweep`]; each takes the table write lock for its
/// whole read-decide-write sequence, so there is at most one writer per
/// entry at any instant.
///
/// [`issue`]: LoginCodeRegistry::issue
/// [`redeem`]: LoginCodeRegistry::redeem
/// [`sweep`]: LoginCodeRegistry::sweep
pub struct LoginCodeRegistry {
    /// Cool-down applied when a code is consumed or lapses.
    reserve_window: Duration,
    /// Outstanding codes by digit string.
    codes: RwLock<BTreeMap<String, CodeEntry>>,
}

impl LoginCodeRegistry {
    /// Create a registry with the default reservation window.
    pub fn new() -> Self {
        Self::with_reserve_window(Duration::milliseconds(RESERVE_WINDOW_MS))
    }

    /// Create a registry with a custom reservation window.
    pub fn with_reserve_window(reserve_window: Duration) -> Self {
        Self {
            reserve_window,
            codes: RwLock::new(BTreeMap::new()),
        }
    }

    /// Mint a code bound to `user_id`, valid for `validity` from now.
    pub async fn issue(&self, user_id: &str, validity: Duration) -> IssuedCode {
        self.issue_at(Utc::now(), user_id, validity).await
    }

    /// Redeem a code. Returns the bound user id exactly once per issued
    /// code; an unknown, reserved or expired code yields `None`.
    pub async fn redeem(&self, code: &str) -> Option<String> {
        self.redeem_at(Utc::now(), code).await
    }

    /// One expiry pass over the whole table.
    pub async fn sweep(&self) {
        self.sweep_at(Utc::now()).await;
    }

    /// Number of outstanding entries (Valid and Reserved).
    pub async fn outstanding(&self) -> usize {
        self.codes.read().await.len()
    }

    /// Clock-injected issue. Draws uniformly from `0001..=9999` and redraws
    /// while the candidate is denylisted or already present in the table in
    /// any state, so outstanding digit strings are globally unique. The
    /// retry loop is unbounded by contract; the address space (~10 000
    /// strings minus ~1 100 denylisted) makes termination a non-issue at
    /// any realistic table size.
    pub async fn issue_at(
        &self,
        now: DateTime<Utc>,
        user_id: &str,
        validity: Duration,
    ) -> IssuedCode {
        let mut codes = self.codes.write().await;

        let code = loop {
            let candidate = format!("{:04}", rand::thread_rng().gen_range(1..=9999));
            if is_denylisted(&candidate) || codes.contains_key(&candidate) {
                continue;
            }
            break candidate;
        };

        let expires_at = now + validity;
        codes.insert(
            code.clone(),
            CodeEntry::Valid {
                user_id: user_id.to_string(),
                expires_at,
            },
        );

        IssuedCode {
            code,
            issued_at: now,
            expires_at,
        }
    }

    /// Clock-injected redeem. Checks expiry itself rather than trusting
    /// sweep timing: a lapsed `Valid` entry is moved to `Reserved` and
    /// treated as a miss, exactly as the sweep would have done.
    pub async fn redeem_at(&self, now: DateTime<Utc>, code: &str) -> Option<String> {
        let mut codes = self.codes.write().await;

        let user_id = match codes.get(code) {
            Some(CodeEntry::Valid { user_id, expires_at }) => {
                if now > *expires_at {
                    None
                } else {
                    Some(user_id.clone())
                }
            }
            Some(CodeEntry::Reserved { .. }) | None => return None,
        };

        // Consumed and lapsed codes get the same cool-down treatment.
        codes.insert(
            code.to_string(),
            CodeEntry::Reserved {
                expires_at: now + self.reserve_window,
            },
        );

        user_id
    }

    /// Clock-injected sweep: lapsed `Valid` entries become `Reserved` with
    /// a fresh cool-down, lapsed `Reserved` entries are removed and their
    /// digit strings become reissuable.
    pub async fn sweep_at(&self, now: DateTime<Utc>) {
        let mut codes = self.codes.write().await;

        let mut to_reserve = Vec::new();
        let mut to_remove = Vec::new();
        for (code, entry) in codes.iter() {
            match entry {
                CodeEntry::Valid { expires_at, .. } if now > *expires_at => {
                    to_reserve.push(code.clone());
                }
                CodeEntry::Reserved { expires_at } if now > *expires_at => {
                    to_remove.push(code.clone());
                }
                _ => {}
            }
        }

        if !to_reserve.is_empty() || !to_remove.is_empty() {
            debug!(
                expired = to_reserve.len(),
                released = to_remove.len(),
                "login code sweep"
            );
        }

        let reserve_until = now + self.reserve_window;
        for code in to_reserve {
            codes.insert(code, CodeEntry::Reserved { expires_at: reserve_until });
        }
        for code in to_remove {
            codes.remove(&code);
        }
    }

    /// Spawn the recurring sweep task. Runs until the shutdown channel
    /// fires; independent of any request's lifetime.
    pub fn spawn_sweeper(
        registry: Arc<Self>,
        tick: StdDuration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(tick);
            loop {
                tokio::select! {
                    _ = interval.tick() => registry.sweep().await,
                    _ = shutdown.recv() => break,
                }
            }
        })
    }
}

impl Default for LoginCodeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// TESTS
// =============================================================================
