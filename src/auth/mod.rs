//! Second-Device Authentication
//!
//! The volatile half of the server: short-lived login codes and the
//! throttle in front of their redemption. Nothing in this module touches
//! the document store.
//!
//! - `codes`: one-time 4-digit login codes with expiry and reservation
//! - `rate_limit`: per-caller attempt throttling

pub mod codes;
pub mod rate_limit;

pub use codes::{
    is_denylisted, CodeEntry, IssuedCode, LoginCodeRegistry, CODE_VALIDITY_MS, RESERVE_WINDOW_MS,
    SWEEP_INTERVAL,
};
pub use rate_limit::{RateDecision, RateLimitConfig, RateLimiter, PURGE_INTERVAL};
