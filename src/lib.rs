//! # Noughts Server
//!
//! Backend for a small multiplayer noughts-and-crosses game: a file-backed
//! document store for users and games, one-time 4-digit login codes for
//! second-device sign-in, and a rate limiter in front of code redemption.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      NOUGHTS SERVER                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │  store/            - Persistent state                       │
//! │  ├── model.rs      - User/Game record types (wire shapes)   │
//! │  └── persist.rs    - Exclusive-section load/mutate/save     │
//! │                                                             │
//! │  auth/             - Volatile state                         │
//! │  ├── codes.rs      - One-time login codes + expiry sweep    │
//! │  └── rate_limit.rs - Redemption throttling + purge          │
//! │                                                             │
//! │  api/              - HTTP surface (thin glue)               │
//! │  ├── games.rs      - Game CRUD                              │
//! │  ├── users.rs      - Registration, lookup, code issuance    │
//! │  ├── login.rs      - Code redemption                        │
//! │  └── meta.rs       - Client-facing metadata                 │
//! │                                                             │
//! │  server.rs         - Listener, background tasks, shutdown   │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Concurrency model
//!
//! Single process. The store runs every load/mutate/save cycle inside one
//! exclusive section, so concurrent writers suspend rather than interleave.
//! The code table and the limiter table are each owned by one component
//! and mutated only under that component's write lock, whether the caller
//! is a request handler or a background task. The subsystems never wait on
//! each other.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod api;
pub mod auth;
pub mod config;
pub mod server;
pub mod state;
pub mod store;

// Re-export commonly used types
pub use auth::{IssuedCode, LoginCodeRegistry, RateDecision, RateLimitConfig, RateLimiter};
pub use config::Config;
pub use server::Server;
pub use state::AppState;
pub use store::{Database, Game, PersistentStore, StoreError, User};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
