//! Document Store
//!
//! The persistent half of the server: one JSON file holding every user and
//! game, mutated only through an exclusive section.
//!
//! - `model`: serde record types (the on-disk and wire shapes)
//! - `persist`: the file-backed store and its locking discipline

pub mod model;
pub mod persist;

pub use model::{Database, Game, GamePlayers, GameState, Mark, ModeStats, PublicUser, User, UserStats};
pub use persist::{PersistentStore, StoreError, DB_FILE_NAME};
