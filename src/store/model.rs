//! Document Store Records
//!
//! Serde types for the single JSON document the server persists.
//! Field names follow the wire format the game clients already speak
//! (camelCase, `"X"`/`"O"` player keys, `[position, mark]` move tuples).

use serde::{Serialize, Deserialize};

// =============================================================================
// DATABASE AGGREGATE
// =============================================================================

/// The whole document store: every user and every game, loaded and
/// rewritten as one unit.
///
/// Both collections default to empty so a missing or partial document
/// loads cleanly (first run, or a record written by an older build).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Database {
    /// Registered users, unique by `id` and by `nickname`.
    #[serde(default)]
    pub users: Vec<User>,
    /// Finished and in-progress games, unique by `id`.
    #[serde(default)]
    pub games: Vec<Game>,
}

impl Database {
    /// Look up a user by id.
    pub fn user_by_id(&self, id: &str) -> Option<&User> {
        self.users.iter().find(|u| u.id == id)
    }

    /// Whether a nickname is already registered.
    pub fn nickname_taken(&self, nickname: &str) -> bool {
        self.users.iter().any(|u| u.nickname == nickname)
    }

    /// Look up a game by id.
    pub fn game_by_id(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|g| g.id == id)
    }

    /// Mutable game lookup, for in-place replacement.
    pub fn game_by_id_mut(&mut self, id: &str) -> Option<&mut Game> {
        self.games.iter_mut().find(|g| g.id == id)
    }
}

// =============================================================================
// USERS
// =============================================================================

/// A registered player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Opaque unique identifier (UUID string).
    pub id: String,
    /// Human-chosen display name, unique across the store.
    pub nickname: String,
    /// Capability token proving ownership of this account. Returned once
    /// at registration and on code login; redacted everywhere else.
    pub secret: String,
    /// Win/loss counters per play mode.
    pub stats: UserStats,
    /// Ids of befriended users. Absent on records written before the
    /// friends feature shipped; loads as empty.
    #[serde(default)]
    pub friends: Vec<String>,
}

impl User {
    /// Projection safe to show to anyone: everything except `secret`.
    pub fn public(&self) -> PublicUser {
        PublicUser {
            id: self.id.clone(),
            nickname: self.nickname.clone(),
            stats: self.stats.clone(),
            friends: self.friends.clone(),
        }
    }
}

/// Per-mode counters, grouped by where the game was played.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    /// Pass-the-device games.
    pub local: ModeStats,
    /// Networked games.
    pub online: ModeStats,
}

/// Won/total counters for one mode.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeStats {
    /// Games played.
    pub total: u32,
    /// Games won.
    pub won: u32,
}

/// A user as exposed in list/read responses. Identical to [`User`] minus
/// the `secret` field, so redaction cannot be forgotten at a call site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicUser {
    /// Opaque unique identifier.
    pub id: String,
    /// Display name.
    pub nickname: String,
    /// Win/loss counters per play mode.
    pub stats: UserStats,
    /// Ids of befriended users.
    #[serde(default)]
    pub friends: Vec<String>,
}

// =============================================================================
// GAMES
// =============================================================================

/// One noughts-and-crosses game record. The core transports this opaquely;
/// clients own the rules.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Game {
    /// Opaque unique identifier.
    pub id: String,
    /// Current phase.
    pub state: GameState,
    /// Moves played so far, in order, as `[position, mark]` tuples.
    pub moves: Vec<(u8, Mark)>,
    /// ISO timestamp of the first move, as the client reported it.
    pub start_time: String,
    /// Index of the winning line, if the game is decided.
    #[serde(default)]
    pub win_idx: Option<u32>,
    /// The two participants.
    pub players: GamePlayers,
}

/// Game phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum GameState {
    /// X to move.
    MovingX,
    /// O to move.
    MovingO,
    /// X won.
    WinX,
    /// O won.
    WinO,
    /// Board full, nobody won.
    Draw,
}

/// Which mark a move placed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mark {
    /// Crosses.
    X,
    /// Noughts.
    O,
}

/// User ids of the two participants, keyed by mark.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GamePlayers {
    /// The user playing crosses.
    #[serde(rename = "X")]
    pub x: String,
    /// The user playing noughts.
    #[serde(rename = "O")]
    pub o: String,
}

// =============================================================================
// TESTS
// =============================================================================
