//! File-Backed Persistence
//!
//! The whole document store lives in one JSON file, loaded and rewritten in
//! full. Every mutation goes through [`PersistentStore::with_store`], which
//! runs the load/mutate/save cycle inside a process-wide exclusive section
//! so two writers can never interleave.

use std::path::{Path, PathBuf};

use tokio::sync::Mutex;
use tracing::{debug, warn};

use crate::store::model::Database;

/// Name of the backing file inside the configured data directory.
pub const DB_FILE_NAME: &str = "db.json";

/// Persistence errors.
///
/// Failed reads are deliberately not represented: an absent or unparsable
/// backing file loads as an empty store ("first run"), never as an error.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The document could not be serialized.
    #[error("failed to serialize database: {0}")]
    Serialize(#[from] serde_json::Error),

    /// The backing file could not be written.
    #[error("failed to write database file: {0}")]
    Write(#[from] std::io::Error),
}

/// File-backed document store guarded by an exclusive section.
///
/// Reads that only need a single consistent snapshot may call [`load`]
/// directly; anything that writes, or that decides based on what it will
/// write (nickname uniqueness, id uniqueness), must go through
/// [`with_store`].
///
/// [`load`]: PersistentStore::load
/// [`with_store`]: PersistentStore::with_store
pub struct PersistentStore {
    /// Path of the backing JSON file.
    path: PathBuf,
    /// Serializes every load/mutate/save cycle. Waiters suspend.
    write_lock: Mutex<()>,
}

impl PersistentStore {
    /// Create a store backed by the given file path. The file is not
    /// touched until the first load or save.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            write_lock: Mutex::new(()),
        }
    }

    /// Create a store backed by `db.json` inside `dir`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(DB_FILE_NAME))
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and deserialize the backing file.
    ///
    /// An absent file is a first run and a corrupt file is treated the same
    /// way: both yield an empty [`Database`]. Callers must not assume a
    /// non-empty store.
    pub async fn load(&self) -> Database {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(err) => {
                debug!(path = %self.path.display(), %err, "no readable database file, starting empty");
                return Database::default();
            }
        };

        match serde_json::from_slice(&bytes) {
            Ok(db) => db,
            Err(err) => {
                warn!(path = %self.path.display(), %err, "database file unparsable, starting empty");
                Database::default()
            }
        }
    }

    /// Serialize `db` and overwrite the backing file, holding the
    /// exclusive section for the duration of the write.
    pub async fn save(&self, db: &Database) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;
        self.save_unlocked(db).await
    }

    /// Run `mutator` with exclusive access to the current document and
    /// persist the result in full.
    ///
    /// This is the only sanctioned way to mutate the store. At most one
    /// `with_store` body executes at a time; a second caller suspends until
    /// the first has saved. A write failure propagates to the caller and
    /// the attempted in-memory mutation is discarded — the file keeps its
    /// last successfully written contents. A panicking mutator skips the
    /// save for the same reason.
    pub async fn with_store<T>(
        &self,
        mutator: impl FnOnce(&mut Database) -> T,
    ) -> Result<T, StoreError> {
        let _guard = self.write_lock.lock().await;
        let mut db = self.load().await;
        let result = mutator(&mut db);
        self.save_unlocked(&db).await?;
        Ok(result)
    }

    /// Rewrite the backing file in the current schema.
    ///
    /// Records written by older builds gain their defaulted fields (for
    /// example `friends`) when loaded; one load/save round-trip at startup
    /// makes that permanent.
    pub async fn normalize(&self) -> Result<(), StoreError> {
        self.with_store(|_| ()).await
    }

    /// Write without taking the lock. Only callable from inside an
    /// already-held exclusive section.
    async fn save_unlocked(&self, db: &Database) -> Result<(), StoreError> {
        let bytes = serde_json::to_vec(db)?;
        tokio::fs::write(&self.path, bytes).await?;
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
