//! Server Configuration
//!
//! Everything comes from environment variables with workable defaults, so
//! a bare `noughts-server` in an empty directory is a valid deployment.

use std::net::SocketAddr;
use std::path::PathBuf;

use crate::auth::RateLimitConfig;
use crate::store::DB_FILE_NAME;

/// Runtime configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory holding the backing database file.
    pub db_dir: PathBuf,
    /// TCP port to listen on.
    pub port: u16,
    /// Throttle policy for code redemption.
    pub rate_limit: RateLimitConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            db_dir: PathBuf::from("."),
            port: 3000,
            rate_limit: RateLimitConfig::default(),
        }
    }
}

impl Config {
    /// Create config from environment variables.
    ///
    /// - `DB_DIR`: directory for `db.json` (default: working directory)
    /// - `PORT`: listen port (default: 3000; `0` is accepted and means
    ///   "pick a free port")
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            db_dir: std::env::var("DB_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.db_dir),
            port: std::env::var("PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(defaults.port),
            rate_limit: defaults.rate_limit,
        }
    }

    /// Resolved path of the backing database file.
    pub fn db_file(&self) -> PathBuf {
        self.db_dir.join(DB_FILE_NAME)
    }

    /// Address the server binds to.
    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::from(([0, 0, 0, 0], self.port))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_paths() {
        let config = Config::default();
        assert_eq!(config.db_file(), PathBuf::from("./db.json"));
        assert_eq!(config.bind_addr().port(), 3000);
    }

    #[test]
    fn db_file_honors_dir() {
        let config = Config {
            db_dir: PathBuf::from("/var/lib/noughts"),
            ..Default::default()
        };
        assert_eq!(config.db_file(), PathBuf::from("/var/lib/noughts/db.json"));
    }
}
