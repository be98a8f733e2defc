//! Runtime configuration for embedding shells.
//!
//! # Responsibility
//! - Resolve database path and logging settings from the environment.
//!
//! # Invariants
//! - Missing variables fall back to defaults; resolution never fails.
//! - Values are trimmed; blank values count as missing.

use crate::logging::default_log_level;
use std::path::PathBuf;

/// Database file path variable.
pub const ENV_DB_PATH: &str = "LECOTES_DB_PATH";
/// Log level variable (`trace|debug|info|warn|error`).
pub const ENV_LOG_LEVEL: &str = "LECOTES_LOG_LEVEL";
/// Absolute log directory variable. File logging stays off when unset.
pub const ENV_LOG_DIR: &str = "LECOTES_LOG_DIR";

const DEFAULT_DB_FILE_NAME: &str = "lecotes.sqlite3";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoreConfig {
    pub db_path: PathBuf,
    pub log_level: String,
    pub log_dir: Option<PathBuf>,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_FILE_NAME),
            log_level: default_log_level().to_string(),
            log_dir: None,
        }
    }
}

impl CoreConfig {
    /// Reads configuration from process environment variables.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads configuration through `lookup`, e.g. a fixed map in tests.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let read = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };
        let defaults = Self::default();

        Self {
            db_path: read(ENV_DB_PATH).map_or(defaults.db_path, PathBuf::from),
            log_level: read(ENV_LOG_LEVEL).unwrap_or(defaults.log_level),
            log_dir: read(ENV_LOG_DIR).map(PathBuf::from),
        }
    }
}
