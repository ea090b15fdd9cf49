//! # Config - SkipDB settings
//!
//! All settings come from environment variables, falling back to defaults
//! when a variable is missing or does not parse:
//!
//! ```text
//! SKIPDB_SNAPSHOT  snapshot file path             (default: "crud_database.bin")
//! SKIPDB_AUTOSAVE  save the snapshot on exit      (default: "true")
//! SKIPDB_SEED      fixed seed for level draws     (default: unset = entropy)
//! ```

use std::path::PathBuf;

pub const ENV_SNAPSHOT: &str = "SKIPDB_SNAPSHOT";
pub const ENV_AUTOSAVE: &str = "SKIPDB_AUTOSAVE";
pub const ENV_SEED: &str = "SKIPDB_SEED";

/// Default snapshot file, relative to the working directory.
pub const DEFAULT_SNAPSHOT_PATH: &str = "crud_database.bin";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Snapshot loaded at startup and used by `save`/`load` without a path.
    pub snapshot_path: PathBuf,
    /// Write the snapshot back when the shell exits.
    pub autosave: bool,
    /// Seed for the index's level generator. `None` seeds from entropy.
    pub seed: Option<u64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            snapshot_path: PathBuf::from(DEFAULT_SNAPSHOT_PATH),
            autosave: true,
            seed: None,
        }
    }
}

impl Config {
    /// Reads the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds a config from an arbitrary key lookup (used by tests).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let env_or = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let snapshot_path = PathBuf::from(env_or(ENV_SNAPSHOT, DEFAULT_SNAPSHOT_PATH));
        let autosave = env_or(ENV_AUTOSAVE, "true")
            .parse()
            .unwrap_or(defaults.autosave);
        let seed = lookup(ENV_SEED).and_then(|s| s.trim().parse().ok());

        Self {
            snapshot_path,
            autosave,
            seed,
        }
    }

    pub fn with_snapshot_path<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.snapshot_path = path.into();
        self
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}
