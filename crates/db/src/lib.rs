//! # DB - SkipDB Record Store
//!
//! Ties the [`skiplist`] index, the [`record`] payload and the [`snapshot`]
//! file format into a small record database.
//!
//! ## Architecture
//!
//! ```text
//! Client (cli)
//!   |
//!   v
//! ┌──────────────────────────────────────────────┐
//! │                  DATABASE                    │
//! │                                              │
//! │ write.rs → add / del / update / bulk_add     │
//! │              |                               │
//! │              v                               │
//! │        SkipList<Record>  (in memory)         │
//! │              ^                               │
//! │              |                               │
//! │ read.rs  → get / iter / stats / levels       │
//! │                                              │
//! │ persist.rs  → save: walk level 0 → snapshot  │
//! │ recovery.rs → load: snapshot → re-insert     │
//! └──────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                              |
//! |----------------|------------------------------------------------------|
//! | [`lib.rs`]     | `Database` struct, constructor, accessors, `Debug`   |
//! | [`recovery`]   | Snapshot replay into a fresh index, bad-record skips |
//! | [`persist`]    | `save()`, `save_to()`, `load_from()`                 |
//! | [`write`]      | `add()`, `del()`, `update()`, `bulk_add()`           |
//! | [`read`]       | `get()`, `iter()`, `stats()`, `levels()`             |
//!
//! Nothing is durable until [`Database::save`] runs; the shell saves on exit
//! when autosave is enabled.
mod persist;
mod read;
mod recovery;
mod write;

use anyhow::{Context, Result};
use config::Config;
use rand::rngs::SmallRng;
use rand::SeedableRng;
use record::Record;
use skiplist::SkipList;
use std::path::{Path, PathBuf};
use tracing::info;

pub use read::Stats;
pub use recovery::{load_snapshot_into, LoadReport};

/// The record store: an ordered index of [`Record`]s keyed by id.
pub struct Database {
    pub(crate) index: SkipList<Record>,
    /// Default target for `save()` and the file read at startup.
    pub(crate) snapshot_path: PathBuf,
    /// Seed for the index's level draws; reused when the index is rebuilt.
    pub(crate) seed: Option<u64>,
    /// Source of ids and values for `bulk_add`.
    pub(crate) rng: SmallRng,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("snapshot_path", &self.snapshot_path)
            .field("records", &self.index.len())
            .field("top_level", &self.index.top_level())
            .field("seed", &self.seed)
            .finish()
    }
}

impl Database {
    /// Opens the database described by `config`.
    ///
    /// # Recovery Steps
    ///
    /// 1. Allocate an empty index (fatal if this fails).
    /// 2. If the snapshot file exists, replay it into the index. Records
    ///    with duplicate or negative ids are logged and skipped.
    /// 3. A missing snapshot file yields an empty database.
    ///
    /// # Errors
    ///
    /// Returns an error if the index cannot be allocated or the snapshot
    /// exists but cannot be read.
    pub fn open(config: &Config) -> Result<Self> {
        let mut index = new_index(config.seed)?;
        let report = load_snapshot_into(&config.snapshot_path, &mut index)?;
        if report.found {
            info!(
                path = %config.snapshot_path.display(),
                loaded = report.loaded,
                skipped = report.skipped,
                "snapshot loaded"
            );
        } else {
            info!(path = %config.snapshot_path.display(), "no snapshot found, starting empty");
        }

        Ok(Self {
            index,
            snapshot_path: config.snapshot_path.clone(),
            seed: config.seed,
            rng: match config.seed {
                Some(seed) => SmallRng::seed_from_u64(seed.wrapping_add(1)),
                None => SmallRng::from_entropy(),
            },
        })
    }

    /// Returns the default snapshot path.
    #[must_use]
    pub fn snapshot_path(&self) -> &Path {
        &self.snapshot_path
    }

    /// Changes the default snapshot path used by [`save`](Database::save).
    pub fn set_snapshot_path<P: Into<PathBuf>>(&mut self, path: P) {
        self.snapshot_path = path.into();
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}

/// Allocates an empty index, seeded when a seed is configured.
pub(crate) fn new_index(seed: Option<u64>) -> Result<SkipList<Record>> {
    let index = match seed {
        Some(seed) => SkipList::try_with_seed(seed),
        None => SkipList::try_new(),
    };
    index.context("could not initialize the record index")
}

#[cfg(test)]
mod tests;
