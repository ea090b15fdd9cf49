/// Save and load: moving the whole database to and from snapshot files.
use anyhow::{Context, Result};
use snapshot::SnapshotWriter;
use std::path::Path;
use tracing::info;

use crate::{load_snapshot_into, new_index, Database, LoadReport};

impl Database {
    /// Writes every record to the default snapshot path.
    ///
    /// Returns the number of records written.
    pub fn save(&self) -> Result<u64> {
        let path = self.snapshot_path.clone();
        self.save_to(path)
    }

    /// Writes every record, in ascending id order, to `path`.
    ///
    /// The file is replaced atomically (temp file + rename).
    pub fn save_to<P: AsRef<Path>>(&self, path: P) -> Result<u64> {
        let path = path.as_ref();
        let written = SnapshotWriter::write_to_path(path, self.index.values())
            .with_context(|| format!("failed to save snapshot {}", path.display()))?;

        anyhow::ensure!(
            written == self.index.len() as u64,
            "snapshot wrote {} records but the index holds {}",
            written,
            self.index.len()
        );

        info!(path = %path.display(), records = written, "snapshot saved");
        Ok(written)
    }

    /// Replaces the in-memory records with the contents of `path`.
    ///
    /// The snapshot is loaded into a fresh index first; the current records
    /// are only discarded once that succeeds.
    ///
    /// # Errors
    ///
    /// Returns an error if `path` does not exist or cannot be read. The
    /// current records are kept in that case.
    pub fn load_from<P: AsRef<Path>>(&mut self, path: P) -> Result<LoadReport> {
        let path = path.as_ref();
        let mut index = new_index(self.seed)?;
        let report = load_snapshot_into(path, &mut index)?;
        anyhow::ensure!(report.found, "snapshot {} does not exist", path.display());

        self.index = index;
        info!(
            path = %path.display(),
            loaded = report.loaded,
            skipped = report.skipped,
            "database replaced from snapshot"
        );
        Ok(report)
    }
}
