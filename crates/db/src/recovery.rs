/// Snapshot replay: rebuilding an index from a snapshot file.
///
/// Every record in the file is re-inserted in file order. A record the index
/// refuses (duplicate id from a corrupt file, negative id) is logged and
/// skipped; the rest of the load continues.
use anyhow::Result;
use record::Record;
use skiplist::SkipList;
use snapshot::{ReplayStats, SnapshotError, SnapshotReader};
use std::path::Path;
use tracing::{debug, warn};

/// Summary of one snapshot load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadReport {
    /// The snapshot file existed.
    pub found: bool,
    /// Records inserted into the index.
    pub loaded: usize,
    /// Records the index rejected.
    pub skipped: usize,
    /// Raw reader statistics.
    pub replay: ReplayStats,
}

/// Replays the snapshot at `path` into `index`.
///
/// If the file does not exist, returns a report with `found = false`
/// (fresh start) and leaves `index` untouched.
///
/// # Errors
///
/// Propagates I/O errors and a corrupt header from [`SnapshotReader::replay`].
pub fn load_snapshot_into<P: AsRef<Path>>(path: P, index: &mut SkipList<Record>) -> Result<LoadReport> {
    let path = path.as_ref();
    let mut reader = match SnapshotReader::open(path) {
        Ok(reader) => reader,
        Err(SnapshotError::Io(ref e)) if e.kind() == std::io::ErrorKind::NotFound => {
            return Ok(LoadReport::default());
        }
        Err(e) => {
            return Err(anyhow::anyhow!(e).context(format!(
                "failed to open snapshot {}",
                path.display()
            )))
        }
    };

    let mut loaded = 0usize;
    let mut skipped = 0usize;
    let replay = reader
        .replay(|rec| match index.insert(rec.id, rec) {
            Ok(()) => loaded += 1,
            Err(e) => {
                warn!(id = e.key(), error = %e, "skipping snapshot record");
                skipped += 1;
            }
        })
        .map_err(|e| anyhow::anyhow!(e).context(format!("failed to read snapshot {}", path.display())))?;

    if !replay.is_consistent() {
        warn!(
            path = %path.display(),
            declared = replay.declared,
            read = replay.read,
            truncated_tail = replay.truncated_tail,
            "snapshot record count mismatch"
        );
    }
    debug!(path = %path.display(), loaded, skipped, "snapshot replay finished");

    Ok(LoadReport {
        found: true,
        loaded,
        skipped,
        replay,
    })
}
