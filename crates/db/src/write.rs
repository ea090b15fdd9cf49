/// Write path: `add()`, `del()`, `update()` and `bulk_add()`.
///
/// Validation happens here before the index is touched; the index repeats
/// the non-negative id check on its own.
use anyhow::{bail, Result};
use rand::Rng;
use record::Record;
use tracing::debug;

use crate::Database;

/// Progress is logged every this many bulk inserts.
const BULK_PROGRESS_EVERY: usize = 10_000;

impl Database {
    /// Adds a new record (the `add` command).
    ///
    /// # Errors
    ///
    /// Fails if `id` is negative or already present. The database is
    /// unchanged in either case.
    pub fn add(&mut self, id: i32, name: &str, value: f64) -> Result<()> {
        anyhow::ensure!(id >= 0, "id must be non-negative (got {})", id);

        if let Err(e) = self.index.insert(id, Record::new(id, name, value)) {
            bail!("failed to add record: {}", e);
        }
        Ok(())
    }

    /// Deletes a record (the `del` command). Returns whether it existed.
    pub fn del(&mut self, id: i32) -> bool {
        self.index.delete(id)
    }

    /// Replaces the name and value of an existing record (the `update` command).
    ///
    /// The id, and therefore the record's place in the index, never changes.
    pub fn update(&mut self, id: i32, name: &str, value: f64) -> Result<()> {
        match self.index.replace(id, Record::new(id, name, value)) {
            Ok(_old) => Ok(()),
            Err(_) => bail!("record {} not found", id),
        }
    }

    /// Adds `count` generated records (the `bulkadd` command).
    ///
    /// Ids are probed upward from a random starting point until a free one is
    /// found, so dense id ranges make this slow. Names are `RandomName_<id>`
    /// and values are drawn uniformly from `0.00..1000.00`.
    ///
    /// Returns the number of records added.
    pub fn bulk_add(&mut self, count: usize) -> Result<usize> {
        anyhow::ensure!(count > 0, "count must be positive");

        let len = self.index.len() as u64;
        let mut next_id: i32 = if len > 0 {
            let span = (len * 5).min(i32::MAX as u64) as i32;
            self.rng.gen_range(0..span)
        } else {
            0
        };

        let mut added = 0usize;
        while added < count {
            while self.index.contains_key(next_id) {
                next_id = advance(next_id)?;
            }

            let value = self.rng.gen_range(0..100_000) as f64 / 100.0;
            let rec = Record::new(next_id, &format!("RandomName_{}", next_id), value);
            if self.index.insert(next_id, rec).is_ok() {
                added += 1;
                if added % BULK_PROGRESS_EVERY == 0 {
                    debug!(added, "bulk add progress");
                }
            }

            if added < count {
                next_id = advance(next_id)?;
            }
        }

        Ok(added)
    }
}

fn advance(id: i32) -> Result<i32> {
    match id.checked_add(1) {
        Some(next) => Ok(next),
        None => bail!("ran out of ids above {}", id),
    }
}
