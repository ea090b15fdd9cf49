/// Read path: point lookups, ordered iteration and introspection.
use record::Record;

use crate::Database;

/// Size and shape of the index (the `stats` command).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Stats {
    pub records: usize,
    /// Highest level in use, 0-based.
    pub top_level: usize,
}

impl Database {
    /// Looks up a record by id (the `get` command).
    pub fn get(&self, id: i32) -> Option<&Record> {
        self.index.get(id)
    }

    /// All records in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> + '_ {
        self.index.values()
    }

    pub fn stats(&self) -> Stats {
        Stats {
            records: self.index.len(),
            top_level: self.index.top_level(),
        }
    }

    /// Multi-line rendering of every index level (the `list` command).
    pub fn levels(&self) -> String {
        self.index.to_string()
    }
}
