//! # Record
//!
//! The payload stored under each id in SkipDB: a short name and a
//! floating-point value. Names are capped so that every record fits the
//! fixed-size slot of the snapshot format.

use std::fmt;

/// Capacity of the name field in bytes, including the NUL terminator
/// reserved by the snapshot format.
pub const MAX_NAME_LEN: usize = 64;

/// A single database row.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: i32,
    name: String,
    pub value: f64,
}

impl Record {
    /// Builds a record, truncating `name` to at most `MAX_NAME_LEN - 1` bytes.
    pub fn new(id: i32, name: &str, value: f64) -> Self {
        Self {
            id,
            name: truncate_name(name).to_string(),
            value,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Replaces the name, applying the same truncation as [`Record::new`].
    pub fn set_name(&mut self, name: &str) {
        self.name = truncate_name(name).to_string();
    }
}

/// Longest prefix of `name` that fits in `MAX_NAME_LEN - 1` bytes without
/// splitting a UTF-8 character.
pub fn truncate_name(name: &str) -> &str {
    let limit = MAX_NAME_LEN - 1;
    if name.len() <= limit {
        return name;
    }
    let mut end = limit;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  ID   : {}", self.id)?;
        writeln!(f, "  Name : {}", self.name)?;
        write!(f, "  Value: {:.2}", self.value)
    }
}
