use crate::Database;
use config::Config;
use std::path::Path;

/// Opens a seeded database whose snapshot lives in `dir`.
pub fn open_in(dir: &Path) -> Database {
    Database::open(&config_in(dir)).unwrap()
}

pub fn config_in(dir: &Path) -> Config {
    Config::default()
        .with_snapshot_path(dir.join("db.bin"))
        .with_seed(7)
}

pub fn ids(db: &Database) -> Vec<i32> {
    db.iter().map(|r| r.id).collect()
}
