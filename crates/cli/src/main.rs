//! # CLI - SkipDB Interactive Shell
//!
//! A REPL-style command-line interface for the SkipDB record store.
//! Reads commands from stdin, executes them against the database, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin). Logs go to stderr.
//!
//! ## Commands
//!
//! ```text
//! add <id> <name> <value>     Add a new record
//! get <id>                    Retrieve a record by id
//! del <id>                    Delete a record by id
//! update <id> <name> <value>  Replace a record's name and value
//! save [file]                 Save the database
//! load [file]                 Replace the database from a snapshot (asks y/N)
//! list                        Display skip list levels
//! stats                       Show record count and top level
//! bulkadd <count>             Add N generated records
//! help                        Show help
//! quit | exit                 Exit
//! ```
//!
//! ## Configuration
//!
//! ```text
//! SKIPDB_SNAPSHOT  snapshot file path         (default: "crud_database.bin")
//! SKIPDB_AUTOSAVE  save on exit               (default: "true")
//! SKIPDB_SEED      fixed seed for level draws (default: unset)
//! RUST_LOG         log filter                 (default: "warn")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! SkipDB started (records=0, snapshot=crud_database.bin, autosave=true)
//! > add 1 Alice 10.5
//! OK record 1 added (0.000002 s)
//! > get 1
//! Record found (0.000001 s):
//!   ID   : 1
//!   Name : Alice
//!   Value: 10.50
//! > quit
//! Saved 1 records to crud_database.bin
//! bye
//! ```

mod shell;

use anyhow::{Context, Result};
use config::Config;
use db::Database;
use shell::Shell;
use std::io;
use tracing_subscriber::EnvFilter;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    let config = Config::from_env();
    let db = Database::open(&config).context("fatal: could not initialize database")?;

    println!(
        "SkipDB started (records={}, snapshot={}, autosave={})",
        db.len(),
        config.snapshot_path.display(),
        config.autosave
    );
    println!("Type 'help' for commands.");

    let stdin = io::stdin();
    let stdout = io::stdout();
    let mut shell = Shell::new(db, config, stdout.lock());
    shell.run(stdin.lock())
}
