//! Command interpreter: parses one line at a time and runs it against the
//! [`Database`], writing human-readable results to any `Write` sink.

use anyhow::Result;
use config::Config;
use db::Database;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Instant;
use tracing::{debug, error};

pub const HELP: &str = "\
Commands:
  add <id> <name> <value>     Add a new record
  get <id>                    Retrieve a record by id
  del <id>                    Delete a record by id
  update <id> <name> <value>  Replace a record's name and value
  save [file]                 Save the database (default: snapshot path)
  load [file]                 Replace the database from a snapshot
  list                        Display skip list levels
  stats                       Show record count and top level
  bulkadd <count>             Add N generated records
  help                        Show this help
  quit | exit                 Exit (saves first when autosave is on)";

/// What the loop should do after a command.
#[derive(Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

pub struct Shell<W: Write> {
    db: Database,
    config: Config,
    out: W,
}

impl<W: Write> Shell<W> {
    pub fn new(db: Database, config: Config, out: W) -> Self {
        Self { db, config, out }
    }

    /// Hands back the database and the output sink.
    pub fn into_parts(self) -> (Database, W) {
        (self.db, self.out)
    }

    /// Runs commands from `input` until `quit` or end of input, then shuts down.
    pub fn run<R: BufRead>(&mut self, input: R) -> Result<()> {
        let mut lines = input.lines();
        self.prompt()?;
        while let Some(line) = lines.next() {
            let line = line?;
            if self.execute(&line, &mut lines)? == Flow::Quit {
                break;
            }
            self.prompt()?;
        }
        self.shutdown()
    }

    /// Executes a single command line.
    ///
    /// `rest` supplies follow-up input (the `load` confirmation).
    pub fn execute<I>(&mut self, line: &str, rest: &mut I) -> Result<Flow>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        let mut parts = line.split_whitespace();
        let cmd = match parts.next() {
            Some(cmd) => cmd.to_lowercase(),
            None => return Ok(Flow::Continue),
        };
        let args: Vec<&str> = parts.collect();
        debug!(command = %cmd, args = ?args, "executing");

        match cmd.as_str() {
            "add" => self.cmd_add(&args)?,
            "get" => self.cmd_get(&args)?,
            "del" => self.cmd_del(&args)?,
            "update" => self.cmd_update(&args)?,
            "save" => self.cmd_save(&args)?,
            "load" => self.cmd_load(&args, rest)?,
            "list" => write!(self.out, "{}", self.db.levels())?,
            "stats" => {
                let stats = self.db.stats();
                writeln!(self.out, "Record Count: {}", stats.records)?;
                writeln!(self.out, "Current Max Level: {} (0-based)", stats.top_level)?;
            }
            "bulkadd" => self.cmd_bulkadd(&args)?,
            "help" => writeln!(self.out, "{}", HELP)?,
            "quit" | "exit" => return Ok(Flow::Quit),
            other => writeln!(
                self.out,
                "unknown command: '{}'. Type 'help' for commands.",
                other
            )?,
        }
        Ok(Flow::Continue)
    }

    fn prompt(&mut self) -> io::Result<()> {
        write!(self.out, "> ")?;
        self.out.flush()
    }

    fn shutdown(&mut self) -> Result<()> {
        if self.config.autosave {
            match self.db.save() {
                Ok(n) => writeln!(
                    self.out,
                    "Saved {} records to {}",
                    n,
                    self.db.snapshot_path().display()
                )?,
                Err(e) => {
                    error!(error = %format!("{:#}", e), "autosave failed");
                    writeln!(self.out, "ERR autosave failed: {:#}", e)?;
                }
            }
        }
        writeln!(self.out, "bye")?;
        self.out.flush()?;
        Ok(())
    }

    fn cmd_add(&mut self, args: &[&str]) -> Result<()> {
        let Some((id, name, value)) = parse_record_args(args) else {
            writeln!(self.out, "usage: add <id> <name> <value>")?;
            return Ok(());
        };
        let start = Instant::now();
        let res = self.db.add(id, name, value);
        let secs = start.elapsed().as_secs_f64();
        match res {
            Ok(()) => writeln!(self.out, "OK record {} added ({:.6} s)", id, secs)?,
            Err(e) => writeln!(self.out, "ERR {} ({:.6} s)", e, secs)?,
        }
        Ok(())
    }

    fn cmd_get(&mut self, args: &[&str]) -> Result<()> {
        let Some(id) = parse_single::<i32>(args) else {
            writeln!(self.out, "usage: get <id>")?;
            return Ok(());
        };
        let start = Instant::now();
        let found = self.db.get(id);
        let secs = start.elapsed().as_secs_f64();
        match found {
            Some(rec) => writeln!(self.out, "Record found ({:.6} s):\n{}", secs, rec)?,
            None => writeln!(self.out, "(nil) record {} not found ({:.6} s)", id, secs)?,
        }
        Ok(())
    }

    fn cmd_del(&mut self, args: &[&str]) -> Result<()> {
        let Some(id) = parse_single::<i32>(args) else {
            writeln!(self.out, "usage: del <id>")?;
            return Ok(());
        };
        let start = Instant::now();
        let deleted = self.db.del(id);
        let secs = start.elapsed().as_secs_f64();
        if deleted {
            writeln!(self.out, "OK record {} deleted ({:.6} s)", id, secs)?;
        } else {
            writeln!(self.out, "ERR record {} not found ({:.6} s)", id, secs)?;
        }
        Ok(())
    }

    fn cmd_update(&mut self, args: &[&str]) -> Result<()> {
        let Some((id, name, value)) = parse_record_args(args) else {
            writeln!(self.out, "usage: update <id> <name> <value>")?;
            return Ok(());
        };
        let start = Instant::now();
        let res = self.db.update(id, name, value);
        let secs = start.elapsed().as_secs_f64();
        match res {
            Ok(()) => writeln!(self.out, "OK record {} updated ({:.6} s)", id, secs)?,
            Err(e) => writeln!(self.out, "ERR {} ({:.6} s)", e, secs)?,
        }
        Ok(())
    }

    fn cmd_save(&mut self, args: &[&str]) -> Result<()> {
        let path = args
            .first()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.db.snapshot_path().to_path_buf());
        let start = Instant::now();
        let res = self.db.save_to(&path);
        let secs = start.elapsed().as_secs_f64();
        match res {
            Ok(n) => writeln!(
                self.out,
                "OK saved {} records to {} ({:.6} s)",
                n,
                path.display(),
                secs
            )?,
            Err(e) => writeln!(self.out, "ERR {:#}", e)?,
        }
        Ok(())
    }

    fn cmd_load<I>(&mut self, args: &[&str], rest: &mut I) -> Result<()>
    where
        I: Iterator<Item = io::Result<String>>,
    {
        let path = args
            .first()
            .map(PathBuf::from)
            .unwrap_or_else(|| self.db.snapshot_path().to_path_buf());

        writeln!(self.out, "Loading replaces the current in-memory database.")?;
        write!(self.out, "Proceed with load from {}? (y/N): ", path.display())?;
        self.out.flush()?;

        let answer = match rest.next() {
            Some(line) => line?,
            None => String::new(),
        };
        if !answer.trim_start().starts_with(['y', 'Y']) {
            writeln!(self.out, "\nload cancelled")?;
            return Ok(());
        }
        writeln!(self.out)?;

        let start = Instant::now();
        let res = self.db.load_from(&path);
        let secs = start.elapsed().as_secs_f64();
        match res {
            Ok(report) => writeln!(
                self.out,
                "OK loaded {} records from {} ({} skipped) ({:.6} s)",
                report.loaded,
                path.display(),
                report.skipped,
                secs
            )?,
            Err(e) => writeln!(self.out, "ERR {:#}", e)?,
        }
        Ok(())
    }

    fn cmd_bulkadd(&mut self, args: &[&str]) -> Result<()> {
        let Some(count) = parse_single::<usize>(args).filter(|&c| c > 0) else {
            writeln!(self.out, "usage: bulkadd <count> (count > 0)")?;
            return Ok(());
        };
        let start = Instant::now();
        let res = self.db.bulk_add(count);
        let secs = start.elapsed().as_secs_f64();
        match res {
            Ok(added) => {
                let rate = if secs > 0.0 { added as f64 / secs } else { 0.0 };
                writeln!(
                    self.out,
                    "OK added {} records in {:.6} s ({:.2} records/sec)",
                    added, secs, rate
                )?
            }
            Err(e) => writeln!(self.out, "ERR {}", e)?,
        }
        Ok(())
    }
}

fn parse_single<T: FromStr>(args: &[&str]) -> Option<T> {
    match args {
        [one] => one.parse().ok(),
        _ => None,
    }
}

fn parse_record_args<'a>(args: &[&'a str]) -> Option<(i32, &'a str, f64)> {
    match args {
        [id, name, value] => Some((id.parse().ok()?, *name, value.parse().ok()?)),
        _ => None,
    }
}
