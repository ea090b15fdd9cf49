//! # Snapshot - Binary Database Dump
//!
//! Persists the full contents of the index as a flat sequence of fixed-size
//! records, in ascending id order (a straight walk of level 0). Loading
//! re-inserts each record; the level structure is never stored.
//!
//! ## Binary Format
//!
//! ```text
//! [record_count: u64 LE]
//! [id: i32 LE][name: 64 bytes, NUL padded][value: f64 LE]   x record_count
//! ```
//!
//! Each record occupies exactly [`RECORD_BYTES`] (76) bytes. Names are at most
//! 63 bytes so the field always ends in at least one NUL.
//!
//! ## Example
//!
//! ```rust,no_run
//! use record::Record;
//! use snapshot::{SnapshotReader, SnapshotWriter};
//!
//! let recs = vec![Record::new(1, "Alice", 10.0)];
//! SnapshotWriter::write_to_path("db.bin", recs.iter()).unwrap();
//!
//! let mut r = SnapshotReader::open("db.bin").unwrap();
//! r.replay(|rec| println!("{}", rec.id)).unwrap();
//! ```

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use record::{truncate_name, Record, MAX_NAME_LEN};
use std::fs::{rename, File, OpenOptions};
use std::io::{self, BufReader, BufWriter, Read, Seek, SeekFrom, Write};
use std::path::Path;

use thiserror::Error;

/// Size of the leading record-count field.
pub const HEADER_BYTES: usize = 8;

/// Size of one encoded record: id + name field + value.
pub const RECORD_BYTES: usize = 4 + MAX_NAME_LEN + 8;

/// Errors that can occur while reading or writing a snapshot.
#[derive(Debug, Error)]
pub enum SnapshotError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file is too short to hold the record-count header.
    #[error("corrupt snapshot: {0}")]
    Corrupt(String),
}

/// Outcome of a [`SnapshotReader::replay`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReplayStats {
    /// Record count stored in the header.
    pub declared: u64,
    /// Records actually decoded and handed to the callback.
    pub read: u64,
    /// A partial record was found (and ignored) at the end of the file.
    pub truncated_tail: bool,
}

impl ReplayStats {
    /// True when the header count matches the number of records decoded.
    pub fn is_consistent(&self) -> bool {
        self.declared == self.read && !self.truncated_tail
    }
}

/// Writes snapshots. Stateless, like the other file writers in this workspace.
pub struct SnapshotWriter {}

impl SnapshotWriter {
    /// Writes `records` to `path` atomically and returns how many were written.
    ///
    /// Data goes to `<path>.tmp` first, is fsynced, then renamed over `path`.
    /// A crash mid-write leaves the previous snapshot intact.
    ///
    /// `records` must yield ascending ids for the file to be a faithful dump
    /// of the index, but the reader does not depend on the order.
    pub fn write_to_path<'a, P, I>(path: P, records: I) -> Result<u64, SnapshotError>
    where
        P: AsRef<Path>,
        I: IntoIterator<Item = &'a Record>,
    {
        let path = path.as_ref();
        let tmp_path = tmp_path_for(path);
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let written = match Self::write_to(&mut file, records) {
            Ok(n) => n,
            Err(e) => {
                drop(file);
                let _ = std::fs::remove_file(&tmp_path);
                return Err(e);
            }
        };

        file.flush()?;
        file.into_inner()
            .map_err(|e| SnapshotError::Io(e.into_error()))?
            .sync_all()?;

        rename(&tmp_path, path)?;

        if let Some(parent) = path.parent() {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        Ok(written)
    }

    /// Encodes `records` into any seekable sink.
    ///
    /// The count header is written as a placeholder and patched once the
    /// iterator is exhausted, so it always matches the records that follow.
    pub fn write_to<'a, W, I>(out: &mut W, records: I) -> Result<u64, SnapshotError>
    where
        W: Write + Seek,
        I: IntoIterator<Item = &'a Record>,
    {
        let start = out.stream_position()?;
        out.write_u64::<LittleEndian>(0)?;

        let mut buf = Vec::with_capacity(RECORD_BYTES);
        let mut written = 0u64;
        for rec in records {
            buf.clear();
            encode_record(rec, &mut buf)?;
            out.write_all(&buf)?;
            written += 1;
        }

        let end = out.stream_position()?;
        out.seek(SeekFrom::Start(start))?;
        out.write_u64::<LittleEndian>(written)?;
        out.seek(SeekFrom::Start(end))?;

        Ok(written)
    }
}

/// Sequential snapshot reader.
///
/// Generic over any `Read` implementor so tests can feed in-memory buffers.
/// Records are decoded until end of file; a trailing partial record (e.g.
/// from a copy cut short) is treated as EOF.
pub struct SnapshotReader<R: Read> {
    rdr: BufReader<R>,
}

impl SnapshotReader<File> {
    /// Opens an existing snapshot file.
    ///
    /// Returns `SnapshotError::Io` if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<SnapshotReader<File>, SnapshotError> {
        let f = File::open(path)?;
        Ok(SnapshotReader {
            rdr: BufReader::new(f),
        })
    }
}

impl<R: Read> SnapshotReader<R> {
    pub fn from_reader(reader: R) -> Self {
        SnapshotReader {
            rdr: BufReader::new(reader),
        }
    }

    /// Decodes every complete record, calling `apply` for each one.
    ///
    /// # Termination
    ///
    /// - **Empty file** -> `Ok` with zero records.
    /// - **Partial header** (1..8 bytes) -> `Err(SnapshotError::Corrupt)`.
    /// - **Clean EOF** after a record -> `Ok`.
    /// - **Truncated tail** -> `Ok` with `truncated_tail = true`.
    /// - **I/O error** -> `Err(SnapshotError::Io(...))`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<ReplayStats, SnapshotError>
    where
        F: FnMut(Record),
    {
        let mut stats = ReplayStats::default();

        let mut header = [0u8; HEADER_BYTES];
        match read_full(&mut self.rdr, &mut header)? {
            0 => return Ok(stats),
            HEADER_BYTES => {}
            n => {
                return Err(SnapshotError::Corrupt(format!(
                    "header is {} bytes, expected {}",
                    n, HEADER_BYTES
                )))
            }
        }
        stats.declared = u64::from_le_bytes(header);

        let mut buf = [0u8; RECORD_BYTES];
        loop {
            match read_full(&mut self.rdr, &mut buf)? {
                0 => return Ok(stats),
                RECORD_BYTES => {}
                _ => {
                    stats.truncated_tail = true;
                    return Ok(stats);
                }
            }
            apply(decode_record(&buf)?);
            stats.read += 1;
        }
    }
}

fn tmp_path_for(path: &Path) -> std::path::PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(".tmp");
    name.into()
}

fn encode_record(rec: &Record, buf: &mut Vec<u8>) -> io::Result<()> {
    buf.write_i32::<LittleEndian>(rec.id)?;
    let mut name = [0u8; MAX_NAME_LEN];
    let bytes = truncate_name(rec.name()).as_bytes();
    name[..bytes.len()].copy_from_slice(bytes);
    buf.extend_from_slice(&name);
    buf.write_f64::<LittleEndian>(rec.value)?;
    Ok(())
}

fn decode_record(mut bytes: &[u8]) -> io::Result<Record> {
    let id = bytes.read_i32::<LittleEndian>()?;
    let mut name = [0u8; MAX_NAME_LEN];
    bytes.read_exact(&mut name)?;
    let value = bytes.read_f64::<LittleEndian>()?;

    // The name ends at the first NUL; a full field without one is taken as-is.
    let end = name.iter().position(|&b| b == 0).unwrap_or(MAX_NAME_LEN);
    let name = String::from_utf8_lossy(&name[..end]);
    Ok(Record::new(id, &name, value))
}

/// Reads until `buf` is full or EOF, returning the number of bytes read.
fn read_full<R: Read>(rdr: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match rdr.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}
