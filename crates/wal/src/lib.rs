//! # WAL - Write-Ahead Log
//!
//! Provides crash-safe durability for the LodeKV storage engine.
//!
//! Every mutation (`PUT` or `DELETE`) is encoded into a [`Record`] and
//! appended to the WAL **before** the corresponding in-memory update. On
//! restart the log is decoded back into its record list so the engine can
//! replay it into the active table.
//!
//! ## File layout
//!
//! One file, [`WAL_FILENAME`], inside the engine directory. It holds a plain
//! concatenation of encoded records (see [`record`]) with no header, magic
//! number or checksum. An empty file is a valid, empty log. A file that ends
//! in the middle of a record fails to decode and the WAL refuses to open.
//!
//! ## Example
//!
//! ```rust,no_run
//! use wal::{Record, Wal};
//!
//! let wal = Wal::open(".", true).unwrap();
//! wal.append(Record::put(b"hello".to_vec(), b"world".to_vec()).unwrap())
//!     .unwrap();
//! assert_eq!(wal.len(), 1);
//! wal.close().unwrap();
//! ```

pub mod record;

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, warn};

pub use record::{decode, Action, DecodeError, InvalidKey, Record, SEPARATOR};

/// Name of the log file inside the engine directory.
pub const WAL_FILENAME: &str = "wal.log";

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The log file holds bytes that are not a sequence of whole records.
    #[error("corrupt log: {0}")]
    Decode(#[from] DecodeError),
}

/// State guarded by the WAL's lock: the file and its in-memory mirror.
#[derive(Debug)]
struct Inner {
    file: File,
    records: Vec<Record>,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

/// Append-only log of [`Record`]s backed by a single file.
///
/// The in-memory record list mirrors what has been written to the file. All
/// operations serialize on one internal mutex, so appends never interleave at
/// the byte level and an append never races a compaction.
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    sync: bool,
    inner: Mutex<Inner>,
}

impl Wal {
    /// Opens (or creates) the log inside `dir` and decodes its contents.
    ///
    /// The file cursor is left at end-of-file so later writes append. When
    /// `sync` is true every append is followed by `sync_all()`.
    ///
    /// # Errors
    ///
    /// `WalError::Io` if the file cannot be opened or read,
    /// `WalError::Decode` if its contents are not whole records.
    pub fn open<P: AsRef<Path>>(dir: P, sync: bool) -> Result<Self, WalError> {
        let path = dir.as_ref().join(WAL_FILENAME);
        let mut file = OpenOptions::new()
            .create(true)
            .truncate(false)
            .read(true)
            .write(true)
            .open(&path)?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)?;
        let records = decode(&data)?;

        file.seek(SeekFrom::End(0))?;

        debug!(
            path = %path.display(),
            bytes = data.len(),
            records = records.len(),
            "opened write-ahead log"
        );

        Ok(Self {
            path,
            sync,
            inner: Mutex::new(Inner {
                file,
                records,
                buf: Vec::with_capacity(256),
            }),
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Full path of the log file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends `record` to the in-memory list and writes its encoded bytes.
    ///
    /// The record is pushed before the write is attempted. If the write
    /// fails it stays in the list even though it is not on disk; callers
    /// must treat the error as fatal to the operation in progress.
    ///
    /// A partially written record is cut off again so later appends start
    /// on a record boundary.
    pub fn append(&self, record: Record) -> Result<(), WalError> {
        let mut inner = self.lock();
        let Inner { file, records, buf } = &mut *inner;

        buf.clear();
        record.encode_into(buf);
        records.push(record);

        let start = file.stream_position()?;

        // Single write call for the entire record
        if let Err(e) = file.write_all(buf).and_then(|()| file.flush()) {
            warn!(path = %self.path.display(), error = %e, "write-ahead log append failed");
            if let Err(undo) = rewind_to(file, start) {
                warn!(
                    path = %self.path.display(),
                    offset = start,
                    error = %undo,
                    "could not cut partial record from write-ahead log"
                );
            }
            return Err(e.into());
        }

        if self.sync {
            file.sync_all()?;
        }

        Ok(())
    }

    /// Number of records currently in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().records.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().records.is_empty()
    }

    /// The most recently appended record, or `None` for an empty log.
    #[must_use]
    pub fn last(&self) -> Option<Record> {
        self.lock().records.last().cloned()
    }

    /// Snapshot of every record in the log, oldest first.
    #[must_use]
    pub fn records(&self) -> Vec<Record> {
        self.lock().records.clone()
    }

    /// Discards every record: truncates the file to zero length, rewinds the
    /// cursor, and clears the in-memory list.
    ///
    /// The list is only cleared once the file has been truncated, so a
    /// failure leaves the log exactly as it was.
    pub fn compact(&self) -> Result<(), WalError> {
        let mut inner = self.lock();
        rewind_to(&mut inner.file, 0)?;
        if self.sync {
            inner.file.sync_all()?;
        }
        let dropped = inner.records.len();
        inner.records.clear();
        debug!(path = %self.path.display(), dropped, "truncated write-ahead log");
        Ok(())
    }

    /// Syncs and releases the file handle. Consumes the log, so no further
    /// operation is possible.
    pub fn close(self) -> Result<(), WalError> {
        let inner = self.inner.into_inner().unwrap_or_else(PoisonError::into_inner);
        inner.file.sync_all()?;
        debug!(path = %self.path.display(), records = inner.records.len(), "closed write-ahead log");
        Ok(())
    }
}

/// Moves the cursor to `offset`, then drops everything after it.
///
/// Seeking first means a failure leaves the file and cursor consistent.
fn rewind_to<F: Seek + SetLen>(file: &mut F, offset: u64) -> io::Result<()> {
    file.seek(SeekFrom::Start(offset))?;
    file.set_len(offset)
}

/// File-like handles that can be truncated.
trait SetLen {
    fn set_len(&self, size: u64) -> io::Result<()>;
}

impl SetLen for File {
    fn set_len(&self, size: u64) -> io::Result<()> {
        File::set_len(self, size)
    }
}
