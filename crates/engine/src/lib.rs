//! # Engine - LodeKV Storage Engine
//!
//! The central orchestrator that ties together the [`memtable`], [`wal`], and
//! [`sstable`] crates into a key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌───────────────────────────────────────────────┐
//! │                   ENGINE                      │
//! │                                               │
//! │ write.rs → (WAL > limit? compact) →           │
//! │            WAL append → active table          │
//! │                                               │
//! │ compaction.rs → flush immutable → N.sst       │
//! │                 truncate WAL                  │
//! │                 active → immutable            │
//! │                                               │
//! │ read.rs → active → immutable                  │
//! │            (first match wins)                 │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module         | Purpose                                               |
//! |----------------|-------------------------------------------------------|
//! | `lib.rs`       | `Engine` struct, `open`, `close`, accessors, errors    |
//! | [`recovery`]   | WAL replay into the tables, tmp file cleanup           |
//! | `write`        | `put()`, `delete()`, compaction check                  |
//! | `read`         | `get()`                                                |
//! | `compaction`   | `compact()`: flush, truncate, rotate                   |
//!
//! ## Locking
//!
//! The WAL and the table pair each guard themselves with their own mutex.
//! On top of that the engine holds a writer lock across the compaction
//! check, the WAL append, and the table update, so writers never interleave
//! between logging a record and applying it. Readers only take the table
//! lock and see a write from the moment it is applied.
//!
//! Lock order is always writer → tables → WAL.
//!
//! ## Durability
//!
//! Every write is appended to the WAL before it touches the tables. The WAL
//! is truncated only after the previous immutable table has been written to
//! its SSTable generation. Generations are never read back: after a restart
//! only the writes still in the WAL are visible.

mod compaction;
mod read;
pub mod recovery;
mod write;

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

use memtable::TablePair;
use sstable::{SSTableWriter, SstError};
use thiserror::Error;
use tracing::info;
use wal::{InvalidKey, Wal, WalError};

pub use config::Options;
pub use recovery::replay;

/// Errors surfaced by the engine.
#[derive(Debug, Error)]
pub enum Error {
    /// The key is in neither the active nor the immutable table.
    #[error("key not found")]
    KeyNotFound,

    /// Keys may not contain the WAL separator byte.
    #[error(transparent)]
    InvalidKey(#[from] InvalidKey),

    #[error("wal: {0}")]
    Wal(#[from] WalError),

    #[error("sstable: {0}")]
    Sstable(#[from] SstError),

    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::KeyNotFound)
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// State only writers touch, guarded by the writer lock.
#[derive(Debug)]
pub(crate) struct WriterState {
    /// Generation number the next flushed SSTable will get.
    pub(crate) level: u64,
}

/// The storage engine: one WAL, one table pair, and a directory of SSTable
/// generations.
///
/// All methods take `&self`; the engine can be shared across threads behind
/// an `Arc`.
///
/// # Write Path
///
/// 1. Take the writer lock.
/// 2. If the WAL holds more than `log_limit` records, compact.
/// 3. Append the record to the WAL (durability point).
/// 4. Apply the same record to the active table (visibility point).
///
/// # Read Path
///
/// Active table, then immutable table. The WAL and SSTables are never
/// consulted.
pub struct Engine {
    pub(crate) dir: PathBuf,
    pub(crate) wal: Wal,
    pub(crate) tables: TablePair,
    pub(crate) writer: Mutex<WriterState>,
    pub(crate) log_limit: usize,
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("dir", &self.dir)
            .field("log_limit", &self.log_limit)
            .field("wal_records", &self.wal.len())
            .field("active_entries", &self.tables.active_len())
            .field("immutable_entries", &self.tables.immutable_len())
            .field("next_level", &self.level())
            .finish()
    }
}

impl Engine {
    /// Opens the engine in `options.dir`, creating the directory if needed.
    ///
    /// # Recovery Steps
    ///
    /// 1. Create the directory if it does not exist.
    /// 2. Clean up leftover `.sst.tmp` files from interrupted flushes.
    /// 3. Open the WAL and decode every record in it.
    /// 4. Replay those records, in order, into the active table.
    /// 5. Continue the generation counter after the highest `N.sst` present.
    ///
    /// # Errors
    ///
    /// Any I/O failure, or a WAL that does not decode.
    pub fn open(options: Options) -> Result<Self> {
        let dir = options.dir;
        std::fs::create_dir_all(&dir)?;

        recovery::cleanup_tmp_files(&dir);

        let wal = Wal::open(&dir, options.wal_sync)?;
        let tables = TablePair::new();
        let replayed = replay(&wal.records(), &mut tables.lock());
        let level = sstable::next_generation(&dir)?;

        info!(
            dir = %dir.display(),
            replayed,
            next_level = level,
            log_limit = options.log_limit,
            "engine opened"
        );

        Ok(Self {
            dir,
            wal,
            tables,
            writer: Mutex::new(WriterState { level }),
            log_limit: options.log_limit,
        })
    }

    pub(crate) fn lock_writer(&self) -> MutexGuard<'_, WriterState> {
        self.writer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Closes the engine.
    ///
    /// A pending immutable table is flushed to its SSTable generation first,
    /// since the WAL no longer covers it. The active table is already in the
    /// WAL and is not flushed. The WAL is then synced and released.
    pub fn close(self) -> Result<()> {
        let Engine {
            dir,
            wal,
            tables,
            writer,
            ..
        } = self;
        let mut state = writer.into_inner().unwrap_or_else(PoisonError::into_inner);

        let flushed = tables
            .lock()
            .flush_immutable_to(|entries| SSTableWriter::write(&dir, state.level, entries).map(drop))?;
        if flushed {
            state.level += 1;
        }

        wal.close()?;
        info!(dir = %dir.display(), flushed, "engine closed");
        Ok(())
    }

    /// Directory holding the WAL and the SSTable generations.
    #[must_use]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    #[must_use]
    pub fn log_limit(&self) -> usize {
        self.log_limit
    }

    /// Number of records currently in the WAL.
    #[must_use]
    pub fn wal_len(&self) -> usize {
        self.wal.len()
    }

    /// Generation number the next flushed SSTable will get.
    #[must_use]
    pub fn level(&self) -> u64 {
        self.lock_writer().level
    }

    #[must_use]
    pub fn active_len(&self) -> usize {
        self.tables.active_len()
    }

    #[must_use]
    pub fn immutable_len(&self) -> usize {
        self.tables.immutable_len()
    }
}

#[cfg(test)]
mod tests;
