//! Compaction: persist the immutable table, truncate the WAL, rotate.
//!
//! The whole sequence runs with the writer lock and the table lock held, so
//! no reader sees a half-rotated table pair and no writer appends to a WAL
//! that is about to be truncated.
use sstable::SSTableWriter;
use tracing::{info, warn};

use crate::{Engine, Result, WriterState};

impl Engine {
    /// Runs a compaction now, regardless of the WAL length.
    ///
    /// # Errors
    ///
    /// Returns an error on SSTable write or WAL truncation failure. The
    /// tables are left as they were and the engine stays usable.
    pub fn compact(&self) -> Result<()> {
        let mut state = self.lock_writer();
        self.compact_locked(&mut state)
    }

    /// # Steps
    ///
    /// 1. If the immutable table is non-empty, write it as generation
    ///    `state.level` and advance the level.
    /// 2. Truncate the WAL.
    /// 3. Move active into immutable and install an empty active table.
    ///
    /// The flush happens before the truncation so that a failed flush
    /// leaves the WAL intact. A truncation failure after a successful flush
    /// keeps the immutable table in place; the next compaction writes it
    /// again under a new generation.
    pub(crate) fn compact_locked(&self, state: &mut WriterState) -> Result<()> {
        let mut tables = self.tables.lock();
        let wal_records = self.wal.len();
        let level = state.level;

        let flushed = tables
            .flush_immutable_to(|entries| SSTableWriter::write(&self.dir, level, entries).map(drop))
            .inspect_err(|e| warn!(level, error = %e, "sstable flush failed, compaction aborted"))?;
        if flushed {
            state.level += 1;
        }

        self.wal
            .compact()
            .inspect_err(|e| warn!(error = %e, "wal truncation failed, compaction aborted"))?;

        let frozen = tables.active_len();
        tables.rotate();

        info!(
            wal_records,
            flushed_level = ?flushed.then_some(level),
            frozen,
            next_level = state.level,
            "compaction finished"
        );
        Ok(())
    }
}
