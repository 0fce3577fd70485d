//! Write path: `put()` and `delete()`.
//!
//! Each write is first appended to the WAL, then applied to the active
//! table. Before the append, a WAL that has grown past `log_limit` records
//! triggers a synchronous compaction on the calling thread.

use wal::{Action, Record};

use crate::{Engine, Result};

impl Engine {
    /// Inserts or overwrites `key`.
    ///
    /// # Errors
    ///
    /// [`Error::InvalidKey`](crate::Error::InvalidKey) if the key contains
    /// `|`; otherwise any compaction or WAL failure. Nothing reaches the
    /// tables unless the append succeeded.
    pub fn put(&self, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Result<()> {
        self.append(Record::put(key.into(), value.into())?)
    }

    /// Removes `key` from the active table.
    ///
    /// A value for `key` still held by the immutable table stays readable
    /// until that table is flushed and replaced.
    pub fn delete(&self, key: impl Into<Vec<u8>>) -> Result<()> {
        self.append(Record::delete(key.into())?)
    }

    /// Compaction check, WAL append, then table sync, all under the writer
    /// lock.
    fn append(&self, record: Record) -> Result<()> {
        let mut state = self.lock_writer();

        if self.wal.len() > self.log_limit {
            self.compact_locked(&mut state)?;
        }

        self.wal.append(record.clone())?;
        self.sync(record);
        Ok(())
    }

    /// Applies a logged record to the active table.
    fn sync(&self, record: Record) {
        let (action, key, value) = record.into_parts();
        match action {
            Action::Put => self.tables.put(key, value),
            Action::Delete => {
                self.tables.delete(&key);
            }
            Action::Get => {}
        }
    }
}
