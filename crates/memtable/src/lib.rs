//! # Memtable - the in-memory table pair
//!
//! Two key→value maps sit in front of the on-disk generations:
//!
//! - **active** receives every write since the last compaction;
//! - **immutable** holds the previous active map until it is flushed to an
//!   SSTable.
//!
//! Reads check active first, then immutable. Deletes only remove a key from
//! the active map: no tombstone is carried into the immutable map, so a key
//! deleted right after a compaction can still be read from the immutable map
//! until that generation is flushed and replaced.
//!
//! Both maps are `BTreeMap`s, so the immutable entries come out in ascending
//! key order without an extra sort.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

/// A key/value pair as handed to the SSTable writer.
pub type Entry = (Vec<u8>, Vec<u8>);

/// The two maps guarded by the [`TablePair`] lock.
#[derive(Debug, Default)]
pub struct Tables {
    active: BTreeMap<Vec<u8>, Vec<u8>>,
    immutable: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl Tables {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or overwrites `key` in the active map.
    pub fn put(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.active.insert(key, value);
    }

    /// Removes `key` from the active map only. Returns whether it was there.
    pub fn delete(&mut self, key: &[u8]) -> bool {
        self.active.remove(key).is_some()
    }

    /// Active first, then immutable.
    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.active
            .get(key)
            .or_else(|| self.immutable.get(key))
            .cloned()
    }

    /// Immutable entries in ascending key order.
    pub fn immutable_entries(&self) -> Vec<Entry> {
        self.immutable
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Hands the sorted immutable entries to `write`.
    ///
    /// Returns `Ok(false)` without calling `write` when the immutable map is
    /// empty. The map itself is left untouched either way; the caller decides
    /// when it may be overwritten.
    pub fn flush_immutable_to<E, F>(&self, write: F) -> Result<bool, E>
    where
        F: FnOnce(&[Entry]) -> Result<(), E>,
    {
        if self.immutable.is_empty() {
            return Ok(false);
        }
        write(&self.immutable_entries())?;
        Ok(true)
    }

    /// Moves the active map into the immutable slot and installs a fresh
    /// active map. Whatever the immutable slot held is dropped, so it must
    /// already have been flushed.
    pub fn rotate(&mut self) {
        self.immutable = std::mem::take(&mut self.active);
    }

    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn immutable_len(&self) -> usize {
        self.immutable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty() && self.immutable.is_empty()
    }
}

/// Thread-safe wrapper around [`Tables`].
///
/// Every method takes the single internal lock for its whole duration. Use
/// [`TablePair::lock`] when several steps must happen under one critical
/// section (flush + rotate during compaction).
#[derive(Debug, Default)]
pub struct TablePair {
    inner: Mutex<Tables>,
}

impl TablePair {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquires the table lock.
    pub fn lock(&self) -> MutexGuard<'_, Tables> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn put(&self, key: Vec<u8>, value: Vec<u8>) {
        self.lock().put(key, value);
    }

    pub fn delete(&self, key: &[u8]) -> bool {
        self.lock().delete(key)
    }

    pub fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.lock().get(key)
    }

    pub fn flush_immutable_to<E, F>(&self, write: F) -> Result<bool, E>
    where
        F: FnOnce(&[Entry]) -> Result<(), E>,
    {
        self.lock().flush_immutable_to(write)
    }

    pub fn rotate(&self) {
        self.lock().rotate();
    }

    pub fn active_len(&self) -> usize {
        self.lock().active_len()
    }

    pub fn immutable_len(&self) -> usize {
        self.lock().immutable_len()
    }
}
