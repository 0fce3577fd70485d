//! Read path: `get()`.
//!
//! Point lookups check the active table, then the immutable table. The first
//! match wins. Neither the WAL nor any SSTable is consulted.

use crate::{Engine, Error, Result};

impl Engine {
    /// Looks up `key`.
    ///
    /// # Errors
    ///
    /// [`Error::KeyNotFound`] if neither table holds the key.
    pub fn get(&self, key: &[u8]) -> Result<Vec<u8>> {
        self.tables.get(key).ok_or(Error::KeyNotFound)
    }
}
