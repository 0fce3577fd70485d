//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk generations for the LodeKV storage engine.
//!
//! When the engine compacts, the immutable half of the in-memory table pair
//! is written out as one SSTable. SSTables are *write-once*: once created
//! they are never modified, and the engine's read path never opens them
//! again. [`SSTableReader`] exists for inspection and tooling.
//!
//! ## File naming
//!
//! Generation `n` lives in `<dir>/<n>.sst`. Generations are numbered from
//! zero and increase by one per successful flush. While a generation is
//! being written it lives in `<n>.sst.tmp` and is renamed into place once
//! complete.
//!
//! ## File layout
//!
//! One JSON document: an array of `{"key", "value"}` objects in ascending
//! key order. The array, not an object, carries the entries so that key
//! order survives any JSON parser.
//!
//! ```text
//! [
//!   {"key": "alpha", "value": "1"},
//!   {"key": "bravo", "value": "2"}
//! ]
//! ```
//!
//! Keys and values are stored as text. Bytes that are not valid UTF-8 are
//! replaced with U+FFFD on write.

mod format;
mod reader;
mod writer;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use format::{
    generation_path, list_generations, next_generation, parse_generation, SstEntry,
    SSTABLE_EXTENSION, TMP_EXTENSION,
};
pub use reader::SSTableReader;
pub use writer::SSTableWriter;

/// Errors produced while writing or reading an SSTable.
#[derive(Debug, Error)]
pub enum SstError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    #[error("malformed sstable document: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing a generation with no entries indicates a logic bug upstream.
    #[error("refusing to write an empty SSTable (generation {0})")]
    Empty(u64),

    #[error("entries for {path} are not in ascending key order at index {index}")]
    Unsorted { path: PathBuf, index: usize },
}

#[cfg(test)]
mod tests;
