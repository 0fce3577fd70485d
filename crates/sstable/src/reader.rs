use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use crate::format::{parse_generation, SstEntry};
use crate::SstError;

/// Loads a finished SSTable generation.
///
/// The whole document is read into memory on [`open`](SSTableReader::open).
/// This is for inspection and tooling; the engine never reads generations
/// back on its own read path.
#[derive(Debug)]
pub struct SSTableReader {
    path: PathBuf,
    entries: Vec<SstEntry>,
}

impl SSTableReader {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SstError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path)?;
        let entries: Vec<SstEntry> = serde_json::from_reader(BufReader::new(file))?;
        Ok(Self { path, entries })
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Generation number taken from the file name, if it follows the
    /// `<n>.sst` convention.
    #[must_use]
    pub fn generation(&self) -> Option<u64> {
        parse_generation(&self.path)
    }

    /// Entries in file order (ascending by key).
    #[must_use]
    pub fn entries(&self) -> &[SstEntry] {
        &self.entries
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Binary search over the sorted entries.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .binary_search_by(|e| e.key.as_str().cmp(key))
            .ok()
            .map(|i| self.entries[i].value.as_str())
    }
}
