//! Document shape and file naming for SSTable generations.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Extension of a finished generation file.
pub const SSTABLE_EXTENSION: &str = "sst";

/// Extension of a generation that is still being written.
pub const TMP_EXTENSION: &str = "sst.tmp";

/// One key/value pair as it appears in the document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SstEntry {
    pub key: String,
    pub value: String,
}

impl SstEntry {
    /// Renders raw bytes as text. Invalid UTF-8 is replaced, not rejected.
    pub fn from_bytes(key: &[u8], value: &[u8]) -> Self {
        Self {
            key: String::from_utf8_lossy(key).into_owned(),
            value: String::from_utf8_lossy(value).into_owned(),
        }
    }
}

/// Path of generation `level` inside `dir`.
pub fn generation_path(dir: &Path, level: u64) -> PathBuf {
    dir.join(format!("{level}.{SSTABLE_EXTENSION}"))
}

/// Extracts the generation number from a file name such as `12.sst`.
///
/// Returns `None` for temp files and anything else that is not a finished
/// generation.
pub fn parse_generation(path: &Path) -> Option<u64> {
    if path.extension()? != SSTABLE_EXTENSION {
        return None;
    }
    path.file_stem()?.to_str()?.parse().ok()
}

/// Every finished generation in `dir`, ascending.
pub fn list_generations(dir: &Path) -> io::Result<Vec<u64>> {
    let mut levels: Vec<u64> = fs::read_dir(dir)?
        .filter_map(|e| e.ok())
        .filter_map(|e| parse_generation(&e.path()))
        .collect();
    levels.sort_unstable();
    Ok(levels)
}

/// The first generation number not yet taken in `dir`.
pub fn next_generation(dir: &Path) -> io::Result<u64> {
    Ok(list_generations(dir)?
        .last()
        .map_or(0, |&highest| highest + 1))
}
