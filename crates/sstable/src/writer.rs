use std::fs::{rename, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::format::{generation_path, SstEntry, TMP_EXTENSION};
use crate::SstError;

/// Writes sorted key/value pairs to disk as an immutable SSTable file.
///
/// The writer is stateless: the generation counter belongs to the caller.
/// The write is crash-safe: data is first written to a temporary file,
/// fsynced, and then atomically renamed to the final path.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Writes `entries` as generation `level` inside `dir` and returns the
    /// path of the new file.
    ///
    /// `entries` must be in strictly ascending key order once rendered as
    /// text; the order is what the document preserves.
    ///
    /// # Crash Safety
    ///
    /// Writes to `<level>.sst.tmp`, calls `sync_all()`, then renames. If the
    /// process crashes mid-write the temp file is left behind and removed the
    /// next time the engine opens the directory.
    ///
    /// # Errors
    ///
    /// [`SstError::Empty`] for an empty slice, [`SstError::Unsorted`] for
    /// out-of-order keys, I/O or JSON errors otherwise.
    pub fn write(dir: &Path, level: u64, entries: &[(Vec<u8>, Vec<u8>)]) -> Result<PathBuf, SstError> {
        let path = generation_path(dir, level);

        if entries.is_empty() {
            return Err(SstError::Empty(level));
        }

        let document: Vec<SstEntry> = entries
            .iter()
            .map(|(k, v)| SstEntry::from_bytes(k, v))
            .collect();

        // Checked on the stored text: lossy conversion can merge or reorder
        // keys that were distinct bytes.
        if let Some(index) = document.windows(2).position(|w| w[0].key >= w[1].key) {
            return Err(SstError::Unsorted {
                path,
                index: index + 1,
            });
        }

        // Create temporary file next to target for atomic rename later
        let tmp_path = path.with_extension(TMP_EXTENSION);
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        if let Err(e) = serde_json::to_writer(&mut file, &document) {
            drop(file);
            let _ = std::fs::remove_file(&tmp_path);
            return Err(e.into());
        }

        // Flush BufWriter, then sync the underlying file
        file.flush()?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        // Atomically move into place
        rename(&tmp_path, &path)?;

        // Fsync the directory so the rename survives a crash.
        if let Ok(d) = std::fs::File::open(dir) {
            let _ = d.sync_all();
        }

        debug!(path = %path.display(), level, entries = entries.len(), "wrote sstable");
        Ok(path)
    }
}
