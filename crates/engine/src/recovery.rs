//! Cold-start path: replaying the WAL into the table pair and sweeping up
//! after interrupted flushes.

use std::path::Path;

use memtable::Tables;
use tracing::{debug, warn};
use wal::{Action, Record};

/// Applies `records` to `tables` in log order and returns how many were
/// applied.
///
/// `Put` inserts into the active table and `Delete` removes from it, exactly
/// as the live write path does. `Get` records carry no mutation and are
/// skipped.
pub fn replay(records: &[Record], tables: &mut Tables) -> usize {
    let mut applied = 0;
    for record in records {
        match record.action() {
            Action::Put => tables.put(record.key().to_vec(), record.value().to_vec()),
            Action::Delete => {
                tables.delete(record.key());
            }
            Action::Get => continue,
        }
        applied += 1;
    }
    debug!(records = records.len(), applied, "replayed write-ahead log");
    applied
}

/// Removes leftover `.sst.tmp` files from interrupted flushes.
pub(crate) fn cleanup_tmp_files(dir: &Path) {
    if let Ok(entries) = std::fs::read_dir(dir) {
        for entry in entries.flatten() {
            let p = entry.path();
            if let Some(name) = p.file_name().and_then(|n| n.to_str()) {
                if name.ends_with(".sst.tmp") {
                    match std::fs::remove_file(&p) {
                        Ok(()) => debug!(path = %p.display(), "removed partial sstable"),
                        Err(e) => warn!(path = %p.display(), error = %e, "could not remove partial sstable"),
                    }
                }
            }
        }
    }
}
