use std::fs;
use std::path::Path;

use crate::{Engine, Options};

pub fn count_sst_files(dir: &Path) -> usize {
    fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .extension()
                .and_then(|s| s.to_str())
                .map(|ext| ext == "sst")
                .unwrap_or(false)
        })
        .count()
}

/// Engine over `dir` with a small compaction threshold and no fsync.
pub fn open_small(dir: &Path, log_limit: usize) -> Engine {
    Engine::open(
        Options::new()
            .dir(dir)
            .log_limit(log_limit)
            .wal_sync(false),
    )
    .unwrap()
}
