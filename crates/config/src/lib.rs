//! # Config - engine options
//!
//! The named options an engine is opened with. Options are built with
//! chained setters on top of [`Options::default`], or read from the
//! environment with [`Options::from_env`].
//!
//! ```text
//! LODE_DIR        storage directory              (default: ".")
//! LODE_LOG_LIMIT  WAL records before compaction  (default: 4096)
//! LODE_WAL_SYNC   fsync every WAL append         (default: "true")
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Number of WAL records the engine tolerates before compacting.
pub const DEFAULT_LOG_LIMIT: usize = 4 * 1024;

pub const ENV_DIR: &str = "LODE_DIR";
pub const ENV_LOG_LIMIT: &str = "LODE_LOG_LIMIT";
pub const ENV_WAL_SYNC: &str = "LODE_WAL_SYNC";

/// Options consumed by `Engine::open`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Options {
    /// Directory holding the WAL and every SSTable generation.
    pub dir: PathBuf,
    /// Compaction runs before a write once the WAL holds more records than
    /// this.
    pub log_limit: usize,
    /// If `true`, every WAL append is followed by `fsync`.
    pub wal_sync: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            log_limit: DEFAULT_LOG_LIMIT,
            wal_sync: true,
        }
    }
}

impl Options {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dir<P: AsRef<Path>>(mut self, dir: P) -> Self {
        self.dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn log_limit(mut self, limit: usize) -> Self {
        self.log_limit = limit;
        self
    }

    pub fn wal_sync(mut self, sync: bool) -> Self {
        self.wal_sync = sync;
        self
    }

    /// Builds options from the process environment, falling back to the
    /// defaults for unset variables.
    ///
    /// # Errors
    ///
    /// Fails when a variable is set but does not parse.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Options::from_env) with an injectable lookup, so
    /// callers (and tests) need not touch the real environment.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut opts = Self::default();

        if let Some(dir) = lookup(ENV_DIR) {
            opts.dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_LOG_LIMIT) {
            opts.log_limit = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_LOG_LIMIT}={raw:?} is not a record count"))?;
        }
        if let Some(raw) = lookup(ENV_WAL_SYNC) {
            opts.wal_sync = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_WAL_SYNC}={raw:?} is not true/false"))?;
        }

        Ok(opts)
    }
}
