//! # CLI - LodeKV Interactive Shell
//!
//! A REPL-style command-line interface for the LodeKV storage engine.
//! Reads commands from stdin, executes them against the engine, and prints
//! results to stdout. Designed for both interactive use and scripted testing
//! (pipe commands via stdin). Logs go to stderr, filtered by `RUST_LOG`.
//!
//! ## Commands
//!
//! ```text
//! PUT key value      Insert or update a key-value pair (alias: SET)
//! GET key            Look up a key (prints value or "(nil)")
//! DEL key            Delete a key from the active table
//! COMPACT            Flush the immutable table, truncate the WAL, rotate
//! DUMP n             Print the contents of generation n.sst
//! STATS              Print engine debug info
//! DEMO [rounds]      Run the sample put/get/delete loop (default 1000)
//! EXIT / QUIT        Close the engine and exit
//! ```
//!
//! ## Configuration
//!
//! ```text
//! LODE_DIR        storage directory              (default: ".")
//! LODE_LOG_LIMIT  WAL records before compaction  (default: 4096)
//! LODE_WAL_SYNC   fsync every WAL append         (default: "true")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ LODE_DIR=data cargo run -p cli
//! LodeKV started (dir=data, log_limit=4096, wal_records=0)
//! > PUT name Alice
//! OK
//! > GET name
//! Alice
//! > EXIT
//! bye
//! ```

use anyhow::{Context, Result};
use config::Options;
use engine::Engine;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

/// Rounds the `DEMO` command runs when none are given.
const DEFAULT_DEMO_ROUNDS: usize = 1000;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = Options::from_env().context("invalid configuration")?;
    let dir = options.dir.display().to_string();
    let engine = Engine::open(options).with_context(|| format!("failed to open engine in {dir}"))?;

    println!(
        "LodeKV started (dir={}, log_limit={}, wal_records={})",
        dir,
        engine.log_limit(),
        engine.wal_len()
    );
    println!("Commands: PUT key value | GET key | DEL key | COMPACT | DUMP n");
    println!("          STATS | DEMO [rounds] | EXIT");
    print!("> ");
    io::stdout().flush().ok();

    let stdin = io::stdin();

    for line in stdin.lock().lines() {
        let line = line?;
        let mut parts = line.split_whitespace();
        if let Some(cmd) = parts.next() {
            match cmd.to_uppercase().as_str() {
                "PUT" | "SET" => {
                    if let Some(k) = parts.next() {
                        let v: String = parts.collect::<Vec<&str>>().join(" ");
                        if v.is_empty() {
                            println!("ERR usage: PUT key value");
                        } else {
                            match engine.put(k, v) {
                                Ok(()) => println!("OK"),
                                Err(e) => println!("ERR put failed: {}", e),
                            }
                        }
                    } else {
                        println!("ERR usage: PUT key value");
                    }
                }
                "GET" => {
                    if let Some(k) = parts.next() {
                        match engine.get(k.as_bytes()) {
                            Ok(v) => println!("{}", String::from_utf8_lossy(&v)),
                            Err(e) if e.is_not_found() => println!("(nil)"),
                            Err(e) => println!("ERR read failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: GET key");
                    }
                }
                "DEL" => {
                    if let Some(k) = parts.next() {
                        match engine.delete(k) {
                            Ok(()) => println!("OK"),
                            Err(e) => println!("ERR del failed: {}", e),
                        }
                    } else {
                        println!("ERR usage: DEL key");
                    }
                }
                "COMPACT" => match engine.compact() {
                    Ok(()) => println!(
                        "OK (immutable={}, next_level={})",
                        engine.immutable_len(),
                        engine.level()
                    ),
                    Err(e) => println!("ERR compact failed: {}", e),
                },
                "DUMP" => match parts.next().map(str::parse::<u64>) {
                    Some(Ok(level)) => {
                        let path = sstable::generation_path(engine.dir(), level);
                        match sstable::SSTableReader::open(&path) {
                            Ok(reader) => {
                                for entry in reader.entries() {
                                    println!("{} -> {}", entry.key, entry.value);
                                }
                                println!("({} entries)", reader.len());
                            }
                            Err(e) => println!("ERR dump failed: {}", e),
                        }
                    }
                    _ => println!("ERR usage: DUMP n"),
                },
                "STATS" => {
                    println!("{:?}", engine);
                }
                "DEMO" => {
                    let rounds = match parts.next().map(str::parse::<usize>) {
                        None => Some(DEFAULT_DEMO_ROUNDS),
                        Some(Ok(n)) => Some(n),
                        Some(Err(_)) => None,
                    };
                    match rounds {
                        Some(rounds) => match run_demo(&engine, rounds) {
                            Ok(()) => println!("OK ({} rounds)", rounds),
                            Err(e) => println!("ERR demo failed: {}", e),
                        },
                        None => println!("ERR usage: DEMO [rounds]"),
                    }
                }
                "EXIT" | "QUIT" => {
                    println!("bye");
                    break;
                }
                other => {
                    println!("unknown command: {}", other);
                }
            }
        }

        print!("> ");
        io::stdout().flush().ok();
    }

    engine.close().context("failed to close engine")?;
    Ok(())
}

/// The sample workload: three puts, a read, a delete, and a read of the
/// deleted key, repeated `rounds` times.
fn run_demo(engine: &Engine, rounds: usize) -> engine::Result<()> {
    for _ in 0..rounds {
        engine.put("k1", "v1")?;
        engine.put("k2", "v2")?;
        engine.put("k3", "v3")?;

        let v = engine.get(b"k1")?;
        tracing::debug!(value = %String::from_utf8_lossy(&v), "get k1");

        engine.delete("k1")?;
        match engine.get(b"k1") {
            Err(e) if e.is_not_found() => tracing::debug!("k1 deleted"),
            Err(e) => return Err(e),
            Ok(_) => tracing::debug!("k1 still visible in the immutable table"),
        }
    }
    Ok(())
}
