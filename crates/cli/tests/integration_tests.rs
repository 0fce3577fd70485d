/// Integration tests for the LodeKV CLI.
/// Tests cover: basic ops, compaction and SSTable output, restarts, the demo
/// loop, configuration errors.
use std::fs;
use std::path::Path;
use std::process::Output;
use tempfile::tempdir;

/// Helper to run CLI commands against `dir` and capture the process output.
fn run_cli_raw(dir: &Path, log_limit: &str, command: &str) -> Output {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut child = Command::new(env!("CARGO_BIN_EXE_lode"))
        .env("LODE_DIR", dir.to_str().unwrap())
        .env("LODE_LOG_LIMIT", log_limit)
        .env("LODE_WAL_SYNC", "false")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(command.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"EXIT\n").expect("Failed to write EXIT");
    }

    child.wait_with_output().expect("Failed to read output")
}

fn run_cli_command(dir: &Path, log_limit: &str, command: &str) -> String {
    String::from_utf8_lossy(&run_cli_raw(dir, log_limit, command).stdout).to_string()
}

#[test]
fn test_basic_put_get() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "PUT key1 value1\nGET key1\n");

    assert!(output.contains("OK"));
    assert!(output.contains("value1"));
}

#[test]
fn test_set_alias() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "SET a 1\nGET a\n");
    assert!(output.lines().any(|l| l.trim_start_matches("> ") == "1"));
}

#[test]
fn test_value_with_spaces() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "PUT greeting hello big world\nGET greeting\n");
    assert!(output.contains("hello big world"));
}

#[test]
fn test_delete_key() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(
        dir.path(),
        "4096",
        "PUT hello world\nPUT hello1 world1\nGET hello\nDEL hello\nGET hello\nGET hello1\n",
    );

    assert!(output.contains("world"));
    assert!(output.contains("(nil)"));
    assert!(output.contains("world1"));
}

#[test]
fn test_key_with_separator_rejected() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "PUT a|b v\nGET a|b\n");
    assert!(output.contains("ERR put failed"));
    assert!(output.contains("(nil)"));
}

#[test]
fn test_usage_errors() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "PUT onlykey\nGET\nDEL\nDUMP x\nDEMO lots\nFROB\n");
    assert!(output.contains("ERR usage: PUT key value"));
    assert!(output.contains("ERR usage: GET key"));
    assert!(output.contains("ERR usage: DEL key"));
    assert!(output.contains("ERR usage: DUMP n"));
    assert!(output.contains("ERR usage: DEMO [rounds]"));
    assert!(output.contains("unknown command: FROB"));
}

#[test]
fn test_compact_writes_generation_and_dump_reads_it() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(
        dir.path(),
        "4096",
        "PUT b 2\nPUT a 1\nCOMPACT\nCOMPACT\nDUMP 0\n",
    );

    assert!(output.contains("OK (immutable=2, next_level=0)"));
    assert!(output.contains("OK (immutable=0, next_level=1)"));
    let a = output.find("a -> 1").expect("a in dump");
    let b = output.find("b -> 2").expect("b in dump");
    assert!(a < b, "dump must be in key order");
    assert!(output.contains("(2 entries)"));
    assert!(dir.path().join("0.sst").exists());
}

#[test]
fn test_dump_missing_generation() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "DUMP 7\n");
    assert!(output.contains("ERR dump failed"));
}

#[test]
fn test_auto_compaction_on_threshold() {
    let dir = tempdir().unwrap();
    let mut commands = String::new();
    for i in 0..30 {
        commands.push_str(&format!("PUT key{:03} value{}\n", i, i));
    }
    commands.push_str("GET key000\nGET key029\n");

    let output = run_cli_command(dir.path(), "4", &commands);

    assert!(output.contains("value29"));
    let generations = fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map(|x| x == "sst").unwrap_or(false))
        .count();
    assert!(generations > 0, "small log limit should flush generations");
}

#[test]
fn test_stats_output() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "PUT k v\nSTATS\n");
    assert!(output.contains("Engine"));
    assert!(output.contains("wal_records: 1"));
}

#[test]
fn test_quit_command() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "PUT k v\nQUIT\n");
    assert!(output.contains("OK"));
    assert!(output.contains("bye"));
}

#[test]
fn test_persistence_across_restarts() {
    let dir = tempdir().unwrap();

    run_cli_command(dir.path(), "4096", "PUT persist_key persist_value\n");
    let output2 = run_cli_command(dir.path(), "4096", "GET persist_key\n");

    assert!(output2.contains("persist_value"));
}

#[test]
fn test_demo_loop() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "4096", "DEMO 10\nGET k2\nGET k1\nSTATS\n");

    assert!(output.contains("OK (10 rounds)"));
    assert!(output.contains("v2"));
    assert!(output.contains("(nil)"));
    assert!(output.contains("wal_records: 40"));
}

#[test]
fn test_demo_crosses_compaction() {
    let dir = tempdir().unwrap();
    let output = run_cli_command(dir.path(), "16", "DEMO 20\nGET k3\n");
    assert!(output.contains("OK (20 rounds)"));
    assert!(output.contains("v3"));
}

#[test]
fn test_invalid_configuration_fails_startup() {
    let dir = tempdir().unwrap();
    let out = run_cli_raw(dir.path(), "many", "");
    assert!(!out.status.success());
    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("LODE_LOG_LIMIT"));
}

#[test]
fn test_corrupt_wal_fails_startup() {
    let dir = tempdir().unwrap();
    fs::write(dir.path().join("wal.log"), b"12phello|wo").unwrap();
    let out = run_cli_raw(dir.path(), "4096", "");
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("failed to open engine"));
}
