/// End-to-end tests for the SkipDB shell binary.
/// Tests cover: basic ops, persistence across runs, load/save, bulk add, edge cases
use std::fs;
use std::path::Path;
use tempfile::tempdir;

/// Helper to run shell commands and capture stdout
fn run_cli_command(snapshot: &Path, command: &str) -> String {
    run_cli_with_env(snapshot, command, &[])
}

fn run_cli_with_env(snapshot: &Path, command: &str, env: &[(&str, &str)]) -> String {
    use std::io::Write;
    use std::process::{Command, Stdio};

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_cli"));
    cmd.env("SKIPDB_SNAPSHOT", snapshot.to_str().unwrap())
        .env("SKIPDB_SEED", "42")
        .env("RUST_LOG", "off")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());
    for (k, v) in env {
        cmd.env(k, v);
    }
    let mut child = cmd.spawn().expect("Failed to spawn CLI");

    {
        let stdin = child.stdin.as_mut().expect("Failed to open stdin");
        stdin
            .write_all(command.as_bytes())
            .expect("Failed to write to stdin");
        stdin.write_all(b"quit\n").expect("Failed to write quit");
    }

    let output = child.wait_with_output().expect("Failed to read output");
    assert!(output.status.success(), "cli exited with {:?}", output.status);
    String::from_utf8_lossy(&output.stdout).to_string()
}

#[test]
fn test_basic_add_get() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    let output = run_cli_command(&snap, "add 1 Alice 10.5\nget 1\n");

    assert!(output.contains("SkipDB started (records=0"));
    assert!(output.contains("OK record 1 added"));
    assert!(output.contains("Name : Alice"));
    assert!(output.contains("Value: 10.50"));
}

#[test]
fn test_sorted_listing() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    let output = run_cli_command(&snap, "add 5 e 5\nadd 1 a 1\nadd 9 i 9\nadd 3 c 3\nlist\n");
    assert!(output.contains("Level 0: HEAD -> [1] -> [3] -> [5] -> [9] -> NIL"));
}

#[test]
fn test_delete_then_get() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    let output = run_cli_command(&snap, "add 1 a 1\ndel 1\nget 1\ndel 1\n");
    assert!(output.contains("OK record 1 deleted"));
    assert!(output.contains("(nil) record 1 not found"));
    assert!(output.contains("ERR record 1 not found"));
}

#[test]
fn test_persistence_across_runs() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    run_cli_command(&snap, "add 10 Ten 10\nadd 20 Twenty 20\n");
    assert!(snap.exists());

    let output = run_cli_command(&snap, "get 20\nstats\n");
    assert!(output.contains("SkipDB started (records=2"));
    assert!(output.contains("Name : Twenty"));
    assert!(output.contains("Record Count: 2"));
}

#[test]
fn test_autosave_disabled() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    let output = run_cli_with_env(&snap, "add 1 a 1\n", &[("SKIPDB_AUTOSAVE", "false")]);
    assert!(!output.contains("Saved"));
    assert!(!snap.exists());
}

#[test]
fn test_save_and_load_other_file() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");
    let other = dir.path().join("other.bin");

    let script = format!(
        "add 1 a 1\nsave {0}\nadd 2 b 2\nload {0}\ny\nstats\n",
        other.display()
    );
    let output = run_cli_command(&snap, &script);
    assert!(output.contains("OK saved 1 records"));
    assert!(output.contains("OK loaded 1 records"));
    assert!(output.contains("Record Count: 1"));
}

#[test]
fn test_bulkadd_and_restart() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    let output = run_cli_command(&snap, "bulkadd 2000\nstats\n");
    assert!(output.contains("OK added 2000 records"));
    assert!(output.contains("Record Count: 2000"));

    let size = fs::metadata(&snap).unwrap().len();
    assert_eq!(size, 8 + 2000 * 76);

    let output = run_cli_command(&snap, "stats\n");
    assert!(output.contains("Record Count: 2000"));
}

#[test]
fn test_corrupt_snapshot_duplicates_skipped() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");

    run_cli_command(&snap, "add 1 a 1\nadd 2 b 2\n");
    // append a copy of the first record: count header stays at 2
    let mut bytes = fs::read(&snap).unwrap();
    let first = bytes[8..8 + 76].to_vec();
    bytes.extend_from_slice(&first);
    fs::write(&snap, &bytes).unwrap();

    let output = run_cli_command(&snap, "stats\n");
    assert!(output.contains("SkipDB started (records=2"));
}

#[test]
fn test_unreadable_snapshot_is_fatal() {
    use std::process::{Command, Stdio};

    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");
    fs::write(&snap, [0xffu8; 3]).unwrap();

    let output = Command::new(env!("CARGO_BIN_EXE_cli"))
        .env("SKIPDB_SNAPSHOT", snap.to_str().unwrap())
        .env("RUST_LOG", "off")
        .stdin(Stdio::null())
        .output()
        .unwrap();
    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("could not initialize database"));
}

#[test]
fn test_unknown_command() {
    let dir = tempdir().unwrap();
    let snap = dir.path().join("db.bin");
    let output = run_cli_command(&snap, "drop table\n");
    assert!(output.contains("unknown command: 'drop'"));
}
