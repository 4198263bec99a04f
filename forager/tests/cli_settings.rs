//! CLI tests for settings bootstrap and dry-run planning.
//!
//! Spawns the forager binary in a temp directory and checks exit codes and
//! output for the `init`, `check` and `plan` commands.

use std::fs;
use std::process::Command;

fn forager(dir: &std::path::Path) -> Command {
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_forager"));
    cmd.current_dir(dir);
    cmd
}

#[test]
fn init_writes_settings_and_refuses_to_overwrite() {
    let temp = tempfile::tempdir().expect("tempdir");

    let status = forager(temp.path()).arg("init").status().expect("init");
    assert!(status.success());
    let contents = fs::read_to_string(temp.path().join("forager.toml")).expect("read settings");
    assert!(contents.starts_with("# Forager tool settings."));

    let status = forager(temp.path()).arg("init").status().expect("init again");
    assert_eq!(status.code(), Some(1));

    let status = forager(temp.path())
        .args(["init", "--force"])
        .status()
        .expect("forced init");
    assert!(status.success());
}

#[test]
fn check_accepts_defaults_and_notes_blank_credentials() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = forager(temp.path()).arg("check").output().expect("check");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("ok"));
    assert!(stdout.contains("credentials are blank"));
}

#[test]
fn plan_lists_destinations_in_pipeline_order() {
    let temp = tempfile::tempdir().expect("tempdir");

    let output = forager(temp.path()).arg("plan").output().expect("plan");
    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);

    let corn = stdout.find("collect baru corn").expect("corn line");
    let gold = stdout.find("collect gold").expect("gold line");
    assert!(corn < gold);
    assert!(stdout.contains("corn storehouse (115, 94)"));
}

#[test]
fn check_rejects_invalid_settings() {
    let temp = tempfile::tempdir().expect("tempdir");
    fs::write(
        temp.path().join("forager.toml"),
        "[routine]\nmovement = []\n",
    )
    .expect("write settings");

    let status = forager(temp.path()).arg("check").status().expect("check");
    assert_eq!(status.code(), Some(1));
}
