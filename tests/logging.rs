mod util;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use serde_json::Value;

fn wqs() -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("wqs"));
    cmd.current_dir(util::scratch_dir());
    for var in ["CA_URL", "CA_USER", "CA_TOKEN", "RUST_LOG"] {
        cmd.env_remove(var);
    }
    cmd
}

#[test]
fn diagnostics_go_to_stderr_and_stdout_stays_a_payload() {
    let mut cmd = wqs();
    cmd.args(["notion", "roadmap"]);
    let assert = cmd.assert().success().stderr(contains("search failed"));

    let stdout = String::from_utf8_lossy(&assert.get_output().stdout).to_string();
    let json: Value = serde_json::from_str(stdout.trim()).expect("stdout is pure JSON");
    assert_eq!(json["items"][0]["valid"], false);
}

#[test]
fn verbose_flag_enables_debug_logging() {
    let mut cmd = wqs();
    cmd.args([
        "confluence",
        "roadmap",
        "-v",
        "--url",
        "http://127.0.0.1:0",
        "--user",
        "dev@example.com",
        "--token",
        "secret",
    ]);
    cmd.assert()
        .success()
        .stderr(contains("resolved confluence instance"));
}

#[test]
fn debug_logging_is_off_by_default() {
    let mut cmd = wqs();
    cmd.args([
        "confluence",
        "roadmap",
        "--url",
        "http://127.0.0.1:0",
        "--user",
        "dev@example.com",
        "--token",
        "secret",
    ]);
    cmd.assert()
        .success()
        .stderr(contains("resolved confluence instance").not());
}
