use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn demo_mines_and_detects_tamper() {
    Command::cargo_bin("sandbox-cli")
        .unwrap()
        .args([
            "demo",
            "--difficulty",
            "1",
            "--timestamp-mode",
            "excluded",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("Alice pays Bob 10"))
        .stdout(predicate::str::contains("Bob pays Carol 5"))
        .stdout(predicate::str::contains("chain valid (3 blocks)"))
        .stdout(predicate::str::contains("chain INVALID from block 1"));
}

#[test]
fn demo_rejects_out_of_range_difficulty() {
    Command::cargo_bin("sandbox-cli")
        .unwrap()
        .args(["demo", "--difficulty", "7"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("7"));
}

#[test]
fn mine_requires_session() {
    Command::cargo_bin("sandbox-cli")
        .unwrap()
        .args(["mine", "--data", "x"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--session"));
}
