use assert_cmd::Command;
use predicates::prelude::*;
use std::path::Path;
use tempfile::TempDir;

fn taskdeck(config_dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("taskdeck").unwrap();
    cmd.env_remove("RUST_LOG")
        .arg("--config")
        .arg(config_dir.join("config.yml"));
    cmd
}

fn stdout_of(cmd: &mut Command) -> String {
    let output = cmd.output().unwrap();
    assert!(output.status.success(), "{:?}", output);
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn priority_prints_score() {
    let dir = TempDir::new().unwrap();
    taskdeck(dir.path())
        .args(["priority", "5", "5"])
        .assert()
        .success()
        .stdout("25\n");
    taskdeck(dir.path())
        .args(["priority", "2", "2"])
        .assert()
        .success()
        .stdout("10\n");
    taskdeck(dir.path())
        .args(["priority", "1", "5"])
        .assert()
        .success()
        .stdout("13\n");
}

#[test]
fn priority_rejects_out_of_range_ratings() {
    let dir = TempDir::new().unwrap();
    taskdeck(dir.path())
        .args(["priority", "6", "1"])
        .assert()
        .failure();
    taskdeck(dir.path())
        .args(["priority", "0", "3"])
        .assert()
        .failure();
}

#[test]
fn list_orders_demo_tasks_by_priority() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(taskdeck(dir.path()).arg("list"));
    let order = [
        "Finalize Q3 report",
        "Fix login bug",
        "Design new landing page",
        "User research interviews",
        "Deploy v2.1 to production",
    ];
    let positions: Vec<usize> = order
        .iter()
        .map(|title| out.find(title).unwrap_or_else(|| panic!("{title} missing")))
        .collect();
    assert!(positions.windows(2).all(|w| w[0] < w[1]), "{out}");
}

#[test]
fn list_yaml_includes_derived_score() {
    let dir = TempDir::new().unwrap();
    taskdeck(dir.path())
        .args(["list", "--format", "yaml"])
        .assert()
        .success()
        .stdout(predicate::str::contains("priority_score: 25"))
        .stdout(predicate::str::contains("status: in-progress"))
        .stdout(predicate::str::contains("2025-09-30"));
}

#[test]
fn empty_flag_skips_demo_tasks() {
    let dir = TempDir::new().unwrap();
    taskdeck(dir.path())
        .args(["--empty", "list"])
        .assert()
        .success()
        .stdout("No tasks yet\n");
}

#[test]
fn board_groups_by_status_in_insertion_order() {
    let dir = TempDir::new().unwrap();
    let out = stdout_of(taskdeck(dir.path()).arg("board"));
    assert!(out.contains("To-Do (2)"), "{out}");
    assert!(out.contains("In Progress (2)"), "{out}");
    assert!(out.contains("Done (1)"), "{out}");
    // Insertion order, not priority order: 20 before 21.
    let design = out.find("Design new landing page").unwrap();
    let login = out.find("Fix login bug").unwrap();
    assert!(design < login);
}

#[test]
fn board_filters_one_column() {
    let dir = TempDir::new().unwrap();
    taskdeck(dir.path())
        .args(["board", "--status", "done"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Deploy v2.1 to production"))
        .stdout(predicate::str::contains("To-Do").not());
}

#[test]
fn config_can_disable_seeding() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yml"), "seed_demo_tasks: false\n").unwrap();
    taskdeck(dir.path())
        .arg("list")
        .assert()
        .success()
        .stdout("No tasks yet\n");
}

#[test]
fn malformed_config_fails_with_context() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("config.yml"), "timer: [oops").unwrap();
    taskdeck(dir.path())
        .arg("list")
        .assert()
        .failure()
        .stderr(predicate::str::contains("parsing config file"));
}

#[test]
fn timer_with_zero_cycles_exits_without_ticking() {
    let dir = TempDir::new().unwrap();
    taskdeck(dir.path())
        .args(["timer", "--cycles", "0", "--silent"])
        .timeout(std::time::Duration::from_secs(5))
        .assert()
        .success()
        .stdout("\n");
}
