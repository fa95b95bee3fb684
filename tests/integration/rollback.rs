use crate::common::{backups, sandman_command};
use predicates::prelude::*;
use sandman::test_utils::{TestInstallation, fake_executable};

/// Rollback never needs the network; point the config at a closed port.
fn offline_config(install: &TestInstallation) -> std::path::PathBuf {
    crate::common::write_config(install, "http://127.0.0.1:9")
}

#[test]
fn test_rollback_restores_newest_backup() {
    let install = TestInstallation::new("current");
    let older = install.add_backup("2023-01-01_00-00-00-abc1234", "abc1234");
    let newer = install.add_backup("2024-06-01_12-00-00-def5678", "def5678");
    let config = offline_config(&install);

    sandman_command(&install, &config)
        .args(["self-update", "--rollback"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Rolling back to version 2024-06-01_12-00-00-def5678."));

    assert_eq!(install.executable_contents(), fake_executable("def5678"));
    assert!(!newer.exists());
    assert!(older.exists());
}

#[test]
fn test_repeated_rollback_walks_back() {
    let install = TestInstallation::new("current");
    install.add_backup("2023-01-01_00-00-00-abc1234", "abc1234");
    install.add_backup("2024-06-01_12-00-00-def5678", "def5678");
    let config = offline_config(&install);

    sandman_command(&install, &config).args(["self-update", "-r"]).assert().success();
    sandman_command(&install, &config).args(["self-update", "-r"]).assert().success();

    assert_eq!(install.executable_contents(), fake_executable("abc1234"));
    assert!(backups(&install).is_empty());
}

#[test]
fn test_rollback_without_backups_fails() {
    let install = TestInstallation::new("current");
    let config = offline_config(&install);

    sandman_command(&install, &config)
        .args(["self-update", "--rollback"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("no installation to roll back to"));

    assert_eq!(install.executable_contents(), fake_executable("current"));
}

#[test]
fn test_rollback_to_corrupted_backup_fails() {
    let install = TestInstallation::new("current");
    let backup = install.home.join("2024-06-01_12-00-00-def5678-old.bin");
    std::fs::write(&backup, b"not an executable").unwrap();
    let config = offline_config(&install);

    sandman_command(&install, &config)
        .args(["self-update", "--rollback"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("The backup file was corrupted"));

    assert_eq!(install.executable_contents(), fake_executable("current"));
    assert!(backup.exists());
}
