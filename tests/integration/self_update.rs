use crate::common::{backups, no_checksums, sandman_command, write_config};
use mockito::Server;
use predicates::prelude::*;
use sandman::test_utils::{TestInstallation, fake_executable};
use sandman::upgrade::backup::BackupStore;
use sandman::upgrade::version::ReleaseInfo;

const SHA: &str = "0123456789abcdef0123456789abcdef01234567";

/// Full update through the CLI: download, swap, backup.
#[test]
fn test_self_update_to_latest() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let version = server.mock("GET", "/version").with_body("9.9.9\n").create();
    let build = server
        .mock("GET", "/download/9.9.9/sandman")
        .with_body(fake_executable("9.9.9"))
        .expect(1)
        .create();
    let _checksums = no_checksums(&mut server);
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .success()
        .stdout(predicate::str::contains("Updating to version 9.9.9."))
        .stdout(predicate::str::contains("sandman self-update --rollback"));

    version.assert();
    build.assert();
    assert_eq!(install.executable_contents(), fake_executable("9.9.9"));

    let backup = BackupStore::backup_name(&ReleaseInfo::current());
    assert_eq!(backups(&install), vec![backup.clone()]);
    assert_eq!(std::fs::read(install.home.join(backup)).unwrap(), fake_executable("current"));
}

/// The `selfupdate` alias and an explicit tag.
#[test]
fn test_selfupdate_alias_with_version() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let build = server
        .mock("GET", "/download/2.0.0/sandman")
        .with_body(fake_executable("2.0.0"))
        .create();
    let _checksums = no_checksums(&mut server);
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config).args(["selfupdate", "2.0.0"]).assert().success();

    build.assert();
    assert_eq!(install.executable_contents(), fake_executable("2.0.0"));
}

#[test]
fn test_already_up_to_date_downloads_nothing() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version =
        server.mock("GET", "/version").with_body(ReleaseInfo::current().version).create();
    let build = server.mock("GET", mockito::Matcher::Regex("^/download/".into())).expect(0).create();
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .success()
        .stdout(predicate::str::contains("You are already using sandman version"));

    build.assert();
    assert_eq!(install.executable_contents(), fake_executable("current"));
    assert!(backups(&install).is_empty());
}

#[test]
fn test_specific_content_id_is_refused() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let build = server.mock("GET", "/sandman").expect(0).create();
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .args(["self-update", SHA])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("specific SHA-1"));

    build.assert();
    assert_eq!(install.executable_contents(), fake_executable("current"));
}

#[test]
fn test_corrupted_download_keeps_current_build() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let _build = server
        .mock("GET", "/download/9.9.9/sandman")
        .with_body("<html>maintenance</html>")
        .create();
    let _checksums = no_checksums(&mut server);
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("The file is corrupted"))
        .stderr(predicate::str::contains("Please re-run the self-update command"));

    assert_eq!(install.executable_contents(), fake_executable("current"));
    assert!(!install.executable.with_file_name("sandman-temp").exists());
    assert!(backups(&install).is_empty());
}

#[test]
fn test_failed_download_exits_with_error() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let _build = server.mock("GET", "/download/9.9.9/sandman").with_status(404).create();
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("download of the new sandman version failed"));

    assert_eq!(install.executable_contents(), fake_executable("current"));
}

#[test]
fn test_clean_backups_leaves_only_new_backup() {
    let install = TestInstallation::new("current");
    install.add_backup("1969-01-01_00-00-00-0.0.1", "ancient");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let _build = server
        .mock("GET", "/download/9.9.9/sandman")
        .with_body(fake_executable("9.9.9"))
        .create();
    let _checksums = no_checksums(&mut server);
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .args(["self-update", "--clean-backups"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Removing: "));

    assert_eq!(backups(&install), vec![BackupStore::backup_name(&ReleaseInfo::current())]);
}

#[test]
fn test_unreachable_checksum_rejects_update() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let _build = server
        .mock("GET", "/download/9.9.9/sandman")
        .with_body(fake_executable("9.9.9"))
        .create();
    let _checksum = server.mock("GET", "/download/9.9.9/sandman.sha256").with_status(503).create();
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not be fetched"))
        .stderr(predicate::str::contains("Please re-run the self-update command"));

    assert_eq!(install.executable_contents(), fake_executable("current"));
    assert!(!install.executable.with_file_name("sandman-temp").exists());
    assert!(backups(&install).is_empty());
}

#[test]
fn test_unreachable_server_is_fatal() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_status(503).create();
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Network error"));

    assert_eq!(install.executable_contents(), fake_executable("current"));
}

#[test]
fn test_missing_executable_fails_before_network() {
    let install = TestInstallation::new("current");
    std::fs::remove_file(&install.executable).unwrap();
    let mut server = Server::new();
    let version = server.mock("GET", "/version").expect(0).create();
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("could not be written"));

    version.assert();
}

#[test]
fn test_quiet_suppresses_progress() {
    let install = TestInstallation::new("current");
    let mut server = Server::new();
    let _version = server.mock("GET", "/version").with_body("9.9.9").create();
    let _build = server
        .mock("GET", "/download/9.9.9/sandman")
        .with_body(fake_executable("9.9.9"))
        .create();
    let _checksums = no_checksums(&mut server);
    let config = write_config(&install, &server.url());

    sandman_command(&install, &config)
        .args(["--quiet", "self-update"])
        .assert()
        .success()
        .stdout(predicate::str::is_empty());

    assert_eq!(install.executable_contents(), fake_executable("9.9.9"));
}

#[test]
fn test_invalid_config_is_fatal() {
    let install = TestInstallation::new("current");
    let config = install.cache.join("broken.toml");
    std::fs::write(&config, "[upgrade\nsecure = ").unwrap();

    sandman_command(&install, &config)
        .arg("self-update")
        .assert()
        .code(1)
        .stderr(predicate::str::contains("TOML"));
}
