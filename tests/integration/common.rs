use assert_cmd::Command;
use sandman::test_utils::TestInstallation;
use std::path::{Path, PathBuf};

/// A `sandman` command pointed at `install`.
///
/// The executable, home and cache directories come from the environment, and
/// the config file is isolated so the developer's own config never leaks in.
pub fn sandman_command(install: &TestInstallation, config: &Path) -> Command {
    let mut cmd = Command::cargo_bin("sandman").unwrap();
    cmd.env("SANDMAN_SELF_PATH", &install.executable)
        .env("SANDMAN_HOME", &install.home)
        .env("SANDMAN_CACHE_DIR", &install.cache)
        .env("SANDMAN_CONFIG", config)
        .env_remove("RUST_LOG");
    cmd
}

/// Write a config file serving builds from `server_url` next to `install`.
pub fn write_config(install: &TestInstallation, server_url: &str) -> PathBuf {
    let path = install.cache.join("config.toml");
    std::fs::write(
        &path,
        format!(
            "[upgrade]\ndistribution_host = \"{server_url}\"\nhttp_timeout_secs = 5\nartifact_name = \"sandman\"\n"
        ),
    )
    .unwrap();
    path
}

/// Answer checksum requests with 404, like a server that publishes none.
pub fn no_checksums(server: &mut mockito::Server) -> mockito::Mock {
    server.mock("GET", mockito::Matcher::Regex(r"\.sha256$".into())).with_status(404).create()
}

/// Names of all backups in `install`, sorted.
pub fn backups(install: &TestInstallation) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(&install.home)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with("-old.bin"))
        .collect();
    names.sort();
    names
}
