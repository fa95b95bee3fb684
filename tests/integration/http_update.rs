use mockito::{Matcher, Server};
use serial_test::serial;
use sandman::test_utils::{TestInstallation, fake_executable, init_test_logging};
use sandman::upgrade::remote::{DistributionEndpoint, HttpFetcher};
use sandman::upgrade::report::ConsoleReporter;
use sandman::upgrade::verification::{ChecksumVerifier, ExecutableValidator};
use sandman::upgrade::version::ReleaseInfo;
use sandman::upgrade::{SelfUpdater, UpdateOptions, UpdateOutcome};
use std::time::Duration;

fn updater(
    install: &TestInstallation,
    server_url: &str,
) -> SelfUpdater<HttpFetcher, ExecutableValidator, ConsoleReporter> {
    SelfUpdater::new(
        install.executable.clone(),
        install.home.clone(),
        install.cache.clone(),
        DistributionEndpoint::new(server_url, true, "sandman"),
        HttpFetcher::new(Duration::from_secs(5)).unwrap(),
        ExecutableValidator,
        ConsoleReporter::new(true),
    )
    .with_release(ReleaseInfo::new("1.0.0", "2024-01-01 00:00:00"))
}

async fn sha256_of(bytes: &[u8]) -> String {
    let dir = tempfile::TempDir::new().unwrap();
    let path = dir.path().join("artifact");
    std::fs::write(&path, bytes).unwrap();
    ChecksumVerifier::compute_sha256(&path).await.unwrap()
}

#[tokio::test]
#[serial]
async fn test_update_verifies_published_checksum() {
    init_test_logging(None);
    let install = TestInstallation::new("1.0.0");
    let payload = fake_executable("1.1.0");
    let digest = sha256_of(&payload).await;

    let mut server = Server::new_async().await;
    let _version = server.mock("GET", "/version").with_body("1.1.0").create_async().await;
    let _build = server
        .mock("GET", "/download/1.1.0/sandman")
        .with_body(&payload)
        .create_async()
        .await;
    let checksum = server
        .mock("GET", "/download/1.1.0/sandman.sha256")
        .with_body(format!("{digest}  sandman\n"))
        .expect(1)
        .create_async()
        .await;

    let outcome =
        updater(&install, &server.url()).run_update(None, UpdateOptions::default()).await.unwrap();

    checksum.assert_async().await;
    assert!(matches!(outcome, UpdateOutcome::Updated { .. }));
    assert_eq!(install.executable_contents(), payload);
    assert!(install.home.join("2024-01-01_00-00-00-1.0.0-old.bin").exists());
}

#[tokio::test]
#[serial]
async fn test_checksum_mismatch_keeps_current_build() {
    let install = TestInstallation::new("1.0.0");
    let mut server = Server::new_async().await;
    let _version = server.mock("GET", "/version").with_body("1.1.0").create_async().await;
    let _build = server
        .mock("GET", "/download/1.1.0/sandman")
        .with_body(fake_executable("tampered"))
        .create_async()
        .await;
    let _checksum = server
        .mock("GET", "/download/1.1.0/sandman.sha256")
        .with_body("f".repeat(64))
        .create_async()
        .await;

    let outcome =
        updater(&install, &server.url()).run_update(None, UpdateOptions::default()).await.unwrap();

    assert!(matches!(outcome, UpdateOutcome::Corrupted { .. }));
    assert_eq!(outcome.exit_code(), 1);
    assert_eq!(install.executable_contents(), fake_executable("1.0.0"));
    assert!(!install.executable.with_file_name("sandman-temp").exists());
}

#[tokio::test]
#[serial]
async fn test_latest_content_id_downloads_root_build() {
    let sha = "89abcdef0123456789abcdef0123456789abcdef";
    let install = TestInstallation::new("1.0.0");
    let mut server = Server::new_async().await;
    let _version = server.mock("GET", "/version").with_body(sha).create_async().await;
    let build = server
        .mock("GET", "/sandman")
        .with_body(fake_executable("dev"))
        .expect(1)
        .create_async()
        .await;
    let _checksum = server
        .mock("GET", Matcher::Regex(r"\.sha256$".into()))
        .with_status(404)
        .create_async()
        .await;

    let outcome =
        updater(&install, &server.url()).run_update(None, UpdateOptions::default()).await.unwrap();

    build.assert_async().await;
    assert_eq!(outcome.exit_code(), 0);
    assert_eq!(install.executable_contents(), fake_executable("dev"));
}
