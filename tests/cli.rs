mod support;

use std::{path::Path, process::Command, sync::Arc};

use portfolio_client::{FileStore, LoginRequest};
use support::{FakeBackend, client_with_store};

fn run_portfolio(api_url: &str, state_dir: &Path, args: &[&str]) -> (bool, String) {
    let output = Command::new(env!("CARGO_BIN_EXE_portfolio"))
        .arg("--api-url")
        .arg(api_url)
        .args(args)
        .env("PORTFOLIO_STATE_DIR", state_dir)
        .env("RUST_LOG", "off")
        .output()
        .unwrap();
    (
        output.status.success(),
        String::from_utf8_lossy(&output.stdout).into_owned(),
    )
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn whoami_prints_the_restored_user() {
    let backend = FakeBackend::new();
    backend.seed_account("admin@example.com", "secret", "Ada", "admin");
    let dir = tempfile::tempdir().unwrap();
    let client = client_with_store(&backend, Arc::new(FileStore::open(dir.path()).unwrap())).await;
    client
        .session()
        .login(&LoginRequest::new("admin@example.com", "secret"))
        .await
        .unwrap();
    let api_url = client.config().api_url.clone();
    let state_dir = dir.path().to_path_buf();

    let (ok, stdout) =
        tokio::task::spawn_blocking(move || run_portfolio(&api_url, &state_dir, &["whoami"]))
            .await
            .unwrap();

    assert!(ok, "whoami failed: {stdout}");
    assert!(stdout.contains("Ada <admin@example.com>"));
    assert!(stdout.contains("role: admin"));
    assert!(stdout.contains("admin: true"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn whoami_without_session_reports_signed_out() {
    let backend = FakeBackend::new();
    let api_url = backend.spawn().await;
    let dir = tempfile::tempdir().unwrap();
    let state_dir = dir.path().to_path_buf();

    let (ok, stdout) =
        tokio::task::spawn_blocking(move || run_portfolio(&api_url, &state_dir, &["whoami"]))
            .await
            .unwrap();

    assert!(ok);
    assert!(stdout.contains("not signed in"));
    assert!(backend.requests().is_empty());
}
