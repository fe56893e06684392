//! Readiness poller tests against a local axum server.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::{extract::State, http::StatusCode, response::Redirect, routing::get, Router};
use demoapp_cli::{AttemptFailure, PollConfig, PollError, UrlPoller};

async fn spawn_server() -> SocketAddr {
    let hits = Arc::new(AtomicUsize::new(0));

    let app = Router::new()
        .route("/ok", get(|| async { "ready" }))
        .route("/unavailable", get(|| async { StatusCode::SERVICE_UNAVAILABLE }))
        .route("/moved", get(|| async { Redirect::to("/unavailable") }))
        .route(
            "/hang",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(30)).await;
                "late"
            }),
        )
        .route(
            "/flaky",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                // 503 twice, then OK
                if hits.fetch_add(1, Ordering::SeqCst) < 2 {
                    StatusCode::SERVICE_UNAVAILABLE
                } else {
                    StatusCode::OK
                }
            }),
        )
        .with_state(hits);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn poller(url: String, timeout: Duration) -> UrlPoller {
    UrlPoller::new(PollConfig::new(url).with_timeout(timeout)).unwrap()
}

#[tokio::test]
async fn ready_on_first_attempt() {
    let addr = spawn_server().await;

    let ready = poller(format!("http://{}/ok", addr), Duration::from_secs(5))
        .wait()
        .await
        .unwrap();

    assert_eq!(ready.attempts, 1);
    assert_eq!(ready.status, 200);
}

#[tokio::test]
async fn ready_after_failures_with_progress() {
    let addr = spawn_server().await;
    let mut seen = Vec::new();

    let ready = poller(format!("http://{}/flaky", addr), Duration::from_secs(10))
        .wait_with(|progress| {
            seen.push((progress.attempt, progress.failure.clone()));
            assert!(progress.render().starts_with("⏳ Waiting for http://"));
        })
        .await
        .unwrap();

    assert_eq!(ready.attempts, 3);
    assert_eq!(
        seen,
        vec![(1, AttemptFailure::Status(503)), (2, AttemptFailure::Status(503))]
    );
    // 500ms + 750ms of backoff
    assert!(ready.elapsed >= Duration::from_millis(1250));
}

#[tokio::test]
async fn redirect_counts_as_ready() {
    let addr = spawn_server().await;

    let ready = poller(format!("http://{}/moved", addr), Duration::from_secs(5))
        .wait()
        .await
        .unwrap();

    assert_eq!(ready.attempts, 1);
    assert_eq!(ready.status, 303);
}

#[tokio::test]
async fn times_out_on_persistent_errors() {
    let addr = spawn_server().await;
    let started = std::time::Instant::now();

    let err = poller(format!("http://{}/unavailable", addr), Duration::from_secs(2))
        .wait()
        .await
        .unwrap_err();

    // attempts at ~0s, 0.5s and 1.25s; the sleep after the third runs past 2s
    match err {
        PollError::Timeout {
            timeout,
            attempts,
            last_failure,
        } => {
            assert_eq!(timeout, Duration::from_secs(2));
            assert_eq!(attempts, 3);
            assert_eq!(last_failure, Some(AttemptFailure::Status(503)));
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    let elapsed = started.elapsed();
    assert!(elapsed >= Duration::from_secs(2), "{:?}", elapsed);
    assert!(elapsed < Duration::from_secs(4), "{:?}", elapsed);
}

#[tokio::test]
async fn hung_requests_time_out_individually() {
    let addr = spawn_server().await;
    let started = std::time::Instant::now();

    let mut config =
        PollConfig::new(format!("http://{}/hang", addr)).with_timeout(Duration::from_secs(1));
    config.request_timeout = Duration::from_millis(300);

    let err = UrlPoller::new(config).unwrap().wait().await.unwrap_err();

    match err {
        PollError::Timeout {
            attempts,
            last_failure,
            ..
        } => {
            assert!(attempts > 1, "attempts = {}", attempts);
            assert_eq!(last_failure, Some(AttemptFailure::Timeout));
        }
        other => panic!("expected timeout, got {:?}", other),
    }

    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn connection_refused_is_retried() {
    let port = {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        listener.local_addr().unwrap().port()
    };

    let err = poller(format!("http://127.0.0.1:{}/", port), Duration::from_secs(1))
        .wait()
        .await
        .unwrap_err();

    match err {
        PollError::Timeout {
            attempts,
            last_failure,
            ..
        } => {
            assert_eq!(attempts, 2);
            assert!(matches!(last_failure, Some(AttemptFailure::Request(_))));
        }
        other => panic!("expected timeout, got {:?}", other),
    }
}

async fn run_binary(args: &[&str]) -> std::process::Output {
    tokio::process::Command::new(env!("CARGO_BIN_EXE_wait-for-url"))
        .args(args)
        .output()
        .await
        .unwrap()
}

#[tokio::test]
async fn binary_exits_zero_when_ready() {
    let addr = spawn_server().await;
    let url = format!("http://{}/ok", addr);

    let out = run_binary(&[&url, "5"]).await;
    assert_eq!(out.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert_eq!(
        stdout,
        format!("⏳ Waiting for {} (timeout: 5s)...\n✅ URL is ready after 1 attempts (0s)\n", url)
    );
}

#[tokio::test]
async fn binary_ends_progress_line_before_success() {
    let addr = spawn_server().await;
    let url = format!("http://{}/flaky", addr);

    let out = run_binary(&[&url, "10"]).await;
    assert_eq!(out.status.code(), Some(0));

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(&format!("\r⏳ Waiting for {}...", url)), "{}", stdout);
    assert!(stdout.contains("s remaining)\n✅ URL is ready after 3 attempts"), "{}", stdout);
}

#[tokio::test]
async fn binary_exits_one_on_timeout() {
    let addr = spawn_server().await;
    let url = format!("http://{}/unavailable", addr);

    let out = run_binary(&[&url, "1"]).await;
    assert_eq!(out.status.code(), Some(1));

    let stderr = String::from_utf8_lossy(&out.stderr);
    assert!(stderr.contains("❌ Timeout: URL not ready after 1s"), "{}", stderr);

    let stdout = String::from_utf8_lossy(&out.stdout);
    assert!(stdout.contains(&format!("\r⏳ Waiting for {}... (", url)));
}

#[tokio::test]
async fn binary_quiet_suppresses_progress() {
    let addr = spawn_server().await;
    let url = format!("http://{}/unavailable", addr);

    let out = run_binary(&["--quiet", &url, "1"]).await;
    assert_eq!(out.status.code(), Some(1));
    assert!(!String::from_utf8_lossy(&out.stdout).contains("elapsed"));
}

#[tokio::test]
async fn binary_usage_errors_exit_one() {
    let out = run_binary(&[]).await;
    assert_eq!(out.status.code(), Some(1));

    let out = run_binary(&["http://localhost:3000", "soon"]).await;
    assert_eq!(out.status.code(), Some(1));

    let out = run_binary(&["--help"]).await;
    assert_eq!(out.status.code(), Some(0));
}
