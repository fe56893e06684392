//! Shared fixtures: an in-process demo app and browser sessions against it.

#![allow(dead_code)]

use std::path::PathBuf;

use demoapp_e2e::{BrowserSession, PlaywrightConfig};
use demoapp_web::{CredentialPolicy, WebServer, WebServerConfig};

/// Serve the demo app on an ephemeral port; returns its base URL
pub async fn spawn_app() -> String {
    let cfg = WebServerConfig {
        credentials: CredentialPolicy::from_lookup(|key| std::env::var(key).ok()),
        ..Default::default()
    };
    let router = WebServer::new(cfg).router();

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    format!("http://{}", addr)
}

/// HTTP client that reports redirects instead of following them
pub fn http_client() -> reqwest::Client {
    reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .unwrap()
}

pub fn location(resp: &reqwest::Response) -> String {
    resp.headers()
        .get(reqwest::header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Where `npm install playwright` was run; the workspace root unless
/// `PLAYWRIGHT_NODE_DIR` says otherwise
pub fn node_dir() -> PathBuf {
    std::env::var("PLAYWRIGHT_NODE_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../.."))
}

pub async fn browser(base_url: &str) -> BrowserSession {
    BrowserSession::launch(PlaywrightConfig {
        base_url: base_url.to_string(),
        node_dir: node_dir(),
        ..Default::default()
    })
    .await
    .expect("launch browser (needs node and the playwright package)")
}
