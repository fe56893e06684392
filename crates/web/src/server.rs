//! Web server implementation

use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};

use crate::auth::{CredentialPolicy, LoginForm};
use crate::config::WebServerConfig;
use crate::pages;
use crate::session::{InMemorySessionStore, SessionStore, SessionStoreError};

/// Web server state
#[derive(Clone)]
pub struct WebServer {
    state: Arc<WebServerState>,
    cfg: WebServerConfig,
}

struct WebServerState {
    sessions: Arc<dyn SessionStore>,
    credentials: CredentialPolicy,
}

pub async fn serve(cfg: WebServerConfig) -> anyhow::Result<()> {
    let addr = cfg.addr;
    WebServer::new(cfg).serve(addr).await
}

impl WebServer {
    /// Create a server backed by an in-memory session store
    pub fn new(cfg: WebServerConfig) -> Self {
        Self::with_store(cfg, Arc::new(InMemorySessionStore::new()))
    }

    /// Create a server with a caller-provided session store
    pub fn with_store(cfg: WebServerConfig, sessions: Arc<dyn SessionStore>) -> Self {
        Self {
            state: Arc::new(WebServerState {
                sessions,
                credentials: cfg.credentials.clone(),
            }),
            cfg,
        }
    }

    /// Create router
    pub fn router(&self) -> Router {
        Router::new()
            .route("/", get(index_handler))
            .route("/login", get(login_page_handler))
            .route("/api/login", post(login_handler))
            .route("/dashboard", get(dashboard_handler))
            .route("/logout", get(logout_handler))
            .route("/about", get(about_handler))
            .route("/health", get(health_handler))
            // Anything else comes from the public directory, if present
            .fallback_service(ServeDir::new(&self.cfg.public_dir))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the web server
    pub async fn serve(self, addr: SocketAddr) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;

        info!("Demo app listening on http://localhost:{}", local.port());
        info!("Environment: {}", self.cfg.environment);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        info!("Demo app stopped");
        Ok(())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("failed to listen for ctrl-c: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                warn!("failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }

    info!("Received shutdown signal");
}

// ============================================================================
// Handlers
// ============================================================================

/// `?session=<id>`; a missing or malformed query is the same as no session
#[derive(Debug, Deserialize)]
struct SessionQuery {
    session: Option<String>,
}

fn session_id(query: Option<Query<SessionQuery>>) -> Option<String> {
    query.and_then(|Query(q)| q.session)
}

/// 302, as browsers and the E2E helpers expect from a form post
fn found(location: &str) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location.to_string())]).into_response()
}

fn store_error(e: SessionStoreError) -> Response {
    error!("session store error: {}", e);
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error").into_response()
}

async fn index_handler() -> Html<String> {
    Html(pages::index())
}

async fn login_page_handler() -> Html<String> {
    Html(pages::login())
}

async fn about_handler() -> Html<String> {
    Html(pages::about())
}

async fn login_handler(
    State(state): State<Arc<WebServerState>>,
    LoginForm(creds): LoginForm,
) -> Response {
    if !state.credentials.accepts(&creds) {
        return (StatusCode::UNAUTHORIZED, Html(pages::login_failed())).into_response();
    }

    match state.sessions.create(&creds.username).await {
        Ok(session) => found(&format!("/dashboard?session={}", session.id)),
        Err(e) => store_error(e),
    }
}

async fn dashboard_handler(
    State(state): State<Arc<WebServerState>>,
    query: Option<Query<SessionQuery>>,
) -> Response {
    let Some(id) = session_id(query) else {
        return found("/login");
    };

    match state.sessions.get(&id).await {
        Ok(Some(session)) => Html(pages::dashboard(&session)).into_response(),
        Ok(None) => found("/login"),
        Err(e) => store_error(e),
    }
}

async fn logout_handler(
    State(state): State<Arc<WebServerState>>,
    query: Option<Query<SessionQuery>>,
) -> Response {
    if let Some(id) = session_id(query) {
        if let Err(e) = state.sessions.delete(&id).await {
            return store_error(e);
        }
    }
    found("/")
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
    timestamp: String,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
    })
}
