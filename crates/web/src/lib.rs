//! Demo web app
//!
//! Serves a handful of static pages plus a login flow backed by an
//! in-memory session store. Session identifiers travel in the `session`
//! query parameter; there are no cookies.

pub mod auth;
pub mod config;
pub mod pages;
pub mod server;
pub mod session;

pub use auth::CredentialPolicy;
pub use config::WebServerConfig;
pub use server::WebServer;
pub use session::{InMemorySessionStore, Session, SessionStore, SessionStoreError};
