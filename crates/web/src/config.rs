//! Web server configuration, read from the environment.

use anyhow::Context;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use crate::auth::CredentialPolicy;

pub const DEFAULT_PORT: u16 = 3000;
pub const DEFAULT_ENVIRONMENT: &str = "development";
pub const DEFAULT_PUBLIC_DIR: &str = "public";

#[derive(Debug, Clone)]
pub struct WebServerConfig {
    /// Listen address (`HOST`, `PORT`)
    pub addr: SocketAddr,

    /// Deployment label from `NODE_ENV`; only logged
    pub environment: String,

    /// Directory served for paths no route matches (`PUBLIC_DIR`)
    pub public_dir: PathBuf,

    /// Accepted test-user credentials (`E2E_USER`, `E2E_PASS`)
    pub credentials: CredentialPolicy,
}

impl Default for WebServerConfig {
    fn default() -> Self {
        Self {
            addr: SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), DEFAULT_PORT),
            environment: DEFAULT_ENVIRONMENT.to_string(),
            public_dir: PathBuf::from(DEFAULT_PUBLIC_DIR),
            credentials: CredentialPolicy::default(),
        }
    }
}

impl WebServerConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let var = |key: &str| {
            lookup(key)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let defaults = Self::default();

        let host: IpAddr = match var("HOST") {
            Some(host) => host
                .parse()
                .with_context(|| format!("HOST is not an IP address: {}", host))?,
            None => defaults.addr.ip(),
        };

        let port: u16 = match var("PORT") {
            Some(port) => port
                .parse()
                .with_context(|| format!("PORT is not a valid port number: {}", port))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            addr: SocketAddr::new(host, port),
            environment: var("NODE_ENV").unwrap_or(defaults.environment),
            public_dir: var("PUBLIC_DIR").map(PathBuf::from).unwrap_or(defaults.public_dir),
            credentials: CredentialPolicy::from_lookup(&lookup),
        })
    }
}
