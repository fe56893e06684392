//! URL readiness polling.
//!
//! Issues GETs until the target answers with a status in `[200, 400)` or
//! the overall deadline passes. Failed attempts back off exponentially; the
//! deadline is only checked before an attempt, so the final sleep may run
//! past it.

use std::time::Duration;

use reqwest::redirect::Policy;
use thiserror::Error;
use tokio::time::Instant;
use tracing::debug;

use crate::backoff::Backoff;

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(5);

/// Why a single attempt did not count as ready
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    #[error("Status {0}")]
    Status(u16),

    #[error("Request timeout")]
    Timeout,

    #[error("{0}")]
    Request(String),
}

#[derive(Error, Debug)]
pub enum PollError {
    #[error("Invalid URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Client(#[from] reqwest::Error),

    #[error("URL not ready after {}s ({attempts} attempts)", .timeout.as_secs())]
    Timeout {
        timeout: Duration,
        attempts: u32,
        last_failure: Option<AttemptFailure>,
    },
}

#[derive(Debug, Clone)]
pub struct PollConfig {
    pub url: String,

    /// Overall deadline
    pub timeout: Duration,

    /// Deadline for each individual request
    pub request_timeout: Duration,

    pub backoff: Backoff,
}

impl PollConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            timeout: DEFAULT_TIMEOUT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            backoff: Backoff::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Successful outcome of [`UrlPoller::wait`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Readiness {
    pub attempts: u32,
    pub elapsed: Duration,
    pub status: u16,
}

/// Reported after every failed attempt, before the backoff sleep
#[derive(Debug, Clone)]
pub struct Progress<'a> {
    pub url: &'a str,
    pub attempt: u32,
    pub elapsed: Duration,
    pub timeout: Duration,
    pub failure: &'a AttemptFailure,
}

impl Progress<'_> {
    pub fn elapsed_secs(&self) -> i64 {
        self.elapsed.as_secs_f64().round() as i64
    }

    /// Whole seconds left, negative once the deadline has passed
    pub fn remaining_secs(&self) -> i64 {
        (self.timeout.as_secs_f64() - self.elapsed.as_secs_f64()).round() as i64
    }

    /// Single status line, meant to be rewritten in place with `\r`
    pub fn render(&self) -> String {
        format!(
            "⏳ Waiting for {}... ({}s elapsed, {}s remaining)",
            self.url,
            self.elapsed_secs(),
            self.remaining_secs()
        )
    }
}

pub struct UrlPoller {
    client: reqwest::Client,
    config: PollConfig,
}

impl UrlPoller {
    pub fn new(config: PollConfig) -> Result<Self, PollError> {
        let parsed = reqwest::Url::parse(&config.url).map_err(|e| PollError::InvalidUrl {
            url: config.url.clone(),
            reason: e.to_string(),
        })?;

        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(PollError::InvalidUrl {
                url: config.url.clone(),
                reason: format!("unsupported scheme '{}'", parsed.scheme()),
            });
        }

        // Redirects are not followed: a 3xx already proves the server is up.
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client, config })
    }

    /// One GET against the target
    pub async fn check(&self) -> Result<u16, AttemptFailure> {
        match self.client.get(&self.config.url).send().await {
            Ok(resp) => {
                let status = resp.status().as_u16();
                if (200..400).contains(&status) {
                    Ok(status)
                } else {
                    Err(AttemptFailure::Status(status))
                }
            }
            Err(e) if e.is_timeout() => Err(AttemptFailure::Timeout),
            Err(e) => Err(AttemptFailure::Request(e.to_string())),
        }
    }

    pub async fn wait(&self) -> Result<Readiness, PollError> {
        self.wait_with(|_| {}).await
    }

    /// Poll until ready, calling `on_retry` after each failed attempt.
    pub async fn wait_with<F>(&self, mut on_retry: F) -> Result<Readiness, PollError>
    where
        F: FnMut(&Progress<'_>),
    {
        let start = Instant::now();
        let mut backoff = self.config.backoff.clone();
        let mut attempts = 0u32;
        let mut last_failure = None;

        while start.elapsed() < self.config.timeout {
            attempts += 1;

            match self.check().await {
                Ok(status) => {
                    return Ok(Readiness {
                        attempts,
                        elapsed: start.elapsed(),
                        status,
                    });
                }
                Err(failure) => {
                    debug!(attempt = attempts, "{} not ready: {}", self.config.url, failure);

                    on_retry(&Progress {
                        url: &self.config.url,
                        attempt: attempts,
                        elapsed: start.elapsed(),
                        timeout: self.config.timeout,
                        failure: &failure,
                    });

                    last_failure = Some(failure);
                    tokio::time::sleep(backoff.next_delay()).await;
                }
            }
        }

        Err(PollError::Timeout {
            timeout: self.config.timeout,
            attempts,
            last_failure,
        })
    }
}
