//! Demo app command-line utilities
//!
//! The library half holds the URL readiness poller so the E2E runner can
//! wait for a freshly spawned server the same way `wait-for-url` does.

pub mod backoff;
pub mod poll;

pub use backoff::Backoff;
pub use poll::{AttemptFailure, PollConfig, PollError, Progress, Readiness, UrlPoller};
