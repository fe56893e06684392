//! Shared pieces of the demo app workspace.
//!
//! The web server renders markup that the E2E harness locates by
//! `data-testid`, and both sides agree on the default test user.

pub mod credentials;
pub mod testid;

pub use credentials::Credentials;
