//! Demo app E2E test framework
//!
//! Drives a real browser against the demo app from Rust:
//! - Spawns the web server as a subprocess (or targets a running one)
//! - Controls Playwright through a Node.js bridge process
//! - Parses declarative YAML scenarios
//! - Provides the login helpers used by scenarios and tests
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                    E2E Test Runner (Rust)                   │
//! ├─────────────────────────────────────────────────────────────┤
//! │  TestRunner                                                 │
//! │    ├── start_server() -> ServerHandle (health via poller)   │
//! │    ├── run_scenario(scenario) -> TestResult                 │
//! │    │     └── BrowserSession (node + playwright, JSON lines) │
//! │    └── write_results() -> test-results.json                 │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Scenario (YAML)                                            │
//! │    ├── name, description, tags, viewport                    │
//! │    └── steps: [TestStep]                                    │
//! │          ├── navigate / fill / click / wait_for_url         │
//! │          ├── expect_url / expect_visible / expect_text      │
//! │          ├── expect_status / expect_json                    │
//! │          └── login / login_as_default_user / logout         │
//! └─────────────────────────────────────────────────────────────┘
//! ```

pub mod error;
pub mod helpers;
pub mod playwright;
pub mod runner;
pub mod server;
pub mod spec;

pub use error::{E2eError, E2eResult};
pub use helpers::{is_logged_in, login, login_as_default_user, logout, probe_logged_in, ProbeOutcome};
pub use playwright::{BrowserSession, PlaywrightConfig, UrlMatch};
pub use runner::{RunnerConfig, Target, TestRunner};
pub use spec::{Scenario, TestStep};
