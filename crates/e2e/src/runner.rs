//! Main test runner that orchestrates the server, Playwright and scenarios

use std::path::PathBuf;
use std::time::{Duration, Instant};

use demoapp_common::Credentials;
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::error::{E2eError, E2eResult};
use crate::helpers;
use crate::playwright::{BrowserSession, PlaywrightConfig};
use crate::server::{ServerConfig, ServerHandle};
use crate::spec::{expand, Scenario, TestStep};

/// Result of executing a single step
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StepResult {
    pub step_name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub error: Option<String>,
}

/// Result of running a single scenario
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestResult {
    pub name: String,
    pub success: bool,
    pub duration_ms: u64,
    pub steps: Vec<StepResult>,
    pub error: Option<String>,
}

/// Result of running all scenarios
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TestSuiteResult {
    pub total: usize,
    pub passed: usize,
    pub failed: usize,
    pub duration_ms: u64,
    pub results: Vec<TestResult>,
}

impl TestSuiteResult {
    pub fn success(&self) -> bool {
        self.failed == 0
    }
}

/// Where the app under test comes from
#[derive(Debug, Clone)]
pub enum Target {
    /// Already running at this base URL
    External(String),

    /// Spawned by the runner
    Spawn(ServerConfig),
}

/// Configuration for the test runner
#[derive(Debug, Clone)]
pub struct RunnerConfig {
    pub target: Target,
    pub playwright: PlaywrightConfig,
    pub scenarios_dir: PathBuf,
    pub output_dir: PathBuf,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            target: Target::Spawn(ServerConfig::default()),
            playwright: PlaywrightConfig::default(),
            scenarios_dir: PathBuf::from("crates/e2e/scenarios"),
            output_dir: PathBuf::from("test-results"),
        }
    }
}

/// Main E2E test runner
pub struct TestRunner {
    config: RunnerConfig,

    /// Running server handle (if spawned)
    server: Option<ServerHandle>,

    /// Default test user, for `${E2E_USER}` / `${E2E_PASS}`
    credentials: Credentials,
}

impl TestRunner {
    pub fn new(config: RunnerConfig) -> Self {
        Self {
            config,
            server: None,
            credentials: Credentials::from_env(),
        }
    }

    /// Make sure the app is reachable; returns its base URL
    pub async fn start_server(&mut self) -> E2eResult<String> {
        match &self.config.target {
            Target::External(url) => Ok(url.trim_end_matches('/').to_string()),
            Target::Spawn(server_config) => {
                if let Some(server) = &self.server {
                    return Ok(server.base_url().to_string());
                }
                let server = ServerHandle::spawn(server_config.clone()).await?;
                let base_url = server.base_url().to_string();
                self.server = Some(server);
                Ok(base_url)
            }
        }
    }

    /// Stop the server
    pub async fn stop_server(&mut self) -> E2eResult<()> {
        if let Some(mut server) = self.server.take() {
            server.stop().await?;
        }
        Ok(())
    }

    pub fn load_scenarios(&self) -> E2eResult<Vec<Scenario>> {
        Scenario::load_all(&self.config.scenarios_dir)
    }

    pub async fn run_all(&mut self) -> E2eResult<TestSuiteResult> {
        let scenarios = self.load_scenarios()?;
        self.run_scenarios(&scenarios).await
    }

    /// Run scenarios carrying a tag
    pub async fn run_tagged(&mut self, tag: &str) -> E2eResult<TestSuiteResult> {
        let scenarios: Vec<Scenario> = self
            .load_scenarios()?
            .into_iter()
            .filter(|s| s.has_tag(tag))
            .collect();
        self.run_scenarios(&scenarios).await
    }

    /// Run one scenario by name
    pub async fn run_named(&mut self, name: &str) -> E2eResult<TestSuiteResult> {
        let scenario = self
            .load_scenarios()?
            .into_iter()
            .find(|s| s.name == name)
            .ok_or_else(|| E2eError::SpecParse(format!("Scenario not found: {}", name)))?;
        self.run_scenarios(std::slice::from_ref(&scenario)).await
    }

    pub async fn run_scenarios(&mut self, scenarios: &[Scenario]) -> E2eResult<TestSuiteResult> {
        let start = Instant::now();
        let mut results = Vec::new();
        let mut passed = 0;
        let mut failed = 0;

        let base_url = self.start_server().await?;

        info!("Running {} scenario(s) against {}", scenarios.len(), base_url);

        for scenario in scenarios {
            let result = self.run_scenario(&base_url, scenario).await?;
            if result.success {
                passed += 1;
                info!("✓ {} ({} ms)", result.name, result.duration_ms);
            } else {
                failed += 1;
                error!(
                    "✗ {} - {}",
                    result.name,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
            results.push(result);
        }

        let duration_ms = start.elapsed().as_millis() as u64;

        info!(
            "Test Results: {} passed, {} failed ({} ms)",
            passed, failed, duration_ms
        );

        Ok(TestSuiteResult {
            total: scenarios.len(),
            passed,
            failed,
            duration_ms,
            results,
        })
    }

    /// Run one scenario in a fresh browser. Step failures end the scenario and
    /// are reported in the result; failing to launch the browser is an error.
    pub async fn run_scenario(&self, base_url: &str, scenario: &Scenario) -> E2eResult<TestResult> {
        let start = Instant::now();
        debug!("Running scenario: {}", scenario.name);

        let mut pw_config = self.config.playwright.clone();
        pw_config.base_url = base_url.to_string();
        pw_config.viewport = scenario.viewport;

        let mut session = BrowserSession::launch(pw_config).await?;

        let mut steps = Vec::new();
        let mut test_error = None;

        for step in &scenario.steps {
            let step_start = Instant::now();
            let outcome = execute_step(&mut session, step, &self.credentials).await;

            let error = outcome.err().map(|e| e.to_string());
            steps.push(StepResult {
                step_name: step.name(),
                success: error.is_none(),
                duration_ms: step_start.elapsed().as_millis() as u64,
                error: error.clone(),
            });

            if let Some(reason) = error {
                test_error = Some(format!("{}: {}", step.name(), reason));
                break;
            }
        }

        if let Err(e) = session.close().await {
            warn!("Failed to close browser: {}", e);
        }

        Ok(TestResult {
            name: scenario.name.clone(),
            success: test_error.is_none(),
            duration_ms: start.elapsed().as_millis() as u64,
            steps,
            error: test_error,
        })
    }

    /// Write test results to JSON file
    pub fn write_results(&self, results: &TestSuiteResult) -> E2eResult<PathBuf> {
        write_results(&self.config.output_dir, results)
    }
}

/// Write `test-results.json` into `output_dir`
pub fn write_results(output_dir: &std::path::Path, results: &TestSuiteResult) -> E2eResult<PathBuf> {
    std::fs::create_dir_all(output_dir)?;

    let path = output_dir.join("test-results.json");
    let json = serde_json::to_string_pretty(results)?;
    std::fs::write(&path, json)?;

    info!("Results written to: {}", path.display());
    Ok(path)
}

/// Execute one scenario step in a live session
pub async fn execute_step(session: &mut BrowserSession, step: &TestStep, creds: &Credentials) -> E2eResult<()> {
    match step {
        TestStep::Navigate { url } => {
            session.goto(url).await?;
        }
        TestStep::Fill { test_id, value } => {
            session.fill(test_id, &expand(value, creds)).await?;
        }
        TestStep::Click { test_id } => {
            session.click(test_id).await?;
        }
        TestStep::WaitForUrl { url, timeout_ms } => {
            session
                .wait_for_url(url, timeout_ms.map(Duration::from_millis))
                .await?;
        }
        TestStep::ExpectUrl { url } => {
            if let Err(e) = session.wait_for_url(url, None).await {
                if !e.is_timeout() {
                    return Err(e);
                }
                let actual = session.url().await.unwrap_or_default();
                return Err(E2eError::AssertionFailed(format!(
                    "expected URL {}, page is at {}",
                    url, actual
                )));
            }
        }
        TestStep::ExpectVisible { test_id } => {
            if let Err(e) = session.wait_for_test_id(test_id, None).await {
                if !e.is_timeout() {
                    return Err(e);
                }
                return Err(E2eError::AssertionFailed(format!("{} is not visible", test_id)));
            }
        }
        TestStep::ExpectText { test_id, text } => {
            let expected = normalize_whitespace(&expand(text, creds));
            expect_text(session, test_id, |actual| actual == expected, &format!("to be {:?}", expected)).await?;
        }
        TestStep::ExpectTextContains { test_id, text } => {
            let expected = normalize_whitespace(&expand(text, creds));
            expect_text(
                session,
                test_id,
                |actual| actual.contains(&expected),
                &format!("to contain {:?}", expected),
            )
            .await?;
        }
        TestStep::ExpectStatus { path, status } => {
            let response = session.request(path).await?;
            if response.status != *status {
                return Err(E2eError::AssertionFailed(format!(
                    "GET {} returned {}, expected {}",
                    path, response.status, status
                )));
            }
        }
        TestStep::ExpectJson { path, pointer, equals } => {
            let response = session.request(path).await?;
            if !response.is_ok() {
                return Err(E2eError::AssertionFailed(format!(
                    "GET {} returned {}",
                    path, response.status
                )));
            }
            let json = response.json()?;
            check_json(&json, pointer, equals.as_ref())
                .map_err(|reason| E2eError::AssertionFailed(format!("GET {}: {}", path, reason)))?;
        }
        TestStep::Login { username, password } => {
            let login_creds = Credentials::new(expand(username, creds), expand(password, creds));
            helpers::login(session, &login_creds).await?;
        }
        TestStep::LoginAsDefaultUser => {
            helpers::login(session, creds).await?;
        }
        TestStep::Logout => {
            helpers::logout(session).await?;
        }
        TestStep::ExpectLoggedIn { expected } => {
            let logged_in = helpers::is_logged_in(session).await;
            if logged_in != *expected {
                return Err(E2eError::AssertionFailed(format!(
                    "expected logged in = {}, was {}",
                    expected, logged_in
                )));
            }
        }
    }
    Ok(())
}

/// Poll an element's text until `check` passes or the session timeout runs out
async fn expect_text<F>(session: &mut BrowserSession, test_id: &str, check: F, expectation: &str) -> E2eResult<()>
where
    F: Fn(&str) -> bool,
{
    let deadline = Instant::now() + session.default_timeout();

    loop {
        let actual = match session.text(test_id).await {
            Ok(text) => normalize_whitespace(&text),
            Err(e) if e.is_timeout() => {
                return Err(E2eError::AssertionFailed(format!("{} is not on the page", test_id)));
            }
            Err(e) => return Err(e),
        };

        if check(&actual) {
            return Ok(());
        }

        if Instant::now() >= deadline {
            return Err(E2eError::AssertionFailed(format!(
                "expected {} {}, got {:?}",
                test_id, expectation, actual
            )));
        }

        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}

fn normalize_whitespace(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn check_json(json: &serde_json::Value, pointer: &str, equals: Option<&serde_json::Value>) -> Result<(), String> {
    let value = match json.pointer(pointer) {
        Some(serde_json::Value::Null) | None => return Err(format!("{} is missing", pointer)),
        Some(value) => value,
    };

    match equals {
        Some(expected) if value != expected => Err(format!("{} is {}, expected {}", pointer, value, expected)),
        _ => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_normalize_whitespace() {
        assert_eq!(
            normalize_whitespace("\n    This is a demo\n    application  "),
            "This is a demo application"
        );
    }

    #[test]
    fn test_check_json() {
        let health = json!({"status": "ok", "timestamp": "2024-05-01T12:30:00.000Z"});

        assert!(check_json(&health, "/status", Some(&json!("ok"))).is_ok());
        assert!(check_json(&health, "/timestamp", None).is_ok());
        assert!(check_json(&health, "/status", Some(&json!("down"))).is_err());
        assert!(check_json(&health, "/missing", None).is_err());
        assert!(check_json(&json!({"status": null}), "/status", None).is_err());
    }

    #[test]
    fn test_write_results() {
        let dir = tempfile::tempdir().unwrap();
        let results = TestSuiteResult {
            total: 1,
            passed: 0,
            failed: 1,
            duration_ms: 12,
            results: vec![TestResult {
                name: "auth-failed-login".to_string(),
                success: false,
                duration_ms: 12,
                steps: vec![StepResult {
                    step_name: "expect_visible:error-message".to_string(),
                    success: false,
                    duration_ms: 5,
                    error: Some("Assertion failed: error-message is not visible".to_string()),
                }],
                error: Some("expect_visible:error-message: Assertion failed".to_string()),
            }],
        };
        assert!(!results.success());

        let path = write_results(&dir.path().join("out"), &results).unwrap();
        assert!(path.ends_with("test-results.json"));

        let written: TestSuiteResult =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(written.failed, 1);
        assert_eq!(written.results[0].steps[0].step_name, "expect_visible:error-message");
    }
}
