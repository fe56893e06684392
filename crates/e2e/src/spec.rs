//! Declarative YAML scenarios

use serde::{Deserialize, Serialize};
use std::path::Path;

use demoapp_common::Credentials;

use crate::error::{E2eError, E2eResult};
use crate::playwright::{UrlMatch, Viewport};

/// A complete scenario parsed from YAML
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Scenario {
    /// Unique name for this scenario
    pub name: String,

    /// Human-readable description
    #[serde(default)]
    pub description: String,

    /// Tags for filtering
    #[serde(default)]
    pub tags: Vec<String>,

    /// Viewport size for the browser
    #[serde(default)]
    pub viewport: Viewport,

    /// Steps to execute in order
    pub steps: Vec<TestStep>,
}

/// A single step. String values may reference the default test user as
/// `${E2E_USER}` and `${E2E_PASS}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TestStep {
    /// Navigate to a path relative to the base URL
    Navigate { url: String },

    /// Fill an input
    Fill { test_id: String, value: String },

    /// Click an element
    Click { test_id: String },

    /// Wait for the page URL to match
    WaitForUrl {
        url: UrlMatch,
        #[serde(default)]
        timeout_ms: Option<u64>,
    },

    /// Same wait as `wait_for_url`, reported as an assertion
    ExpectUrl { url: UrlMatch },

    /// Element becomes visible
    ExpectVisible { test_id: String },

    /// Element text equals `text` after whitespace normalization
    ExpectText { test_id: String, text: String },

    /// Element text contains `text`
    ExpectTextContains { test_id: String, text: String },

    /// GET through the browser context and check the status
    ExpectStatus { path: String, status: u16 },

    /// GET a JSON document and check one field by JSON pointer; without
    /// `equals` the field only has to be present and non-null
    ExpectJson {
        path: String,
        pointer: String,
        #[serde(default)]
        equals: Option<serde_json::Value>,
    },

    /// Log in through the form with the given credentials
    Login { username: String, password: String },

    /// Log in as the default test user
    LoginAsDefaultUser,

    /// Click the logout link and wait for the home page
    Logout,

    /// Probe for the logged-in user name
    ExpectLoggedIn {
        #[serde(default = "default_true")]
        expected: bool,
    },
}

fn default_true() -> bool {
    true
}

impl TestStep {
    /// Short label used in logs and results
    pub fn name(&self) -> String {
        match self {
            TestStep::Navigate { url } => format!("navigate:{}", url),
            TestStep::Fill { test_id, .. } => format!("fill:{}", test_id),
            TestStep::Click { test_id } => format!("click:{}", test_id),
            TestStep::WaitForUrl { url, .. } => format!("wait_for_url:{}", url),
            TestStep::ExpectUrl { url } => format!("expect_url:{}", url),
            TestStep::ExpectVisible { test_id } => format!("expect_visible:{}", test_id),
            TestStep::ExpectText { test_id, .. } => format!("expect_text:{}", test_id),
            TestStep::ExpectTextContains { test_id, .. } => format!("expect_text_contains:{}", test_id),
            TestStep::ExpectStatus { path, .. } => format!("expect_status:{}", path),
            TestStep::ExpectJson { path, pointer, .. } => format!("expect_json:{}#{}", path, pointer),
            TestStep::Login { username, .. } => format!("login:{}", username),
            TestStep::LoginAsDefaultUser => "login_as_default_user".to_string(),
            TestStep::Logout => "logout".to_string(),
            TestStep::ExpectLoggedIn { expected } => format!("expect_logged_in:{}", expected),
        }
    }

    fn validate(&self) -> E2eResult<()> {
        match self {
            TestStep::WaitForUrl { url, .. } | TestStep::ExpectUrl { url } => url.validate(),
            TestStep::ExpectJson { pointer, .. } if !pointer.is_empty() && !pointer.starts_with('/') => {
                Err(E2eError::SpecParse(format!(
                    "JSON pointer must be empty or start with '/': {}",
                    pointer
                )))
            }
            _ => Ok(()),
        }
    }
}

/// Substitute `${E2E_USER}` / `${E2E_PASS}`
pub fn expand(value: &str, creds: &Credentials) -> String {
    value
        .replace("${E2E_USER}", &creds.username)
        .replace("${E2E_PASS}", &creds.password)
}

impl Scenario {
    /// Parse a scenario from YAML string
    pub fn from_yaml(yaml: &str) -> E2eResult<Self> {
        let scenario: Self = serde_yaml::from_str(yaml)?;
        scenario.validate()?;
        Ok(scenario)
    }

    /// Parse a scenario from a YAML file
    pub fn from_file(path: &Path) -> E2eResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
            .map_err(|e| E2eError::SpecParse(format!("{}: {}", path.display(), e)))
    }

    /// Load every `*.yaml` / `*.yml` under a directory, in path order
    pub fn load_all(dir: &Path) -> E2eResult<Vec<Self>> {
        if !dir.is_dir() {
            return Err(E2eError::SpecParse(format!(
                "scenario directory not found: {}",
                dir.display()
            )));
        }

        let mut scenarios: Vec<Self> = Vec::new();

        for entry in walkdir::WalkDir::new(dir)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|e| e.ok())
            .filter(|e| {
                e.path()
                    .extension()
                    .map(|ext| ext == "yaml" || ext == "yml")
                    .unwrap_or(false)
            })
        {
            let scenario = Self::from_file(entry.path())?;
            if scenarios.iter().any(|s| s.name == scenario.name) {
                return Err(E2eError::SpecParse(format!(
                    "duplicate scenario name '{}' in {}",
                    scenario.name,
                    entry.path().display()
                )));
            }
            scenarios.push(scenario);
        }

        Ok(scenarios)
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    fn validate(&self) -> E2eResult<()> {
        if self.name.trim().is_empty() {
            return Err(E2eError::SpecParse("scenario name is empty".to_string()));
        }
        if self.steps.is_empty() {
            return Err(E2eError::SpecParse(format!("scenario '{}' has no steps", self.name)));
        }
        for step in &self.steps {
            step.validate()?;
        }
        Ok(())
    }
}
