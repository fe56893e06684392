//! Playwright browser automation
//!
//! A [`BrowserSession`] owns one Node.js process running a small bridge
//! script. The bridge launches a browser, opens a single page against the
//! configured base URL and then executes one JSON command per stdin line,
//! answering with one JSON line on stdout:
//!
//! ```text
//! -> {"id":3,"op":"click","testId":"login-button"}
//! <- {"id":3,"ok":true,"value":null}
//! <- {"id":4,"ok":false,"kind":"timeout","message":"..."}
//! ```
//!
//! Line 0 is the bridge's own readiness reply once the page is open.

use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tempfile::NamedTempFile;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command as TokioCommand};
use tracing::{debug, info, warn};

use crate::error::{E2eError, E2eResult};

const BRIDGE_JS: &str = r#"
const readline = require('readline');
const playwright = require('playwright');

const config = JSON.parse(process.argv[2]);

function reply(msg) {
  process.stdout.write(JSON.stringify(msg) + '\n');
}

function failure(id, err) {
  const kind = err && err.name === 'TimeoutError' ? 'timeout' : 'error';
  return { id, ok: false, kind, message: String((err && err.message) || err) };
}

function urlMatcher(pattern) {
  if (pattern.regex !== undefined) {
    return new RegExp(pattern.regex);
  }
  const expected = new URL(pattern.path, config.baseUrl).href;
  return (url) => url.href === expected;
}

(async () => {
  let browser;
  let page;
  try {
    browser = await playwright[config.browser].launch({ headless: config.headless });
    const context = await browser.newContext({
      baseURL: config.baseUrl,
      viewport: { width: config.viewport.width, height: config.viewport.height },
    });
    page = await context.newPage();
    page.setDefaultTimeout(config.timeoutMs);
  } catch (err) {
    reply(failure(0, err));
    if (browser) await browser.close();
    process.exit(1);
  }
  reply({ id: 0, ok: true, value: null });

  async function handle(cmd) {
    switch (cmd.op) {
      case 'goto': {
        const response = await page.goto(cmd.url);
        return response ? response.status() : null;
      }
      case 'fill':
        return page.getByTestId(cmd.testId).fill(cmd.value);
      case 'click':
        return page.getByTestId(cmd.testId).click();
      case 'waitForUrl':
        return page.waitForURL(urlMatcher(cmd.pattern), { timeout: cmd.timeoutMs });
      case 'waitForTestId':
        return page.getByTestId(cmd.testId).waitFor({ state: cmd.state, timeout: cmd.timeoutMs });
      case 'text':
        return page.getByTestId(cmd.testId).innerText({ timeout: cmd.timeoutMs });
      case 'url':
        return page.url();
      case 'request': {
        const response = await page.request.get(cmd.url);
        return { status: response.status(), body: await response.text() };
      }
      case 'close':
        return null;
      default:
        throw new Error('unknown op ' + cmd.op);
    }
  }

  const rl = readline.createInterface({ input: process.stdin });
  for await (const line of rl) {
    if (!line.trim()) continue;
    const cmd = JSON.parse(line);
    try {
      const value = await handle(cmd);
      reply({ id: cmd.id, ok: true, value: value === undefined ? null : value });
    } catch (err) {
      reply(failure(cmd.id, err));
    }
    if (cmd.op === 'close') break;
  }
  await browser.close();
})();
"#;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Browser {
    #[default]
    Chromium,
    Firefox,
    Webkit,
}

impl Browser {
    pub fn as_str(&self) -> &'static str {
        match self {
            Browser::Chromium => "chromium",
            Browser::Firefox => "firefox",
            Browser::Webkit => "webkit",
        }
    }
}

impl std::str::FromStr for Browser {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "chromium" | "chrome" => Ok(Browser::Chromium),
            "firefox" => Ok(Browser::Firefox),
            "webkit" | "safari" => Ok(Browser::Webkit),
            other => Err(format!("unknown browser '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: u32,
    pub height: u32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 1280,
            height: 720,
        }
    }
}

/// Configuration for Playwright
#[derive(Debug, Clone)]
pub struct PlaywrightConfig {
    pub base_url: String,
    pub browser: Browser,
    pub headless: bool,
    pub viewport: Viewport,

    /// Default timeout for actions and waits
    pub timeout: Duration,

    /// Directory the `playwright` npm package resolves from
    pub node_dir: PathBuf,

    /// How long launching the browser may take
    pub launch_timeout: Duration,
}

impl Default for PlaywrightConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:3000".to_string(),
            browser: Browser::Chromium,
            headless: true,
            viewport: Viewport::default(),
            timeout: Duration::from_secs(5),
            node_dir: PathBuf::from("."),
            launch_timeout: Duration::from_secs(60),
        }
    }
}

/// Target URL for [`BrowserSession::wait_for_url`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlMatch {
    /// Exact URL: the path resolved against the base URL
    Path(String),

    /// Regular expression searched anywhere in the full URL
    Regex(String),
}

impl UrlMatch {
    pub fn path(p: impl Into<String>) -> Self {
        UrlMatch::Path(p.into())
    }

    pub fn regex(r: impl Into<String>) -> Self {
        UrlMatch::Regex(r.into())
    }

    /// Reject patterns the browser side could not use
    pub fn validate(&self) -> E2eResult<()> {
        match self {
            UrlMatch::Path(p) if !p.starts_with('/') => Err(E2eError::SpecParse(format!(
                "URL path must start with '/': {}",
                p
            ))),
            UrlMatch::Path(_) => Ok(()),
            UrlMatch::Regex(r) => regex::Regex::new(r)
                .map(|_| ())
                .map_err(|e| E2eError::SpecParse(format!("bad URL regex '{}': {}", r, e))),
        }
    }
}

impl std::fmt::Display for UrlMatch {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UrlMatch::Path(p) => write!(f, "{}", p),
            UrlMatch::Regex(r) => write!(f, "/{}/", r),
        }
    }
}

/// Response to a page-context HTTP request
#[derive(Debug, Clone, Deserialize)]
pub struct ApiResponse {
    pub status: u16,
    pub body: String,
}

impl ApiResponse {
    pub fn is_ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json(&self) -> E2eResult<Value> {
        Ok(serde_json::from_str(&self.body)?)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ElementState {
    Visible,
    Hidden,
    Attached,
    Detached,
}

#[derive(Debug, Serialize)]
#[serde(tag = "op", rename_all = "camelCase")]
enum Command<'a> {
    Goto {
        url: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Fill {
        test_id: &'a str,
        value: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Click {
        test_id: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    WaitForUrl {
        pattern: &'a UrlMatch,
        timeout_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    WaitForTestId {
        test_id: &'a str,
        state: ElementState,
        timeout_ms: u64,
    },
    #[serde(rename_all = "camelCase")]
    Text {
        test_id: &'a str,
        timeout_ms: u64,
    },
    Url,
    Request {
        url: &'a str,
    },
    Close,
}

impl Command<'_> {
    fn describe(&self) -> String {
        match self {
            Command::Goto { url } => format!("goto {}", url),
            Command::Fill { test_id, .. } => format!("fill {}", test_id),
            Command::Click { test_id } => format!("click {}", test_id),
            Command::WaitForUrl { pattern, .. } => format!("wait for URL {}", pattern),
            Command::WaitForTestId { test_id, .. } => format!("wait for {}", test_id),
            Command::Text { test_id, .. } => format!("text of {}", test_id),
            Command::Url => "current URL".to_string(),
            Command::Request { url } => format!("request {}", url),
            Command::Close => "close".to_string(),
        }
    }
}

#[derive(Debug, Serialize)]
struct Envelope<'a> {
    id: u64,
    #[serde(flatten)]
    command: &'a Command<'a>,
}

#[derive(Debug, Deserialize)]
struct Reply {
    id: u64,
    ok: bool,
    #[serde(default)]
    value: Value,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

impl Reply {
    fn into_result(self, what: &str) -> E2eResult<Value> {
        if self.ok {
            return Ok(self.value);
        }
        let message = self.message.unwrap_or_else(|| "unknown error".to_string());
        match self.kind.as_deref() {
            Some("timeout") => Err(E2eError::Timeout(format!("{}: {}", what, message))),
            _ => Err(E2eError::Playwright(format!("{}: {}", what, message))),
        }
    }
}

/// One browser page, alive for the duration of a test case
pub struct BrowserSession {
    child: Child,
    stdin: ChildStdin,
    stdout: Lines<BufReader<ChildStdout>>,
    next_id: u64,
    base_url: String,
    timeout: Duration,
    // Deleted when the session is dropped
    _script: NamedTempFile,
}

impl BrowserSession {
    /// Start Node, launch the browser and open a page
    pub async fn launch(config: PlaywrightConfig) -> E2eResult<Self> {
        Self::check_playwright_installed(&config).await?;

        let mut script = tempfile::Builder::new()
            .prefix(".demoapp-bridge-")
            .suffix(".js")
            .tempfile_in(&config.node_dir)?;
        std::io::Write::write_all(&mut script, BRIDGE_JS.as_bytes())?;

        let bridge_config = serde_json::json!({
            "baseUrl": config.base_url,
            "browser": config.browser.as_str(),
            "headless": config.headless,
            "viewport": config.viewport,
            "timeoutMs": config.timeout.as_millis() as u64,
        });

        info!(
            "Launching {} (headless: {}) against {}",
            config.browser.as_str(),
            config.headless,
            config.base_url
        );

        let mut child = TokioCommand::new("node")
            .arg(script.path())
            .arg(bridge_config.to_string())
            .current_dir(&config.node_dir)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| E2eError::Playwright(format!("failed to spawn node: {}", e)))?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| E2eError::Playwright("bridge stdout unavailable".to_string()))?;

        let mut session = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout).lines(),
            next_id: 1,
            base_url: config.base_url,
            timeout: config.timeout,
            _script: script,
        };

        session
            .read_reply(0, config.launch_timeout)
            .await?
            .into_result("launch browser")?;

        Ok(session)
    }

    /// Verify `node` exists and can resolve the `playwright` package
    async fn check_playwright_installed(config: &PlaywrightConfig) -> E2eResult<()> {
        let status = TokioCommand::new("node")
            .args(["-e", "require.resolve('playwright')"])
            .current_dir(&config.node_dir)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(status) if status.success() => Ok(()),
            _ => Err(E2eError::PlaywrightNotFound),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn default_timeout(&self) -> Duration {
        self.timeout
    }

    /// Navigate to a path relative to the base URL; returns the response status
    pub async fn goto(&mut self, url: &str) -> E2eResult<Option<u16>> {
        let value = self.send(&Command::Goto { url }).await?;
        Ok(value.as_u64().map(|s| s as u16))
    }

    pub async fn fill(&mut self, test_id: &str, value: &str) -> E2eResult<()> {
        self.send(&Command::Fill { test_id, value }).await?;
        Ok(())
    }

    pub async fn click(&mut self, test_id: &str) -> E2eResult<()> {
        self.send(&Command::Click { test_id }).await?;
        Ok(())
    }

    pub async fn wait_for_url(&mut self, pattern: &UrlMatch, timeout: Option<Duration>) -> E2eResult<()> {
        let timeout_ms = self.timeout_ms(timeout);
        self.send(&Command::WaitForUrl { pattern, timeout_ms }).await?;
        Ok(())
    }

    /// Wait until the element with this test id is visible
    pub async fn wait_for_test_id(&mut self, test_id: &str, timeout: Option<Duration>) -> E2eResult<()> {
        self.wait_for_state(test_id, ElementState::Visible, timeout).await
    }

    pub async fn wait_for_state(
        &mut self,
        test_id: &str,
        state: ElementState,
        timeout: Option<Duration>,
    ) -> E2eResult<()> {
        let timeout_ms = self.timeout_ms(timeout);
        self.send(&Command::WaitForTestId {
            test_id,
            state,
            timeout_ms,
        })
        .await?;
        Ok(())
    }

    /// Rendered text of an element
    pub async fn text(&mut self, test_id: &str) -> E2eResult<String> {
        let timeout_ms = self.timeout_ms(None);
        let value = self.send(&Command::Text { test_id, timeout_ms }).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    pub async fn url(&mut self) -> E2eResult<String> {
        let value = self.send(&Command::Url).await?;
        Ok(value.as_str().unwrap_or_default().to_string())
    }

    /// GET through the page's request context (shares base URL and cookies)
    pub async fn request(&mut self, url: &str) -> E2eResult<ApiResponse> {
        let value = self.send(&Command::Request { url }).await?;
        Ok(serde_json::from_value(value)?)
    }

    /// Close the browser and wait for the bridge to exit
    pub async fn close(mut self) -> E2eResult<()> {
        self.send(&Command::Close).await?;
        match tokio::time::timeout(Duration::from_secs(10), self.child.wait()).await {
            Ok(status) => {
                let status = status?;
                if !status.success() {
                    warn!("Playwright bridge exited with {}", status);
                }
            }
            Err(_) => {
                warn!("Playwright bridge did not exit, killing it");
                self.child.kill().await?;
            }
        }
        Ok(())
    }

    fn timeout_ms(&self, timeout: Option<Duration>) -> u64 {
        timeout.unwrap_or(self.timeout).as_millis() as u64
    }

    async fn send(&mut self, command: &Command<'_>) -> E2eResult<Value> {
        let id = self.next_id;
        self.next_id += 1;

        let what = command.describe();
        debug!("[bridge] {} ({})", what, id);

        let mut line = serde_json::to_string(&Envelope { id, command })?;
        line.push('\n');
        self.stdin.write_all(line.as_bytes()).await?;
        self.stdin.flush().await?;

        // The bridge enforces its own timeouts; this only guards against a hung process.
        let guard = self.timeout.max(Duration::from_secs(30)) * 2;
        self.read_reply(id, guard).await?.into_result(&what)
    }

    async fn read_reply(&mut self, id: u64, limit: Duration) -> E2eResult<Reply> {
        let read = async {
            while let Some(line) = self.stdout.next_line().await? {
                let Ok(reply) = serde_json::from_str::<Reply>(&line) else {
                    debug!("[bridge] {}", line);
                    continue;
                };
                if reply.id == id {
                    return Ok(reply);
                }
                warn!("Ignoring out-of-order bridge reply {} (expected {})", reply.id, id);
            }
            Err::<Reply, E2eError>(E2eError::Playwright("bridge exited unexpectedly".to_string()))
        };

        tokio::time::timeout(limit, read)
            .await
            .map_err(|_| E2eError::Playwright(format!("no reply from bridge within {:?}", limit)))?
    }
}
