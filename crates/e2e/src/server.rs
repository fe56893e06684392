//! Server management - spawning and health checking the web server

use std::path::PathBuf;
use std::process::{Child, Command, Stdio};
use std::time::{Duration, Instant};

use demoapp_cli::{PollConfig, PollError, UrlPoller};
use tracing::{info, warn};

use crate::error::{E2eError, E2eResult};

/// Handle to a running server process
pub struct ServerHandle {
    child: Child,
    pub base_url: String,
    pub port: u16,
}

impl ServerHandle {
    /// Spawn the demoapp-web server and wait until `/health` answers
    pub async fn spawn(config: ServerConfig) -> E2eResult<Self> {
        let port = match config.port {
            Some(port) => port,
            None => find_free_port()?,
        };
        let base_url = format!("http://127.0.0.1:{}", port);

        info!("Spawning web server on port {}", port);

        let mut cmd = Command::new(&config.binary_path);
        cmd.env("PORT", port.to_string())
            .env("HOST", "127.0.0.1")
            .env("NODE_ENV", "test");

        if let Some(dir) = &config.public_dir {
            cmd.env("PUBLIC_DIR", dir);
        }

        cmd.stdout(Stdio::null()).stderr(Stdio::inherit());

        let child = cmd.spawn().map_err(|e| {
            E2eError::ServerStartup(format!(
                "Failed to spawn {}: {}",
                config.binary_path.display(),
                e
            ))
        })?;

        let mut handle = ServerHandle {
            child,
            base_url: base_url.clone(),
            port,
        };

        handle.wait_for_healthy(config.startup_timeout).await?;

        info!("Server is healthy at {}", base_url);
        Ok(handle)
    }

    async fn wait_for_healthy(&mut self, timeout: Duration) -> E2eResult<()> {
        let health_url = format!("{}/health", self.base_url);
        let poller = UrlPoller::new(PollConfig::new(health_url).with_timeout(timeout))?;

        let result = poller
            .wait_with(|progress| {
                if progress.attempt == 1 {
                    info!("Waiting for server to start...");
                }
            })
            .await;

        match result {
            Ok(ready) => {
                info!("Health check passed after {} attempts", ready.attempts);
                Ok(())
            }
            Err(PollError::Timeout {
                attempts,
                last_failure,
                ..
            }) => {
                if let Ok(Some(status)) = self.child.try_wait() {
                    return Err(E2eError::ServerStartup(format!(
                        "server exited during startup with {}",
                        status
                    )));
                }
                Err(E2eError::ServerHealthCheck {
                    attempts,
                    reason: last_failure
                        .map(|f| f.to_string())
                        .unwrap_or_else(|| "no attempt made".to_string()),
                })
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Get the base URL for this server
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Stop the server: SIGTERM first, SIGKILL if it is still up after a grace period
    pub async fn stop(&mut self) -> E2eResult<()> {
        if self.child.try_wait()?.is_some() {
            return Ok(());
        }

        info!("Stopping server (pid: {})", self.child.id());

        #[cfg(unix)]
        {
            use nix::sys::signal::{kill, Signal};
            use nix::unistd::Pid;

            let pid = Pid::from_raw(self.child.id() as i32);
            if kill(pid, Signal::SIGTERM).is_ok() {
                let deadline = Instant::now() + Duration::from_secs(5);
                while Instant::now() < deadline {
                    if self.child.try_wait()?.is_some() {
                        return Ok(());
                    }
                    tokio::time::sleep(Duration::from_millis(50)).await;
                }
                warn!("Server ignored SIGTERM, killing it");
            }
        }

        self.kill();
        Ok(())
    }

    fn kill(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for ServerHandle {
    // no grace period here; use `stop` for a clean shutdown
    fn drop(&mut self) {
        if matches!(self.child.try_wait(), Ok(None)) {
            self.kill();
        }
    }
}

/// Configuration for spawning a server
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Path to the demoapp-web binary
    pub binary_path: PathBuf,

    /// Static directory exposed through `PUBLIC_DIR`
    pub public_dir: Option<PathBuf>,

    /// Port to listen on (None = find free port)
    pub port: Option<u16>,

    /// Timeout for server startup
    pub startup_timeout: Duration,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            binary_path: PathBuf::from("target/debug/demoapp-web"),
            public_dir: None,
            port: None,
            startup_timeout: Duration::from_secs(30),
        }
    }
}

/// Find a free port to use
fn find_free_port() -> E2eResult<u16> {
    let listener = std::net::TcpListener::bind("127.0.0.1:0")?;
    Ok(listener.local_addr()?.port())
}
