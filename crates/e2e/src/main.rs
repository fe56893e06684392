//! E2E runner entry point
//!
//! Runs the YAML scenarios against a spawned or already-running demo app.
//! Exit codes: 0 all passed, 1 some scenario failed, 2 harness error.

use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tracing_subscriber::EnvFilter;

use demoapp_e2e::playwright::{Browser, PlaywrightConfig};
use demoapp_e2e::runner::{RunnerConfig, Target, TestRunner};
use demoapp_e2e::server::ServerConfig;
use demoapp_e2e::E2eResult;

#[derive(Parser, Debug)]
#[command(name = "demoapp-e2e")]
#[command(about = "Browser E2E runner for the demo app")]
struct Args {
    /// Directory containing scenario YAML files
    #[arg(short, long, default_value = "crates/e2e/scenarios")]
    scenarios: PathBuf,

    /// Run only scenarios with this tag
    #[arg(short, long)]
    tag: Option<String>,

    /// Run only the scenario with this name
    #[arg(short, long)]
    name: Option<String>,

    /// Test an already running app instead of spawning one
    #[arg(long, env = "BASE_URL")]
    base_url: Option<String>,

    /// Path to the web server binary
    #[arg(long, default_value = "target/debug/demoapp-web")]
    server_binary: PathBuf,

    /// Static directory for the spawned server
    #[arg(long)]
    public_dir: Option<PathBuf>,

    /// Seconds to wait for the spawned server's health check
    #[arg(long, default_value = "30")]
    startup_timeout: u64,

    /// Browser to use (chromium, firefox, webkit)
    #[arg(long, default_value = "chromium")]
    browser: Browser,

    /// Show the browser window
    #[arg(long)]
    headed: bool,

    /// Directory the playwright npm package is installed in
    #[arg(long, default_value = ".")]
    node_dir: PathBuf,

    /// Default action and assertion timeout in milliseconds
    #[arg(long, default_value = "5000")]
    timeout_ms: u64,

    /// Output directory for results
    #[arg(short, long, default_value = "test-results")]
    output: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let args = Args::parse();

    let log_level = if args.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level)))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let rt = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("Error: failed to create tokio runtime: {}", e);
            std::process::exit(2);
        }
    };

    match rt.block_on(async_main(args)) {
        Ok(true) => std::process::exit(0),
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    }
}

async fn async_main(args: Args) -> E2eResult<bool> {
    let target = match args.base_url {
        Some(url) => Target::External(url),
        None => Target::Spawn(ServerConfig {
            binary_path: args.server_binary,
            public_dir: args.public_dir,
            port: None,
            startup_timeout: Duration::from_secs(args.startup_timeout),
        }),
    };

    let config = RunnerConfig {
        target,
        playwright: PlaywrightConfig {
            browser: args.browser,
            headless: !args.headed,
            node_dir: args.node_dir,
            timeout: Duration::from_millis(args.timeout_ms),
            ..Default::default()
        },
        scenarios_dir: args.scenarios,
        output_dir: args.output,
    };

    let mut runner = TestRunner::new(config);

    let results = if let Some(name) = args.name {
        runner.run_named(&name).await?
    } else if let Some(tag) = args.tag {
        runner.run_tagged(&tag).await?
    } else {
        runner.run_all().await?
    };

    runner.write_results(&results)?;
    runner.stop_server().await?;

    Ok(results.success())
}
