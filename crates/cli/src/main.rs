//! wait-for-url - block until a URL answers.
//!
//! Exits 0 once the URL responds with a 2xx/3xx status, 1 on timeout or on
//! a usage error.

use std::io::Write;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use demoapp_cli::{PollConfig, PollError, UrlPoller};

/// Wait for a URL to become available
#[derive(Parser, Debug)]
#[command(name = "wait-for-url")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// URL to poll, e.g. http://localhost:3000
    url: String,

    /// Give up after this many seconds
    #[arg(value_name = "TIMEOUT_SECONDS", default_value_t = 120)]
    timeout_seconds: u64,

    /// Do not print progress while waiting
    #[arg(short, long)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            // --help and --version go to stdout and are not failures
            let code = if e.use_stderr() { 1 } else { 0 };
            let _ = e.print();
            return Ok(ExitCode::from(code));
        }
    };

    let log_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let timeout = Duration::from_secs(args.timeout_seconds);
    let poller = UrlPoller::new(PollConfig::new(&args.url).with_timeout(timeout))?;

    println!("⏳ Waiting for {} (timeout: {}s)...", args.url, args.timeout_seconds);

    let quiet = args.quiet;
    let mut progress_shown = false;
    let result = poller
        .wait_with(|progress| {
            if !quiet {
                print!("\r{}", progress.render());
                let _ = std::io::stdout().flush();
                progress_shown = true;
            }
        })
        .await;

    match result {
        Ok(ready) => {
            // end the in-place progress line
            if progress_shown {
                println!();
            }
            println!(
                "✅ URL is ready after {} attempts ({}s)",
                ready.attempts,
                ready.elapsed.as_secs_f64().round() as u64
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(PollError::Timeout { timeout, .. }) => {
            eprintln!("\n❌ Timeout: URL not ready after {}s", timeout.as_secs());
            Ok(ExitCode::from(1))
        }
        Err(e) => Err(e.into()),
    }
}
