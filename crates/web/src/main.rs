use tracing::info;

use demoapp_web::config::WebServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cfg = WebServerConfig::from_env()?;

    info!(
        "Starting demo app on {} (static files: {})",
        cfg.addr,
        cfg.public_dir.display()
    );

    demoapp_web::server::serve(cfg).await
}
