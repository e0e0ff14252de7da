use anyhow::Result;
use architect_app::{ArchitectRuntime, LoggingHooks};

#[tokio::main]
async fn main() -> Result<()> {
    let config = architect_config::load_from_env()?;
    init_logging(config.log_filter());

    let runtime = ArchitectRuntime::bootstrap(&config, LoggingHooks::hook_set())?;
    tracing::info!("architect state store ready; press ctrl-c to stop");

    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %error, "failed to listen for shutdown signal");
    }
    runtime.shutdown();
    Ok(())
}

fn init_logging(default_filter: &str) {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with_writer(std::io::stderr)
        .try_init();
}
