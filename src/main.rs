//! reckoner - HTTP server entry point.

use reckoner::{api, config::Config};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "reckoner=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // A missing credential halts here, before any agent run.
    let config = Config::from_env()?;
    info!(
        "Loaded configuration: model={} max_steps={}",
        config.model, config.limits.max_steps
    );

    api::serve(config).await?;

    Ok(())
}
