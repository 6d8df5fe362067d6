mod args;

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use photoharvest_core::{
    load_config, load_config_from_env, validate_config, AttributionStore, Config, FlickrClient,
    Harvester, PhotoProvider, SanitizedConfig, SidecarStore,
};

use args::Args;

#[tokio::main]
async fn main() {
    let args = Args::parse();

    if let Err(e) = run(args).await {
        error!("Fatal error: {:#}", e);
        eprintln!("error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run(args: Args) -> Result<()> {
    let default_filter = if args.verbose {
        "info,photoharvest_core=debug"
    } else {
        "info"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(
            args.log_json
                .then(|| tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr)),
        )
        .with(
            (!args.log_json)
                .then(|| tracing_subscriber::fmt::layer().with_writer(std::io::stderr)),
        )
        .init();

    let config = resolve_config(args.config.as_deref())?;
    info!(
        config = %serde_json::to_string(&SanitizedConfig::from(&config)).unwrap_or_default(),
        "Configuration loaded"
    );

    let provider: Arc<dyn PhotoProvider> = Arc::new(
        FlickrClient::new(config.provider.clone()).context("Failed to create provider client")?,
    );
    let store: Arc<dyn AttributionStore> = Arc::new(SidecarStore::new());
    let harvester =
        Harvester::new(&config, provider, store).context("Failed to create harvester")?;

    let request = args.to_request();
    let output = harvester
        .run(&request)
        .await
        .with_context(|| format!("Harvest for {:?} failed", request.query))?;

    println!(
        "{}",
        serde_json::to_string_pretty(&output).context("Failed to serialize output")?
    );
    Ok(())
}

fn resolve_config(path: Option<&Path>) -> Result<Config> {
    let config = match path {
        Some(path) => load_config(path)
            .with_context(|| format!("Failed to load config from {:?}", path))?,
        None => load_config_from_env().context("Failed to load config from environment")?,
    };

    validate_config(&config).context("Configuration validation failed")?;
    Ok(config)
}
