mod app;

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};

use sportpro_core::{
    cart::CartStore,
    config::{self, AppConfig},
    http::HttpClient,
    session::Session,
    storage::LocalStore,
};
use tracing_subscriber::{prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging()?;

    config::ensure_default_config()?;
    let config = AppConfig::load()?;
    tracing::info!(
        api_url = %config.api_url,
        filter_policy = config.filter_policy.as_str(),
        data_dir = %config.data_dir.display(),
        "Configuration loaded"
    );

    let store = LocalStore::new(&config.data_dir);
    let session = Session::restore(store.clone());
    let api = HttpClient::from_config(&config, session).context("failed to build API client")?;
    let cart = CartStore::new(store);

    let mut app = app::SportProApp::new(&config, api, cart);
    app.run().await
}

fn init_logging() -> Result<()> {
    let log_dir = std::env::current_dir()?.join("logs");
    fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join("sportpro.log");

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    // The terminal belongs to the UI, so only the file receives output.
    let file_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_ansi(false)
        .compact()
        .with_writer(move || {
            OpenOptions::new()
                .create(true)
                .append(true)
                .open(&log_path)
                .expect("failed to open log file")
        });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(file_layer)
        .init();

    Ok(())
}
