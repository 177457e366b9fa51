use anyhow::Result;
use clap::Parser;
use presagio::cli::Cli;
use presagio::model_store::{ModelStore, DEFAULT_MODEL_PATH};
use presagio::server::{router, BIND_ADDR};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Initialize tracing subscriber; `--debug` raises the level to TRACE
fn init_tracing(debug: bool) {
    let level = if debug {
        tracing::Level::TRACE
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(level.into()))
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();
    init_tracing(args.debug);

    let store = Arc::new(ModelStore::new(DEFAULT_MODEL_PATH));
    // Auto-load a persisted model if present; failures are non-fatal
    store.load_if_present();

    let listener = tokio::net::TcpListener::bind(BIND_ADDR).await?;
    tracing::info!(addr = BIND_ADDR, "presagio listening");
    axum::serve(listener, router(store)).await?;

    Ok(())
}
