//! `designforged`: serves the DesignForge API.

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use designforge_core::metrics::METRICS;
use designforge_core::{init_tracing, FsImageStore};
use designforge_providers::{build_generation_client, ProviderConfig};
use designforge_server::{routes, AppState, ServerArgs, IMAGE_URL_PREFIX};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<()> {
    // A missing .env is fine.
    dotenvy::dotenv().ok();
    let args = ServerArgs::parse();
    init_tracing(args.log_format(), args.log_level());

    let store = FsImageStore::new(&args.output_dir, IMAGE_URL_PREFIX).with_context(|| {
        format!(
            "Failed to prepare output directory {}",
            args.output_dir.display()
        )
    })?;
    let providers = ProviderConfig::from_env();
    if providers.configured().is_empty() {
        warn!("no provider API keys set; every generation will fail as unconfigured");
    }
    let client = build_generation_client(&providers, Arc::new(store))
        .context("Failed to build generation client")?;
    let rubric = args.load_rubric()?;

    let state = Arc::new(
        AppState::new(
            Arc::new(client),
            args.orchestrator_config(),
            rubric,
            args.output_dir.clone(),
        )
        .with_max_designs(args.max_designs.get()),
    );

    let (addr, server) = warp::serve(routes(state))
        .try_bind_with_graceful_shutdown(args.bind, shutdown_signal())
        .with_context(|| format!("Failed to bind {}", args.bind))?;
    info!(%addr, output_dir = %args.output_dir.display(), "designforged listening");

    server.await;
    METRICS.flush();
    info!("designforged stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c, running until killed");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}
