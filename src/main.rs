//! Virtucam - virtual ONVIF device pool
//!
//! Main entry point for the Virtucam daemon.

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use virtucam::camera_registry::CameraRegistry;
use virtucam::config_store::ConfigRepository;
use virtucam::netif::VirtualInterfaceManager;
use virtucam::relay::RelaySupervisor;
use virtucam::state::{AppConfig, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "virtucam=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting Virtucam v{}", env!("CARGO_PKG_VERSION"));

    let config = AppConfig::default();
    tracing::info!(
        config_path = %config.config_path.display(),
        relay_bin = %config.relay_bin.display(),
        relay_config = %config.relay_config.display(),
        "Configuration loaded"
    );

    if let Some(dir) = config.config_path.parent() {
        tokio::fs::create_dir_all(dir).await.ok();
    }

    let repo = ConfigRepository::new(&config.config_path);
    let doc = repo.load().await?;
    tracing::info!(cameras = doc.cameras.len(), "Configuration document loaded");

    // Remove interfaces a previous unclean shutdown left behind
    let netif = Arc::new(VirtualInterfaceManager::new());
    netif.cleanup_stale_interfaces().await;

    let relay = Arc::new(RelaySupervisor::new(
        config.relay_bin.clone(),
        config.relay_config.clone(),
    ));
    let registry = Arc::new(CameraRegistry::new(doc, repo, netif, relay.clone()).await?);

    let state = AppState {
        registry: registry.clone(),
        relay: relay.clone(),
    };

    // Bring the relay up with the persisted topology, then start cameras
    // marked for autostart.
    state.registry.apply_topology().await?;
    if let Err(e) = state.registry.autostart().await {
        tracing::error!(error = %e, "Autostart incomplete");
    }

    tracing::info!("Virtucam running, press Ctrl+C to stop");
    tokio::signal::ctrl_c().await?;

    tracing::info!("Shutting down");
    state.registry.shutdown().await;
    state.relay.shutdown().await;
    Ok(())
}
