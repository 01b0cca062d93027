//! Application state
//!
//! Holds configuration resolved from the environment and the shared
//! components handed to long-lived tasks.

use std::path::PathBuf;
use std::sync::Arc;

use crate::camera_registry::CameraRegistry;
use crate::relay::RelaySupervisor;

/// Application configuration
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// Path of the persisted camera/settings document
    pub config_path: PathBuf,
    /// Relay (media server) binary
    pub relay_bin: PathBuf,
    /// Relay configuration file written on every topology change
    pub relay_config: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            config_path: std::env::var("CONFIG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/virtucam/config.json")),
            relay_bin: std::env::var("RELAY_BIN")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/usr/local/bin/mediamtx")),
            relay_config: std::env::var("RELAY_CONFIG")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("/var/lib/virtucam/mediamtx.yml")),
        }
    }
}

/// Shared components kept alive for the process lifetime
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<CameraRegistry>,
    pub relay: Arc<RelaySupervisor>,
}
