//! Relay process supervision
//!
//! ## Responsibilities
//! - Persist compiled topologies to the relay configuration file atomically
//! - Restart the relay process so it picks up the new configuration
//! - Terminate the relay cleanly on shutdown
//!
//! The relay is an external media server binary driven entirely by its
//! YAML configuration file. It is treated as disposable: every applied
//! topology replaces the file and the process wholesale.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::{Child, Command};
use tokio::sync::Mutex;

use crate::error::Result;
use crate::stream_topology::{RelayTopology, TopologySink};

/// Supervisor owning the relay configuration file and child process
pub struct RelaySupervisor {
    relay_bin: PathBuf,
    config_path: PathBuf,
    child: Mutex<Option<Child>>,
}

impl RelaySupervisor {
    pub fn new(relay_bin: PathBuf, config_path: PathBuf) -> Self {
        Self {
            relay_bin,
            config_path,
            child: Mutex::new(None),
        }
    }

    /// Write the configuration via a temp file so the relay never reads a
    /// half-written document.
    async fn write_config(&self, topology: &RelayTopology) -> Result<()> {
        let yaml = topology.to_yaml()?;
        let tmp = self.config_path.with_extension("yml.tmp");
        let mut file = tokio::fs::File::create(&tmp).await?;
        file.write_all(yaml.as_bytes()).await?;
        file.sync_all().await?;
        tokio::fs::rename(&tmp, &self.config_path).await?;
        Ok(())
    }

    async fn restart(&self) {
        let mut guard = self.child.lock().await;
        if let Some(mut old) = guard.take() {
            let _ = old.start_kill();
            let _ = old.wait().await;
        }
        match Command::new(&self.relay_bin)
            .arg(&self.config_path)
            .kill_on_drop(true)
            .spawn()
        {
            Ok(child) => {
                tracing::info!(
                    relay = %self.relay_bin.display(),
                    config = %self.config_path.display(),
                    "Relay restarted"
                );
                *guard = Some(child);
            }
            Err(e) => {
                tracing::error!(
                    relay = %self.relay_bin.display(),
                    error = %e,
                    "Relay process could not be started"
                );
            }
        }
    }

    /// Stop the relay process if one is running
    pub async fn shutdown(&self) {
        let mut guard = self.child.lock().await;
        if let Some(mut child) = guard.take() {
            let _ = child.start_kill();
            let _ = child.wait().await;
            tracing::info!("Relay stopped");
        }
    }
}

#[async_trait]
impl TopologySink for RelaySupervisor {
    async fn apply(&self, topology: RelayTopology) -> Result<()> {
        self.write_config(&topology).await?;
        self.restart().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config_store::Settings;
    use crate::stream_topology;

    #[tokio::test]
    async fn applying_a_topology_writes_yaml_and_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("relay.yml");
        let supervisor = RelaySupervisor::new(PathBuf::from("true"), config.clone());

        let topology = stream_topology::compile(&[], &[], &Settings::default());
        supervisor.apply(topology).await.unwrap();

        let written = tokio::fs::read_to_string(&config).await.unwrap();
        assert!(written.contains("rtspAddress"));
        assert!(!config.with_extension("yml.tmp").exists());

        supervisor.shutdown().await;
    }

    #[tokio::test]
    async fn reapplying_replaces_the_previous_configuration() {
        let dir = tempfile::tempdir().unwrap();
        let config = dir.path().join("relay.yml");
        let supervisor = RelaySupervisor::new(PathBuf::from("true"), config.clone());

        let mut settings = Settings::default();
        supervisor
            .apply(stream_topology::compile(&[], &[], &settings))
            .await
            .unwrap();
        settings.rtsp_port = 9554;
        supervisor
            .apply(stream_topology::compile(&[], &[], &settings))
            .await
            .unwrap();

        let written = tokio::fs::read_to_string(&config).await.unwrap();
        assert!(written.contains(":9554"));
        assert!(!written.contains(":8554"));

        supervisor.shutdown().await;
    }
}
