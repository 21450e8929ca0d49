//! Wiring between loaded settings/topology and the core operations

use anyhow::{Context, Result};
use prestoctl_core::config::load_host_config;
use prestoctl_core::status::{build_aggregator, HttpCoordinatorClient, StatusAggregator};
use prestoctl_core::{AdminSettings, SshExecutor, Topology};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

pub struct App {
    pub settings: AdminSettings,
    pub topology: Topology,
}

impl App {
    pub async fn load(settings_path: Option<&Path>, topology_path: Option<PathBuf>) -> Result<Self> {
        let settings = match settings_path {
            Some(path) => AdminSettings::load_from(path).await,
            None => AdminSettings::load().await,
        };
        let topology_path = topology_path.unwrap_or_else(|| settings.paths.topology_file());
        let topology = Topology::load(&topology_path)
            .with_context(|| format!("cannot load topology from {}", topology_path.display()))?;
        info!(
            "topology: coordinator {}, {} host(s)",
            topology.coordinator(),
            topology.hosts().len()
        );
        Ok(Self { settings, topology })
    }

    /// Port from the coordinator's own configuration when it builds, else settings.
    pub fn coordinator_port(&self) -> u16 {
        load_host_config(
            &self.topology,
            self.topology.coordinator(),
            &self.settings.paths.config_dir,
        )
        .ok()
        .and_then(|bundle| bundle.http_port())
        .unwrap_or(self.settings.coordinator.port)
    }

    pub fn coordinator_client(&self) -> Result<HttpCoordinatorClient> {
        let port = self.coordinator_port();
        debug!("coordinator at {}:{}", self.topology.coordinator(), port);
        HttpCoordinatorClient::new(
            self.topology.coordinator(),
            port,
            Duration::from_secs(self.settings.coordinator.request_timeout_secs),
        )
        .context("cannot build coordinator client")
    }

    pub fn executor(&self) -> SshExecutor {
        SshExecutor::new(self.settings.ssh.clone())
    }

    pub fn aggregator(&self) -> Result<StatusAggregator> {
        Ok(build_aggregator(
            self.topology.clone(),
            &self.settings,
            Arc::new(self.executor()),
            Arc::new(self.coordinator_client()?),
        ))
    }
}
