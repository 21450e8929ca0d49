/*!
Harnais de test pour le protocole de statut

Facilite l'écriture de tests de cluster avec:
- Topologie + exécuteur distant simulé + coordinateur simulé
- Tous les hôtes sains et découverts par défaut
- Construction directe de l'agrégateur et du driver de retry
*/

use crate::coordinator_stub::{discovered, StubCoordinator};
use crate::remote_stub::{HostBehavior, MockRemoteExecutor};
use anyhow::Result;
use prestoctl_core::settings::AdminSettings;
use prestoctl_core::status::{
    build_aggregator, ClusterStatusReport, RetryDriver, RetryPolicy, StatusAggregator,
};
use prestoctl_core::topology::Topology;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Init du logging pour tests (idempotent)
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn node_id(host: &str) -> String {
    format!("{host}-id")
}

/// IP attribuée par le harnais : 10.0.0.1 pour le premier hôte, etc.
pub fn host_ip(index: usize) -> String {
    format!("10.0.0.{}", index + 1)
}

pub struct ClusterHarness {
    pub topology: Topology,
    pub remote: MockRemoteExecutor,
    pub coordinator: StubCoordinator,
    pub settings: AdminSettings,
}

impl ClusterHarness {
    /// Cluster entièrement sain
    pub fn new(coordinator: &str, workers: &[&str]) -> Result<Self> {
        init_test_tracing();
        let topology = Topology::new(coordinator, workers.iter().copied())?;

        let remote = MockRemoteExecutor::new();
        let stub = StubCoordinator::new();
        for (i, host) in topology.hosts().into_iter().enumerate() {
            remote.set_host(host, HostBehavior::healthy(node_id(host)));
            let mut node = discovered(&node_id(host), &host_ip(i));
            node.coordinator = host == coordinator;
            stub.add_node(node);
        }

        let mut settings = AdminSettings::default();
        settings.status.probe_timeout_secs = 1;
        settings.status.retry_wait_secs = 0;

        info!("🧪 Cluster harness: {:?}", topology.hosts());
        Ok(Self {
            topology,
            remote,
            coordinator: stub,
            settings,
        })
    }

    pub fn set_host(&self, host: &str, behavior: HostBehavior) -> &Self {
        self.remote.set_host(host, behavior);
        self
    }

    /// Le coordinateur oublie ce nœud
    pub fn undiscover(&self, host: &str) -> &Self {
        self.coordinator.remove_node(&node_id(host));
        self
    }

    pub fn aggregator(&self) -> StatusAggregator {
        build_aggregator(
            self.topology.clone(),
            &self.settings,
            Arc::new(self.remote.clone()),
            Arc::new(self.coordinator.clone()),
        )
    }

    pub fn retry_driver(&self, attempts: u32) -> RetryDriver<StatusAggregator> {
        RetryDriver::new(self.aggregator(), RetryPolicy::new(attempts, Duration::ZERO))
    }

    pub async fn collect(&self) -> ClusterStatusReport {
        self.aggregator().aggregate().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_default_cluster_is_healthy() {
        let harness = ClusterHarness::new("master", &["slave1", "slave2"]).unwrap();
        let report = harness.collect().await;
        assert_eq!(report.nodes.len(), 3);
        assert!(report.nodes.iter().all(|n| n.is_healthy()));
        assert_eq!(report.get("slave1").unwrap().ip.as_deref(), Some("10.0.0.2"));
    }
}
