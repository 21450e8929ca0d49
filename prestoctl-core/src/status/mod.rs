//! Distributed status protocol
//!
//! - `probe`: per-host liveness through the remote executor
//! - `coordinator`: the coordinator's view of the cluster
//! - `aggregate`: reconciliation into one status per host
//! - `retry`: repeat cycles until no host is transient
//! - `render`: text and JSON output

pub mod aggregate;
pub mod coordinator;
pub mod node;
pub mod probe;
pub mod render;
pub mod retry;

pub use aggregate::{reconcile, reconcile_all, HostEvidence, StatusAggregator, StatusSource};
pub use coordinator::{
    CoordinatorClient, CoordinatorError, CoordinatorReporter, CoordinatorView, DiscoveredNode,
    HttpCoordinatorClient,
};
pub use node::{
    ClusterStatusReport, NodeCondition, NodeStatus, PrestoInfo, ProcessState, TransientStatus,
};
pub use probe::{NodeProber, ProbeOutcome, ProbeResult};
pub use render::{JsonRenderer, RenderError, ReportRenderer, TextRenderer};
pub use retry::{RetryDriver, RetryPolicy};

use crate::remote::RemoteExecutor;
use crate::settings::AdminSettings;
use crate::topology::Topology;
use std::sync::Arc;

/// Wires prober, reporter and aggregator from the admin settings.
pub fn build_aggregator(
    topology: Topology,
    settings: &AdminSettings,
    executor: Arc<dyn RemoteExecutor>,
    client: Arc<dyn CoordinatorClient>,
) -> StatusAggregator {
    StatusAggregator::new(
        topology,
        NodeProber::from_settings(executor, settings),
        CoordinatorReporter::new(client),
        settings.status.max_parallel_probes,
    )
}
