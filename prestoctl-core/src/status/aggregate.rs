//! Status aggregator
//!
//! Probes every host (bounded parallelism) while the coordinator is
//! queried, then reconciles both into one `NodeStatus` per host,
//! coordinator first. Precedence is an ordered list of rules; the first
//! one that fires decides the host's condition.

use super::coordinator::{CoordinatorError, CoordinatorReporter, CoordinatorView, DiscoveredNode};
use super::node::{
    ClusterStatusReport, NodeCondition, NodeStatus, PrestoInfo, ProcessState, TransientStatus,
};
use super::probe::{NodeProber, ProbeOutcome, ProbeResult};
use crate::topology::{Role, Topology};
use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use std::sync::Arc;
use tracing::{info, warn};

/// Anything that can produce a fresh report; the retry driver's input.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn collect(&self) -> ClusterStatusReport;
}

#[async_trait]
impl<T: StatusSource + ?Sized> StatusSource for Arc<T> {
    async fn collect(&self) -> ClusterStatusReport {
        (**self).collect().await
    }
}

/// Everything known about one host during a cycle.
pub struct HostEvidence<'a> {
    pub host: &'a str,
    pub role: Role,
    pub probe: &'a ProbeResult,
    /// `None` when the coordinator could not be queried
    pub view: Option<&'a CoordinatorView>,
}

impl<'a> HostEvidence<'a> {
    fn discovered(&self) -> Option<&'a DiscoveredNode> {
        self.view
            .and_then(|v| v.find(self.host, self.probe.node_id.as_deref()))
    }
}

type Rule = fn(&HostEvidence<'_>) -> Option<NodeCondition>;

/// coordinator failure > unreachable > probe failure > not installed >
/// not running > not yet discovered > healthy
const RULES: [Rule; 7] = [
    coordinator_unavailable,
    unreachable,
    probe_failed,
    not_installed,
    not_running,
    not_yet_discovered,
    healthy,
];

fn coordinator_unavailable(e: &HostEvidence<'_>) -> Option<NodeCondition> {
    e.view.is_none().then_some(NodeCondition::CoordinatorUnavailable)
}

fn unreachable(e: &HostEvidence<'_>) -> Option<NodeCondition> {
    match &e.probe.outcome {
        ProbeOutcome::Unreachable { reason } => Some(NodeCondition::Unreachable {
            reason: reason.clone(),
        }),
        _ => None,
    }
}

fn probe_failed(e: &HostEvidence<'_>) -> Option<NodeCondition> {
    e.probe
        .probe_error()
        .map(|reason| NodeCondition::ProbeFailed { reason })
}

fn not_installed(e: &HostEvidence<'_>) -> Option<NodeCondition> {
    (e.probe.outcome == ProbeOutcome::NotInstalled).then_some(NodeCondition::NotInstalled)
}

fn not_running(e: &HostEvidence<'_>) -> Option<NodeCondition> {
    (e.probe.outcome == ProbeOutcome::NotRunning).then_some(NodeCondition::NotRunning)
}

fn not_yet_discovered(e: &HostEvidence<'_>) -> Option<NodeCondition> {
    e.discovered()
        .is_none()
        .then_some(NodeCondition::NotYetDiscovered)
}

fn healthy(_: &HostEvidence<'_>) -> Option<NodeCondition> {
    Some(NodeCondition::Healthy)
}

pub fn classify(evidence: &HostEvidence<'_>) -> NodeCondition {
    RULES
        .iter()
        .find_map(|rule| rule(evidence))
        .unwrap_or(NodeCondition::Healthy)
}

/// Builds the host's status from its evidence; pure.
pub fn reconcile(evidence: &HostEvidence<'_>) -> NodeStatus {
    let condition = classify(evidence);
    let reachable = evidence.probe.reachable();
    let process_running = evidence.probe.process_state();
    let discovered = evidence.discovered();

    let presto = match (&condition, discovered, evidence.view) {
        (NodeCondition::Healthy, Some(node), Some(view)) => Some(PrestoInfo {
            version: node.node_version.clone(),
            active: node.is_active(),
            connectors: view.connectors.clone(),
            uri: node.http_uri.clone(),
        }),
        _ => None,
    };

    let ip = match (&condition, discovered) {
        (NodeCondition::Healthy, Some(node)) => Some(node.ip().to_string()),
        _ => None,
    };

    let transient = match condition {
        NodeCondition::NotYetDiscovered => Some(TransientStatus::NotYetDiscovered),
        NodeCondition::CoordinatorUnavailable
            if evidence.role == Role::Coordinator && process_running == ProcessState::Running =>
        {
            Some(TransientStatus::CoordinatorStarting)
        }
        _ => None,
    };

    NodeStatus {
        host: evidence.host.to_string(),
        label: if reachable {
            evidence.host.to_string()
        } else {
            format!("{}(down)", evidence.host)
        },
        role: evidence.role,
        reachable,
        process_running,
        discovered_by_coordinator: discovered.is_some(),
        ip,
        presto,
        error_message: condition.message(),
        condition,
        transient,
    }
}

pub fn reconcile_all(
    topology: &Topology,
    probes: &[ProbeResult],
    coordinator: Result<&CoordinatorView, &CoordinatorError>,
) -> ClusterStatusReport {
    let view = coordinator.ok();
    let nodes = topology
        .hosts()
        .into_iter()
        .map(|host| {
            let missing;
            let probe = match probes.iter().find(|p| p.host == host) {
                Some(probe) => probe,
                None => {
                    warn!("no probe result for {}", host);
                    missing = ProbeResult::failed(host, format!("no probe result for host {host}"));
                    &missing
                }
            };
            reconcile(&HostEvidence {
                host,
                role: topology.role_of(host).unwrap_or(Role::Worker),
                probe,
                view,
            })
        })
        .collect();
    ClusterStatusReport::new(nodes)
}

pub struct StatusAggregator {
    topology: Topology,
    prober: NodeProber,
    reporter: CoordinatorReporter,
    max_parallel: usize,
}

impl StatusAggregator {
    pub fn new(
        topology: Topology,
        prober: NodeProber,
        reporter: CoordinatorReporter,
        max_parallel: usize,
    ) -> Self {
        Self {
            topology,
            prober,
            reporter,
            max_parallel: max_parallel.max(1),
        }
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    /// One full cycle: fresh probes and a fresh coordinator query.
    pub async fn aggregate(&self) -> ClusterStatusReport {
        let pending: Vec<_> = self
            .topology
            .hosts()
            .into_iter()
            .map(|host| self.prober.probe(host))
            .collect();
        let probes = stream::iter(pending)
            .buffer_unordered(self.max_parallel)
            .collect::<Vec<ProbeResult>>();

        let (probes, coordinator) = tokio::join!(probes, self.reporter.report());

        let report = reconcile_all(&self.topology, &probes, coordinator.as_ref());
        let healthy = report.nodes.iter().filter(|n| n.is_healthy()).count();
        info!(
            "status cycle: {}/{} hosts healthy{}",
            healthy,
            report.nodes.len(),
            if coordinator.is_err() { ", coordinator unavailable" } else { "" }
        );
        report
    }
}

#[async_trait]
impl StatusSource for StatusAggregator {
    async fn collect(&self) -> ClusterStatusReport {
        self.aggregate().await
    }
}
