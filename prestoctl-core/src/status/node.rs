//! Per-host status records and the cluster report

use crate::topology::Role;
use serde::Serialize;
use time::OffsetDateTime;

pub const MSG_COORDINATOR_UNAVAILABLE: &str = "No information available: unable to query coordinator";
pub const MSG_NOT_INSTALLED: &str = "Presto is not installed.";
pub const MSG_NOT_YET_DISCOVERED: &str =
    "No information available: the coordinator has not yet discovered this node";
pub const MSG_UNEXPECTED_PROBE_OUTPUT: &str = "unexpected probe output";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProcessState {
    Running,
    NotRunning,
    Unknown,
}

/// The single reconciled state of a host, in precedence order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum NodeCondition {
    CoordinatorUnavailable,
    Unreachable { reason: String },
    ProbeFailed { reason: String },
    NotInstalled,
    NotRunning,
    NotYetDiscovered,
    Healthy,
}

impl NodeCondition {
    /// Error line shown for the host, `None` when healthy.
    pub fn message(&self) -> Option<String> {
        match self {
            NodeCondition::CoordinatorUnavailable | NodeCondition::NotRunning => {
                Some(MSG_COORDINATOR_UNAVAILABLE.to_string())
            }
            NodeCondition::Unreachable { reason } | NodeCondition::ProbeFailed { reason } => {
                Some(reason.clone())
            }
            NodeCondition::NotInstalled => Some(MSG_NOT_INSTALLED.to_string()),
            NodeCondition::NotYetDiscovered => Some(MSG_NOT_YET_DISCOVERED.to_string()),
            NodeCondition::Healthy => None,
        }
    }
}

/// Conditions worth another aggregation cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TransientStatus {
    NotYetDiscovered,
    CoordinatorStarting,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PrestoInfo {
    pub version: String,
    pub active: bool,
    pub connectors: Vec<String>,
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeStatus {
    pub host: String,
    /// Host name as displayed; `<host>(down)` when unreachable
    pub label: String,
    pub role: Role,
    pub reachable: bool,
    pub process_running: ProcessState,
    pub discovered_by_coordinator: bool,
    pub ip: Option<String>,
    pub presto: Option<PrestoInfo>,
    pub error_message: Option<String>,
    pub condition: NodeCondition,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transient: Option<TransientStatus>,
}

impl NodeStatus {
    pub fn is_healthy(&self) -> bool {
        self.condition == NodeCondition::Healthy
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClusterStatusReport {
    pub nodes: Vec<NodeStatus>,
    #[serde(with = "time::serde::rfc3339")]
    pub collected_at: OffsetDateTime,
}

impl ClusterStatusReport {
    pub fn new(nodes: Vec<NodeStatus>) -> Self {
        Self {
            nodes,
            collected_at: OffsetDateTime::now_utc(),
        }
    }

    pub fn get(&self, host: &str) -> Option<&NodeStatus> {
        self.nodes.iter().find(|n| n.host == host)
    }

    pub fn transient_hosts(&self) -> Vec<(&str, TransientStatus)> {
        self.nodes
            .iter()
            .filter_map(|n| n.transient.map(|t| (n.host.as_str(), t)))
            .collect()
    }

    /// No host is in a transient condition.
    pub fn is_stable(&self) -> bool {
        self.nodes.iter().all(|n| n.transient.is_none())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_messages() {
        assert_eq!(NodeCondition::Healthy.message(), None);
        assert_eq!(
            NodeCondition::CoordinatorUnavailable.message().as_deref(),
            Some(MSG_COORDINATOR_UNAVAILABLE)
        );
        assert_eq!(
            NodeCondition::NotRunning.message(),
            NodeCondition::CoordinatorUnavailable.message()
        );
        assert_ne!(NodeCondition::NotInstalled.message(), NodeCondition::NotRunning.message());
    }
}
