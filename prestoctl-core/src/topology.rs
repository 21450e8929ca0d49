//! Cluster topology: which host coordinates and which hosts work
//!
//! Built once per run from the user's role mapping and never mutated.
//! The worker order is kept as given since it drives report ordering.

use crate::error::TopologyError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Role tag consumed by the shared defaults, validation and reconciliation logic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Coordinator,
    Worker,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Coordinator => "coordinator",
            Role::Worker => "worker",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = TopologyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "coordinator" => Ok(Role::Coordinator),
            "worker" | "workers" => Ok(Role::Worker),
            other => Err(TopologyError::InvalidRole(other.to_string())),
        }
    }
}

/// On-disk shape of the topology file (JSON or YAML).
#[derive(Debug, Deserialize)]
struct TopologyFile {
    coordinator: String,
    #[serde(default)]
    workers: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Topology {
    coordinator: String,
    workers: Vec<String>,
}

impl Topology {
    pub fn new<S: Into<String>>(
        coordinator: S,
        workers: impl IntoIterator<Item = S>,
    ) -> Result<Self, TopologyError> {
        let coordinator = coordinator.into().trim().to_string();
        if coordinator.is_empty() {
            return Err(TopologyError::MissingCoordinator);
        }
        check_host(&coordinator)?;

        let mut seen: Vec<String> = Vec::new();
        for worker in workers {
            let worker = worker.into().trim().to_string();
            check_host(&worker)?;
            if seen.contains(&worker) {
                return Err(TopologyError::DuplicateWorker(worker));
            }
            seen.push(worker);
        }

        Ok(Self {
            coordinator,
            workers: seen,
        })
    }

    /// Load `{"coordinator": "...", "workers": [...]}` from a JSON or YAML file.
    pub fn load(path: &Path) -> Result<Self, TopologyError> {
        let txt = std::fs::read_to_string(path).map_err(|e| TopologyError::Unreadable {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })?;
        // YAML is a superset of JSON, so one parser covers both formats
        let file: TopologyFile =
            serde_yaml::from_str(&txt).map_err(|e| TopologyError::Malformed {
                path: path.to_path_buf(),
                reason: e.to_string(),
            })?;
        let topology = Self::new(file.coordinator, file.workers)?;
        debug!(
            "loaded topology from {}: coordinator {}, {} worker(s)",
            path.display(),
            topology.coordinator,
            topology.workers.len()
        );
        Ok(topology)
    }

    pub fn coordinator(&self) -> &str {
        &self.coordinator
    }

    pub fn workers(&self) -> &[String] {
        &self.workers
    }

    /// Distinct hosts, coordinator first then workers in topology order.
    pub fn hosts(&self) -> Vec<&str> {
        let mut hosts = vec![self.coordinator.as_str()];
        hosts.extend(
            self.workers
                .iter()
                .map(String::as_str)
                .filter(|w| *w != self.coordinator),
        );
        hosts
    }

    pub fn hosts_excluding(&self, excluded: &[String]) -> Vec<&str> {
        self.hosts()
            .into_iter()
            .filter(|h| !excluded.iter().any(|x| x == h))
            .collect()
    }

    /// Coordinator role → the coordinator; worker role → workers that do not coordinate.
    pub fn hosts_for_role(&self, role: Role) -> Vec<&str> {
        match role {
            Role::Coordinator => vec![self.coordinator.as_str()],
            Role::Worker => self.hosts().into_iter().skip(1).collect(),
        }
    }

    pub fn is_coordinator(&self, host: &str) -> bool {
        self.coordinator == host
    }

    /// True when the host is listed in `workers`, including a coordinator that also works.
    pub fn is_worker(&self, host: &str) -> bool {
        self.workers.iter().any(|w| w == host)
    }

    pub fn contains(&self, host: &str) -> bool {
        self.is_coordinator(host) || self.is_worker(host)
    }

    pub fn role_of(&self, host: &str) -> Option<Role> {
        if self.is_coordinator(host) {
            Some(Role::Coordinator)
        } else if self.is_worker(host) {
            Some(Role::Worker)
        } else {
            None
        }
    }

    pub fn is_multi_node(&self) -> bool {
        self.hosts().len() > 1
    }
}

fn check_host(host: &str) -> Result<(), TopologyError> {
    // host names become directory names under the debug dir
    if host.is_empty()
        || host == "."
        || host == ".."
        || host.chars().any(|c| c.is_whitespace() || c == '/' || c == '\\')
    {
        return Err(TopologyError::InvalidHost(host.to_string()));
    }
    Ok(())
}
