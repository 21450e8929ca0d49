//! Coordinator reporter
//!
//! Only the coordinator knows which nodes joined the cluster, their IP,
//! version and active flag, and which connectors are configured. It is
//! queried once per cycle and never retried here: a failure is returned
//! as `CoordinatorError` for the aggregator to reconcile.

use crate::config::validate::uri_host;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

pub const NODES_PATH: &str = "/v1/node";
pub const CATALOGS_PATH: &str = "/v1/catalog";
pub const QUERY_PATH: &str = "/v1/query";

/// Connector every coordinator exposes.
pub const SYSTEM_CONNECTOR: &str = "system";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinatorError {
    #[error("unable to query coordinator at {url}: {reason}")]
    Unreachable { url: String, reason: String },

    #[error("coordinator returned HTTP {status} for {url}")]
    Status { url: String, status: u16 },

    #[error("undecodable response from {url}: {reason}")]
    Decode { url: String, reason: String },
}

/// One entry of the coordinator's node list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DiscoveredNode {
    pub node_id: String,
    pub http_uri: String,
    #[serde(default)]
    pub node_version: String,
    #[serde(default)]
    pub coordinator: bool,
    #[serde(default)]
    pub state: String,
}

impl DiscoveredNode {
    pub fn ip(&self) -> &str {
        uri_host(&self.http_uri)
    }

    pub fn is_active(&self) -> bool {
        self.state.eq_ignore_ascii_case("active")
    }
}

/// What the coordinator reported during one cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CoordinatorView {
    pub nodes: Vec<DiscoveredNode>,
    pub connectors: Vec<String>,
}

impl CoordinatorView {
    pub fn new(nodes: Vec<DiscoveredNode>, connectors: Vec<String>) -> Self {
        Self {
            nodes,
            connectors: normalize_connectors(connectors),
        }
    }

    /// Match by node id when the host reported one, else by host name or IP.
    pub fn find(&self, host: &str, node_id: Option<&str>) -> Option<&DiscoveredNode> {
        if let Some(id) = node_id {
            if let Some(node) = self.nodes.iter().find(|n| n.node_id == id) {
                return Some(node);
            }
        }
        self.nodes.iter().find(|n| n.ip() == host)
    }
}

/// `system` first, then the rest sorted and de-duplicated.
pub fn normalize_connectors(names: Vec<String>) -> Vec<String> {
    let mut rest: Vec<String> = names
        .into_iter()
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty() && n != SYSTEM_CONNECTOR)
        .collect();
    rest.sort();
    rest.dedup();

    let mut connectors = Vec::with_capacity(rest.len() + 1);
    connectors.push(SYSTEM_CONNECTOR.to_string());
    connectors.extend(rest);
    connectors
}

#[async_trait]
pub trait CoordinatorClient: Send + Sync {
    async fn nodes(&self) -> Result<Vec<DiscoveredNode>, CoordinatorError>;

    async fn connectors(&self) -> Result<Vec<String>, CoordinatorError>;

    /// Raw query document, used for diagnostics only.
    async fn query_info(&self, query_id: &str) -> Result<serde_json::Value, CoordinatorError>;
}

/// REST client for the coordinator's status port.
pub struct HttpCoordinatorClient {
    base_url: String,
    http: reqwest::Client,
}

impl HttpCoordinatorClient {
    pub fn new(host: &str, port: u16, timeout: Duration) -> Result<Self, CoordinatorError> {
        Self::with_base_url(format!("http://{host}:{port}"), timeout)
    }

    pub fn with_base_url<S: Into<String>>(
        base_url: S,
        timeout: Duration,
    ) -> Result<Self, CoordinatorError> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CoordinatorError::Unreachable {
                url: base_url.clone(),
                reason: e.to_string(),
            })?;
        Ok(Self { base_url, http })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
    ) -> Result<T, CoordinatorError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {}", url);

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CoordinatorError::Unreachable {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(CoordinatorError::Status {
                url,
                status: status.as_u16(),
            });
        }

        response.json::<T>().await.map_err(|e| CoordinatorError::Decode {
            url,
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl CoordinatorClient for HttpCoordinatorClient {
    async fn nodes(&self) -> Result<Vec<DiscoveredNode>, CoordinatorError> {
        self.get_json(NODES_PATH).await
    }

    async fn connectors(&self) -> Result<Vec<String>, CoordinatorError> {
        self.get_json(CATALOGS_PATH).await
    }

    async fn query_info(&self, query_id: &str) -> Result<serde_json::Value, CoordinatorError> {
        self.get_json(&format!("{QUERY_PATH}/{query_id}")).await
    }
}

pub struct CoordinatorReporter {
    client: Arc<dyn CoordinatorClient>,
}

impl CoordinatorReporter {
    pub fn new(client: Arc<dyn CoordinatorClient>) -> Self {
        Self { client }
    }

    pub async fn report(&self) -> Result<CoordinatorView, CoordinatorError> {
        let (nodes, connectors) = tokio::join!(self.client.nodes(), self.client.connectors());
        match (nodes, connectors) {
            (Ok(nodes), Ok(connectors)) => {
                debug!(
                    "coordinator knows {} nodes, {} connectors",
                    nodes.len(),
                    connectors.len()
                );
                Ok(CoordinatorView::new(nodes, connectors))
            }
            (Err(e), _) | (_, Err(e)) => {
                warn!("{}", e);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node(id: &str, uri: &str, state: &str) -> DiscoveredNode {
        DiscoveredNode {
            node_id: id.into(),
            http_uri: uri.into(),
            node_version: "0.101".into(),
            coordinator: false,
            state: state.into(),
        }
    }

    #[test]
    fn test_decode_node_list() {
        let body = r#"[{"nodeId":"n1","httpUri":"http://172.16.1.2:8080","nodeVersion":"0.101","coordinator":true,"state":"ACTIVE","uptime":"1m"}]"#;
        let nodes: Vec<DiscoveredNode> = serde_json::from_str(body).unwrap();
        assert_eq!(nodes.len(), 1);
        assert_eq!(nodes[0].ip(), "172.16.1.2");
        assert!(nodes[0].is_active());
        assert!(nodes[0].coordinator);
    }

    #[test]
    fn test_find_prefers_node_id() {
        let view = CoordinatorView::new(
            vec![
                node("n1", "http://10.0.0.1:8080", "active"),
                node("n2", "http://slave2:8080", "inactive"),
            ],
            vec![],
        );
        assert_eq!(view.find("anything", Some("n1")).unwrap().node_id, "n1");
        assert_eq!(view.find("slave2", None).unwrap().node_id, "n2");
        assert_eq!(view.find("10.0.0.1", Some("unknown")).unwrap().node_id, "n1");
        assert!(view.find("slave9", None).is_none());
        assert!(!view.find("slave2", None).unwrap().is_active());
    }

    #[test]
    fn test_normalize_connectors() {
        assert_eq!(
            normalize_connectors(vec!["tpch".into(), "system".into(), "hive".into(), "tpch".into()]),
            vec!["system", "hive", "tpch"]
        );
        assert_eq!(normalize_connectors(vec![]), vec!["system"]);
    }
}
