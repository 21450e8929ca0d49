/*!
Coordinateur simulé

- `StubCoordinator` : implémentation en mémoire de `CoordinatorClient`,
  avec panne simulée et réponses scriptées cycle par cycle
- `FakeCoordinatorServer` : le même état servi en HTTP (axum) sur un port
  éphémère, pour tester le vrai client REST
*/

use anyhow::Result;
use async_trait::async_trait;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use prestoctl_core::status::coordinator::{
    CoordinatorClient, CoordinatorError, DiscoveredNode, CATALOGS_PATH, NODES_PATH, QUERY_PATH,
};
use serde_json::Value;
use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tracing::info;

pub const STUB_VERSION: &str = "0.101";
const STUB_URL: &str = "http://stub-coordinator:8080";

/// Nœud actif tel que le coordinateur le rapporte
pub fn discovered(node_id: &str, ip: &str) -> DiscoveredNode {
    DiscoveredNode {
        node_id: node_id.to_string(),
        http_uri: format!("http://{ip}:8080"),
        node_version: STUB_VERSION.to_string(),
        coordinator: false,
        state: "active".to_string(),
    }
}

#[derive(Default)]
struct StubState {
    nodes: Vec<DiscoveredNode>,
    connectors: Vec<String>,
    queries: HashMap<String, Value>,
    failing: bool,
    /// Listes de nœuds renvoyées aux prochains appels, avant `nodes`
    scripted: VecDeque<Vec<DiscoveredNode>>,
    node_requests: usize,
}

#[derive(Clone, Default)]
pub struct StubCoordinator {
    state: Arc<Mutex<StubState>>,
}

impl StubCoordinator {
    pub fn new() -> Self {
        let stub = Self::default();
        stub.state.lock().connectors = vec!["system".to_string(), "tpch".to_string()];
        stub
    }

    pub fn add_node(&self, node: DiscoveredNode) -> &Self {
        self.state.lock().nodes.push(node);
        self
    }

    pub fn remove_node(&self, node_id: &str) -> &Self {
        self.state.lock().nodes.retain(|n| n.node_id != node_id);
        self
    }

    pub fn set_connectors<S: Into<String>>(&self, connectors: impl IntoIterator<Item = S>) {
        self.state.lock().connectors = connectors.into_iter().map(Into::into).collect();
    }

    pub fn add_query<S: Into<String>>(&self, query_id: S, document: Value) {
        self.state.lock().queries.insert(query_id.into(), document);
    }

    pub fn set_failing(&self, failing: bool) {
        self.state.lock().failing = failing;
    }

    /// Les prochains appels à `nodes()` consomment ces réponses dans l'ordre.
    pub fn script_nodes(&self, answers: Vec<Vec<DiscoveredNode>>) {
        self.state.lock().scripted.extend(answers);
    }

    pub fn node_requests(&self) -> usize {
        self.state.lock().node_requests
    }

    fn unavailable(path: &str) -> CoordinatorError {
        CoordinatorError::Unreachable {
            url: format!("{STUB_URL}{path}"),
            reason: "Connection refused".to_string(),
        }
    }
}

#[async_trait]
impl CoordinatorClient for StubCoordinator {
    async fn nodes(&self) -> Result<Vec<DiscoveredNode>, CoordinatorError> {
        let mut state = self.state.lock();
        state.node_requests += 1;
        if state.failing {
            return Err(Self::unavailable(NODES_PATH));
        }
        let nodes = match state.scripted.pop_front() {
            Some(nodes) => nodes,
            None => state.nodes.clone(),
        };
        info!("🛰️ [MOCK] coordinator reports {} nodes", nodes.len());
        Ok(nodes)
    }

    async fn connectors(&self) -> Result<Vec<String>, CoordinatorError> {
        let state = self.state.lock();
        if state.failing {
            return Err(Self::unavailable(CATALOGS_PATH));
        }
        Ok(state.connectors.clone())
    }

    async fn query_info(&self, query_id: &str) -> Result<Value, CoordinatorError> {
        let state = self.state.lock();
        let path = format!("{QUERY_PATH}/{query_id}");
        if state.failing {
            return Err(Self::unavailable(&path));
        }
        state
            .queries
            .get(query_id)
            .cloned()
            .ok_or(CoordinatorError::Status {
                url: format!("{STUB_URL}{path}"),
                status: 404,
            })
    }
}

/// Serveur HTTP minimal imitant l'API REST du coordinateur
pub struct FakeCoordinatorServer {
    pub addr: SocketAddr,
    handle: JoinHandle<()>,
}

fn status_of(err: CoordinatorError) -> StatusCode {
    match err {
        CoordinatorError::Status { status, .. } => {
            StatusCode::from_u16(status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
        }
        _ => StatusCode::SERVICE_UNAVAILABLE,
    }
}

async fn get_nodes(
    State(stub): State<StubCoordinator>,
) -> Result<Json<Vec<DiscoveredNode>>, StatusCode> {
    stub.nodes().await.map(Json).map_err(status_of)
}

async fn get_catalogs(State(stub): State<StubCoordinator>) -> Result<Json<Vec<String>>, StatusCode> {
    stub.connectors().await.map(Json).map_err(status_of)
}

async fn get_query(
    State(stub): State<StubCoordinator>,
    Path(id): Path<String>,
) -> Result<Json<Value>, StatusCode> {
    stub.query_info(&id).await.map(Json).map_err(status_of)
}

impl FakeCoordinatorServer {
    pub async fn start(stub: StubCoordinator) -> Result<Self> {
        let app = Router::new()
            .route(NODES_PATH, get(get_nodes))
            .route(CATALOGS_PATH, get(get_catalogs))
            .route(&format!("{QUERY_PATH}/{{id}}"), get(get_query))
            .with_state(stub);

        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let handle = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!("fake coordinator stopped: {}", e);
            }
        });
        info!("🧪 Fake coordinator listening on http://{}", addr);
        Ok(Self { addr, handle })
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }
}

impl Drop for FakeCoordinatorServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}
