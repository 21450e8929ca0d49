//! REST API
//!
//! - `GET /health`: liveness, no authentication
//! - `GET /status`: fresh cycle through the retry driver; the result
//!   replaces the cached report
//! - `GET /status/last`: the cached report, 404 before the first cycle
//! - `GET /config/{host}`: the host's validated configuration files
//!
//! Every route but `/health` requires `x-api-key`; no configured key means
//! no access.

use axum::extract::{Path, Request, State};
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use parking_lot::Mutex;
use prestoctl_core::config::load_host_config;
use prestoctl_core::status::{ClusterStatusReport, RetryDriver, StatusSource};
use prestoctl_core::{ConfigurationError, Topology};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

pub const API_KEY_ENV: &str = "PRESTOCTL_API_KEY";

pub type Shared<T> = Arc<Mutex<T>>;

#[derive(Clone)]
pub struct AppState {
    pub driver: Arc<RetryDriver<Arc<dyn StatusSource>>>,
    pub last: Shared<Option<ClusterStatusReport>>,
    pub topology: Arc<Topology>,
    pub config_dir: PathBuf,
    pub api_key: Option<String>,
}

#[derive(Serialize)]
struct ConfigFileView {
    name: String,
    content: String,
}

#[derive(Serialize)]
struct ErrorView {
    error: String,
}

fn error(status: StatusCode, message: impl ToString) -> Response {
    (
        status,
        Json(ErrorView {
            error: message.to_string(),
        }),
    )
        .into_response()
}

async fn require_api_key(
    State(app): State<AppState>,
    req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    if req.uri().path().starts_with("/health") {
        return Ok(next.run(req).await);
    }

    let Some(expected) = app.api_key.as_deref().filter(|k| !k.is_empty()) else {
        warn!("{} not set - API access denied", API_KEY_ENV);
        return Err(StatusCode::UNAUTHORIZED);
    };

    let ok = req
        .headers()
        .get("x-api-key")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !ok {
        warn!("unauthorized request to {}", req.uri().path());
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(req).await)
}

pub fn build_router(app_state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        .route("/status", get(get_status))
        .route("/status/last", get(get_last_status))
        .route("/config/{host}", get(get_config))
        .layer(middleware::from_fn_with_state(app_state.clone(), require_api_key))
        .with_state(app_state)
}

// GET /status
async fn get_status(State(app): State<AppState>) -> Json<ClusterStatusReport> {
    let report = app.driver.run().await;
    *app.last.lock() = Some(report.clone());
    Json(report)
}

// GET /status/last
async fn get_last_status(State(app): State<AppState>) -> Response {
    match app.last.lock().clone() {
        Some(report) => Json(report).into_response(),
        None => error(StatusCode::NOT_FOUND, "no status collected yet"),
    }
}

// GET /config/{host}
async fn get_config(State(app): State<AppState>, Path(host): Path<String>) -> Response {
    match load_host_config(&app.topology, &host, &app.config_dir) {
        Ok(bundle) => {
            let files: Vec<ConfigFileView> = bundle
                .render()
                .into_iter()
                .map(|(name, content)| ConfigFileView { name, content })
                .collect();
            Json(files).into_response()
        }
        Err(e @ ConfigurationError::UnknownHost(_)) => error(StatusCode::NOT_FOUND, e),
        Err(e) => error(StatusCode::UNPROCESSABLE_ENTITY, e),
    }
}

pub async fn serve(app_state: AppState, addr: std::net::SocketAddr) -> anyhow::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("listening on http://{}", listener.local_addr()?);
    axum::serve(listener, build_router(app_state)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use prestoctl_core::status::RetryPolicy;
    use prestoctl_devkit::{ClusterHarness, HostBehavior};
    use std::net::SocketAddr;

    const KEY: &str = "test-key";

    fn state(harness: &ClusterHarness, config_dir: PathBuf) -> AppState {
        let source: Arc<dyn StatusSource> = Arc::new(harness.aggregator());
        AppState {
            driver: Arc::new(RetryDriver::new(source, RetryPolicy::once())),
            last: Arc::new(Mutex::new(None)),
            topology: Arc::new(harness.topology.clone()),
            config_dir,
            api_key: Some(KEY.to_string()),
        }
    }

    async fn spawn(app_state: AppState) -> SocketAddr {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, build_router(app_state)).await.unwrap();
        });
        addr
    }

    fn get(addr: SocketAddr, path: &str) -> reqwest::RequestBuilder {
        reqwest::Client::new().get(format!("http://{addr}{path}"))
    }

    #[tokio::test]
    async fn test_api_key_required_except_health() {
        let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn(state(&harness, dir.path().to_path_buf())).await;

        let health = get(addr, "/health").send().await.unwrap();
        assert_eq!(health.status(), 200);

        let denied = get(addr, "/status/last").send().await.unwrap();
        assert_eq!(denied.status(), 401);

        let wrong = get(addr, "/status/last")
            .header("x-api-key", "nope")
            .send()
            .await
            .unwrap();
        assert_eq!(wrong.status(), 401);
    }

    #[tokio::test]
    async fn test_unset_key_denies_everything() {
        let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let mut app_state = state(&harness, dir.path().to_path_buf());
        app_state.api_key = None;
        let addr = spawn(app_state).await;

        let resp = get(addr, "/status").header("x-api-key", "").send().await.unwrap();
        assert_eq!(resp.status(), 401);
    }

    #[tokio::test]
    async fn test_status_caches_last_report() {
        let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
        harness.set_host("slave1", HostBehavior::Unreachable);
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn(state(&harness, dir.path().to_path_buf())).await;

        let before = get(addr, "/status/last").header("x-api-key", KEY).send().await.unwrap();
        assert_eq!(before.status(), 404);

        let fresh: serde_json::Value = get(addr, "/status")
            .header("x-api-key", KEY)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(fresh["nodes"][1]["label"], "slave1(down)");

        let last: serde_json::Value = get(addr, "/status/last")
            .header("x-api-key", KEY)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(last["nodes"], fresh["nodes"]);
    }

    #[tokio::test]
    async fn test_config_route() {
        let harness = ClusterHarness::new("master", &["slave1"]).unwrap();
        let dir = tempfile::tempdir().unwrap();
        let addr = spawn(state(&harness, dir.path().to_path_buf())).await;

        let files: serde_json::Value = get(addr, "/config/slave1")
            .header("x-api-key", KEY)
            .send()
            .await
            .unwrap()
            .json()
            .await
            .unwrap();
        assert_eq!(files[0]["name"], "node.properties");
        assert!(files[2]["content"]
            .as_str()
            .unwrap()
            .contains("discovery.uri=http://master:8080"));

        let missing = get(addr, "/config/nobody").header("x-api-key", KEY).send().await.unwrap();
        assert_eq!(missing.status(), 404);
    }
}
