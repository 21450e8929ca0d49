//! Diagnostics collection into the local debug directory
//!
//! - `query_info`: one query document from the coordinator
//! - `system_info`: node list, connectors and per-host version details

use crate::remote::RemoteExecutor;
use crate::status::coordinator::{normalize_connectors, CoordinatorClient};
use crate::topology::Topology;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info, warn};

#[derive(Debug, Error)]
pub enum CollectError {
    #[error(
        "Unable to retrieve information. Please check that the query_id is correct, \
         or check that server is up with command: server status"
    )]
    QueryInfo,

    #[error(
        "Unable to access node information. Please check that server is up with command: server status"
    )]
    NodeInfo,

    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to encode {what}: {source}")]
    Encode {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

pub fn valid_query_id(id: &str) -> bool {
    !id.is_empty()
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.'))
        && id != "."
        && id != ".."
}

async fn write_file(path: &Path, contents: &str) -> Result<(), CollectError> {
    let io_err = |source| CollectError::Write {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent).await.map_err(io_err)?;
    }
    tokio::fs::write(path, contents).await.map_err(io_err)
}

/// Writes `query_info_<id>.json` and returns its path.
pub async fn query_info(
    client: &dyn CoordinatorClient,
    query_id: &str,
    debug_dir: &Path,
) -> Result<PathBuf, CollectError> {
    if !valid_query_id(query_id) {
        warn!("rejected query id {:?}", query_id);
        return Err(CollectError::QueryInfo);
    }
    let document = client.query_info(query_id).await.map_err(|e| {
        warn!("query info for {}: {}", query_id, e);
        CollectError::QueryInfo
    })?;

    let path = debug_dir.join(format!("query_info_{query_id}.json"));
    let json = serde_json::to_string_pretty(&document).map_err(|source| CollectError::Encode {
        what: "query info",
        source,
    })?;
    write_file(&path, &json).await?;
    info!("Gathered query information in file: {}", path.display());
    Ok(path)
}

/// Writes the `sysinfo/` tree and returns its root. Unreachable hosts are skipped.
pub async fn system_info(
    client: &dyn CoordinatorClient,
    executor: &dyn RemoteExecutor,
    topology: &Topology,
    debug_dir: &Path,
) -> Result<PathBuf, CollectError> {
    let root = debug_dir.join("sysinfo");

    let nodes = client.nodes().await.map_err(|e| {
        warn!("node info: {}", e);
        CollectError::NodeInfo
    })?;
    let node_file = root.join("node_info.json");
    let json = serde_json::to_string_pretty(&nodes).map_err(|source| CollectError::Encode {
        what: "node info",
        source,
    })?;
    write_file(&node_file, &json).await?;
    debug!("Gathered node information in file: {}", node_file.display());

    let connectors = client.connectors().await.map_err(|e| {
        warn!("connector info: {}", e);
        CollectError::NodeInfo
    })?;
    let conn_file = root.join("connector_info.txt");
    write_file(&conn_file, &format!("{}\n", normalize_connectors(connectors).join(", "))).await?;
    debug!("Gathered connector information in file: {}", conn_file.display());

    for host in topology.hosts() {
        let server_version = nodes
            .iter()
            .find(|n| n.ip() == host)
            .map(|n| n.node_version.as_str());
        let Some(version_info) = host_version_info(executor, host, server_version).await else {
            continue;
        };
        let path = root.join(host).join("version_info.txt");
        write_file(&path, &version_info).await?;
        debug!("Gathered version information in file: {}", path.display());
    }

    info!("System info collected in: {}", root.display());
    Ok(root)
}

async fn host_version_info(
    executor: &dyn RemoteExecutor,
    host: &str,
    server_version: Option<&str>,
) -> Option<String> {
    let platform = match executor.run(host, "uname -a").await {
        Ok(out) => out.stdout.trim().to_string(),
        Err(e) => {
            warn!("skipping {}: {}", host, e);
            return None;
        }
    };
    // java prints its version on stderr
    let java = match executor.run(host, "java -version").await {
        Ok(out) if out.success() => {
            let text = if out.stderr.trim().is_empty() { &out.stdout } else { &out.stderr };
            text.trim().to_string()
        }
        Ok(out) => format!("unavailable (exit code {})", out.exit_code),
        Err(e) => {
            warn!("skipping {}: {}", host, e);
            return None;
        }
    };
    Some(format!(
        "platform information : {platform}\n\
         Java version: {java}\n\
         Presto-admin version: {}\n\
         Presto server version: {}\n",
        env!("CARGO_PKG_VERSION"),
        server_version.unwrap_or("unavailable (not listed by the coordinator)"),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_id_charset() {
        assert!(valid_query_id("20150512_235353_00001_8x4mn"));
        assert!(valid_query_id("q-1.2"));
        assert!(!valid_query_id(""));
        assert!(!valid_query_id("../etc/passwd"));
        assert!(!valid_query_id(".."));
        assert!(!valid_query_id("a b"));
    }

    #[test]
    fn test_error_messages() {
        assert!(CollectError::QueryInfo
            .to_string()
            .starts_with("Unable to retrieve information."));
        assert!(CollectError::NodeInfo
            .to_string()
            .ends_with("command: server status"));
    }
}
