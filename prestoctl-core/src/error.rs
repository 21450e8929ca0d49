//! Error types shared by the topology and configuration modules
//!
//! Remote execution, coordinator and diagnostics errors live next to the
//! code that raises them (`remote`, `status::coordinator`, `collect`).

use std::path::PathBuf;
use thiserror::Error;

/// Raised while building or validating a per-host configuration bundle.
///
/// These are fatal to the configuration step: nothing retries them and
/// nothing repairs the bundle automatically.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigurationError {
    #[error("missing configuration for required file: {0}")]
    MissingFile(String),

    #[error("coordinator must be false in the worker's config.properties")]
    WorkerMarkedCoordinator,

    #[error("must have discovery.uri defined in config.properties")]
    MissingDiscoveryUri,

    #[error("discovery.uri must start with http://, current URI is: {0}")]
    InvalidDiscoveryUri(String),

    #[error("discovery.uri should not be localhost in a multi-node cluster")]
    LocalhostInMultiNode,

    #[error("{file} must be a {expected}")]
    WrongPayloadKind { file: String, expected: &'static str },

    #[error("host {0} is not part of the topology")]
    UnknownHost(String),

    #[error("malformed line {line} in {file}: {content}")]
    MalformedLine {
        file: PathBuf,
        line: usize,
        content: String,
    },

    #[error("failed to read {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },
}

/// Raised while building the cluster topology from the user's role mapping.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TopologyError {
    #[error("topology must name a coordinator")]
    MissingCoordinator,

    #[error("invalid host name {0:?}")]
    InvalidHost(String),

    #[error("worker {0} is listed more than once")]
    DuplicateWorker(String),

    #[error("invalid role name {0}. valid role names are coordinator, worker")]
    InvalidRole(String),

    #[error("failed to read topology file {path}: {reason}")]
    Unreadable { path: PathBuf, reason: String },

    #[error("malformed topology file {path}: {reason}")]
    Malformed { path: PathBuf, reason: String },
}
