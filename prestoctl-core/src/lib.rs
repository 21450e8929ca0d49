//! Cluster administration core for Presto
//!
//! Two independent halves share the topology:
//! - `config`: per-host configuration bundles (defaults, overrides, validation)
//! - `status`: probing hosts, asking the coordinator, reconciling both
//!
//! `remote` abstracts command execution on cluster hosts, `collect` gathers
//! diagnostics and `settings` holds the admin-side knobs.

pub mod collect;
pub mod config;
pub mod error;
pub mod remote;
pub mod settings;
pub mod status;
pub mod topology;

pub use config::{build_host_config, load_host_config, ConfigBundle, ConfigPayload};
pub use error::{ConfigurationError, TopologyError};
pub use remote::{CommandOutput, RemoteError, RemoteExecutor, SshExecutor};
pub use settings::AdminSettings;
pub use status::{ClusterStatusReport, NodeStatus, RetryDriver, RetryPolicy, StatusAggregator};
pub use topology::{Role, Topology};
