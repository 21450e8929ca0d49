//! Role-aware configuration engine
//!
//! Turns the topology plus optional user overrides into a validated
//! per-host bundle:
//! - `defaults`: baseline bundle for (topology, host, role)
//! - `merge`: property sets key-wise, flag lists whole-value
//! - `validate`: ordered structural and role rules
//! - `files`: override directories on the admin host

pub mod bundle;
pub mod defaults;
pub mod files;
pub mod merge;
pub mod validate;

pub use bundle::{
    ConfigBundle, ConfigPayload, FlagList, PropertySet, CONFIG_PROPERTIES, JVM_CONFIG,
    NODE_PROPERTIES, REQUIRED_FILES,
};
pub use defaults::{build_defaults, discovery_uri, DEFAULT_HTTP_PORT};
pub use merge::{merge, merge_properties, replace_flags};
pub use validate::validate;

use crate::error::ConfigurationError;
use crate::topology::Topology;
use std::path::Path;
use tracing::debug;

/// defaults → merge → validate for one host.
pub fn build_host_config(
    topology: &Topology,
    host: &str,
    overrides: Option<&ConfigBundle>,
) -> Result<ConfigBundle, ConfigurationError> {
    let role = topology
        .role_of(host)
        .ok_or_else(|| ConfigurationError::UnknownHost(host.to_string()))?;

    let defaults = build_defaults(topology, host, role);
    let merged = merge(&defaults, overrides);
    validate(&merged, topology, host)?;

    debug!("built {} configuration for {}", role, host);
    Ok(merged)
}

/// Same as [`build_host_config`] with overrides read from `config_dir` for the host's role.
pub fn load_host_config(
    topology: &Topology,
    host: &str,
    config_dir: &Path,
) -> Result<ConfigBundle, ConfigurationError> {
    let role = topology
        .role_of(host)
        .ok_or_else(|| ConfigurationError::UnknownHost(host.to_string()))?;
    let overrides = files::load_role_overrides(config_dir, role)?;
    build_host_config(topology, host, overrides.as_ref())
}
