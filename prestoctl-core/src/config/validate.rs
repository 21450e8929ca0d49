//! Structural and role-dependent checks on a merged bundle
//!
//! Rules run in a fixed order and the first violation is returned:
//! 1. required files present (and of the right payload kind)
//! 2. a non-coordinator host has `coordinator=false`
//! 3. `discovery.uri` is defined
//! 4. `discovery.uri` starts with `http://`
//! 5. `discovery.uri` is not localhost in a multi-node cluster

use super::bundle::{ConfigBundle, CONFIG_PROPERTIES, JVM_CONFIG, REQUIRED_FILES};
use crate::error::ConfigurationError;
use crate::topology::Topology;

const HTTP_SCHEME: &str = "http://";

pub fn validate<'a>(
    bundle: &'a ConfigBundle,
    topology: &Topology,
    host: &str,
) -> Result<&'a ConfigBundle, ConfigurationError> {
    for name in REQUIRED_FILES {
        if !bundle.contains(name) {
            return Err(ConfigurationError::MissingFile(name.to_string()));
        }
    }
    check_kinds(bundle)?;

    let Some(config) = bundle.properties(CONFIG_PROPERTIES) else {
        return Err(ConfigurationError::MissingFile(CONFIG_PROPERTIES.to_string()));
    };

    if !topology.is_coordinator(host) && config.get("coordinator").map(str::trim) != Some("false")
    {
        return Err(ConfigurationError::WorkerMarkedCoordinator);
    }

    let uri = config
        .get("discovery.uri")
        .ok_or(ConfigurationError::MissingDiscoveryUri)?
        .trim();

    if !uri.starts_with(HTTP_SCHEME) {
        return Err(ConfigurationError::InvalidDiscoveryUri(uri.to_string()));
    }

    if topology.is_multi_node() && uri_host(uri).eq_ignore_ascii_case("localhost") {
        return Err(ConfigurationError::LocalhostInMultiNode);
    }

    Ok(bundle)
}

fn check_kinds(bundle: &ConfigBundle) -> Result<(), ConfigurationError> {
    for name in REQUIRED_FILES {
        let expected = if name == JVM_CONFIG { "flag list" } else { "property set" };
        match bundle.get(name) {
            Some(payload) if payload.kind() == expected => {}
            Some(_) => {
                return Err(ConfigurationError::WrongPayloadKind {
                    file: name.to_string(),
                    expected,
                })
            }
            None => return Err(ConfigurationError::MissingFile(name.to_string())),
        }
    }
    Ok(())
}

/// Host component of an `http://host[:port][/path]` URI.
pub(crate) fn uri_host(uri: &str) -> &str {
    let rest = uri.strip_prefix(HTTP_SCHEME).unwrap_or(uri);
    let authority = rest.split('/').next().unwrap_or(rest);
    let authority = authority.rsplit('@').next().unwrap_or(authority);
    if let Some(bracketed) = authority.strip_prefix('[') {
        return bracketed.split(']').next().unwrap_or(bracketed);
    }
    authority.split(':').next().unwrap_or(authority)
}
