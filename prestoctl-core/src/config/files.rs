//! Reading user overrides from the local configuration directory
//!
//! Layout, one directory per role:
//! ```text
//! <config dir>/coordinator/{node.properties,jvm.config,config.properties}
//! <config dir>/workers/{node.properties,jvm.config,config.properties}
//! ```
//! A missing directory or file simply means "no override".

use super::bundle::{ConfigBundle, ConfigPayload, FlagList, PropertySet, JVM_CONFIG, REQUIRED_FILES};
use crate::error::ConfigurationError;
use crate::topology::Role;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub fn role_dir(config_dir: &Path, role: Role) -> PathBuf {
    match role {
        Role::Coordinator => config_dir.join("coordinator"),
        Role::Worker => config_dir.join("workers"),
    }
}

/// Overrides for one role, or `None` when the role has no override files at all.
pub fn load_role_overrides(
    config_dir: &Path,
    role: Role,
) -> Result<Option<ConfigBundle>, ConfigurationError> {
    let dir = role_dir(config_dir, role);
    if !dir.is_dir() {
        debug!("no override directory at {}", dir.display());
        return Ok(None);
    }

    warn_unknown_files(&dir);

    let mut bundle = ConfigBundle::new();
    for name in REQUIRED_FILES {
        let path = dir.join(name);
        if !path.is_file() {
            continue;
        }
        let text = std::fs::read_to_string(&path).map_err(|e| ConfigurationError::Unreadable {
            path: path.clone(),
            reason: e.to_string(),
        })?;
        let payload = if name == JVM_CONFIG {
            ConfigPayload::Flags(parse_flags(&text))
        } else {
            ConfigPayload::Properties(parse_properties(&path, &text)?)
        };
        debug!("loaded {} override from {}", name, path.display());
        bundle.insert(name, payload);
    }

    Ok(if bundle.is_empty() { None } else { Some(bundle) })
}

fn warn_unknown_files(dir: &Path) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let name = entry.file_name();
        let name = name.to_string_lossy();
        if entry.path().is_file() && !REQUIRED_FILES.contains(&&*name) {
            warn!("ignoring unsupported override file {}", entry.path().display());
        }
    }
}

/// `key=value` or `key: value` per line; `#` and `!` start comments.
pub fn parse_properties(path: &Path, text: &str) -> Result<PropertySet, ConfigurationError> {
    let mut props = PropertySet::new();
    for (idx, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') || line.starts_with('!') {
            continue;
        }
        let Some(split) = line.find(['=', ':']) else {
            return Err(ConfigurationError::MalformedLine {
                file: path.to_path_buf(),
                line: idx + 1,
                content: line.to_string(),
            });
        };
        let (key, value) = (&line[..split], &line[split + 1..]);
        props.insert(key.trim(), value.trim());
    }
    Ok(props)
}

pub fn parse_flags(text: &str) -> FlagList {
    text.lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with('#'))
        .collect()
}
