//! Admin-side settings
//!
//! Handles:
//! - SSH access to cluster hosts
//! - Coordinator REST port and timeouts
//! - Status probing parallelism and retry policy
//! - Local and remote paths
//!
//! Loaded from YAML. A missing or broken file never stops the tool: it
//! falls back to defaults and says so in the log.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

pub const SETTINGS_ENV: &str = "PRESTOCTL_SETTINGS";

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdminSettings {
    pub ssh: SshSettings,
    pub coordinator: CoordinatorSettings,
    pub status: StatusSettings,
    pub paths: PathSettings,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SshSettings {
    pub binary: String,
    pub user: String,
    pub port: u16,
    pub identity_file: Option<PathBuf>,
    /// Extra client options, split shell-style (e.g. `-o StrictHostKeyChecking=no`)
    pub extra_options: Option<String>,
    pub connect_timeout_secs: u64,
    pub command_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoordinatorSettings {
    pub port: u16,
    pub request_timeout_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StatusSettings {
    pub max_parallel_probes: usize,
    pub probe_timeout_secs: u64,
    pub retry_attempts: u32,
    pub retry_wait_secs: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathSettings {
    /// Topology and per-role override files on the admin host
    pub config_dir: PathBuf,
    /// Where diagnostics are collected
    pub debug_dir: PathBuf,
    /// Presto configuration directory on cluster hosts
    pub remote_config_dir: PathBuf,
    pub launcher: PathBuf,
}

impl Default for SshSettings {
    fn default() -> Self {
        Self {
            binary: "ssh".to_string(),
            user: "root".to_string(),
            port: 22,
            identity_file: None,
            extra_options: None,
            connect_timeout_secs: 10,
            command_timeout_secs: 30,
        }
    }
}

impl Default for CoordinatorSettings {
    fn default() -> Self {
        Self {
            port: 8080,
            request_timeout_secs: 10,
        }
    }
}

impl Default for StatusSettings {
    fn default() -> Self {
        Self {
            max_parallel_probes: 10,
            probe_timeout_secs: 30,
            retry_attempts: 5,
            retry_wait_secs: 5,
        }
    }
}

impl Default for PathSettings {
    fn default() -> Self {
        Self {
            config_dir: PathBuf::from("/etc/opt/prestoadmin"),
            debug_dir: PathBuf::from("/tmp/presto-debug"),
            remote_config_dir: PathBuf::from("/etc/presto"),
            launcher: PathBuf::from("/usr/lib/presto/bin/launcher"),
        }
    }
}

impl StatusSettings {
    pub fn probe_timeout(&self) -> Duration {
        Duration::from_secs(self.probe_timeout_secs)
    }

    pub fn retry_wait(&self) -> Duration {
        Duration::from_secs(self.retry_wait_secs)
    }
}

impl PathSettings {
    pub fn topology_file(&self) -> PathBuf {
        self.config_dir.join("config.json")
    }
}

impl AdminSettings {
    /// `$PRESTOCTL_SETTINGS`, else `<config dir>/prestoctl/settings.yaml`.
    pub fn default_path() -> Option<PathBuf> {
        if let Ok(path) = std::env::var(SETTINGS_ENV) {
            return Some(PathBuf::from(path));
        }
        dirs::config_dir().map(|mut p| {
            p.push("prestoctl");
            p.push("settings.yaml");
            p
        })
    }

    pub async fn load() -> Self {
        match Self::default_path() {
            Some(path) => Self::load_from(&path).await,
            None => {
                warn!("no configuration directory on this platform, using default settings");
                Self::default()
            }
        }
    }

    pub async fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("no settings at {}, using defaults", path.display());
            return Self::default();
        }
        let txt = match tokio::fs::read_to_string(path).await {
            Ok(txt) => txt,
            Err(e) => {
                warn!("cannot read settings {}: {}", path.display(), e);
                return Self::default();
            }
        };
        if txt.trim().is_empty() {
            return Self::default();
        }
        serde_yaml::from_str(&txt).unwrap_or_else(|e| {
            warn!("invalid settings {}: {}, using defaults", path.display(), e);
            Self::default()
        })
    }
}
