//! Remote command execution on cluster hosts
//!
//! Handles:
//! - The `RemoteExecutor` capability consumed by the node prober and diagnostics
//! - An SSH implementation driving the system `ssh` client
//! - Telling "could not reach the host" apart from "command ran and failed"

use crate::settings::SshSettings;
use async_trait::async_trait;
use serde::Serialize;
use std::process::Stdio;
use std::time::{Duration, Instant};
use thiserror::Error;
use tokio::process::Command as AsyncCommand;
use tracing::debug;

/// ssh exits with 255 when the connection itself failed.
const SSH_CONNECTION_FAILURE: i32 = 255;

/// Result of a command that actually ran on the host
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
    pub execution_time_ms: u128,
}

impl CommandOutput {
    pub fn success(&self) -> bool {
        self.exit_code == 0
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RemoteError {
    #[error("unable to connect to host {host}: {reason}")]
    Unreachable { host: String, reason: String },

    #[error("command on host {host} timed out after {secs}s")]
    TimedOut { host: String, secs: u64 },

    #[error("failed to launch remote command for host {host}: {reason}")]
    Launch { host: String, reason: String },
}

impl RemoteError {
    /// The host gave no answer. `Launch` failed locally before any
    /// connection was attempted.
    pub fn is_connection_failure(&self) -> bool {
        matches!(
            self,
            RemoteError::Unreachable { .. } | RemoteError::TimedOut { .. }
        )
    }

    pub fn host(&self) -> &str {
        match self {
            RemoteError::Unreachable { host, .. }
            | RemoteError::TimedOut { host, .. }
            | RemoteError::Launch { host, .. } => host,
        }
    }
}

#[async_trait]
pub trait RemoteExecutor: Send + Sync {
    /// Run `command` through the remote shell of `host`.
    async fn run(&self, host: &str, command: &str) -> Result<CommandOutput, RemoteError>;
}

/// Runs commands with the system ssh client in batch mode
pub struct SshExecutor {
    settings: SshSettings,
}

impl SshExecutor {
    pub fn new(settings: SshSettings) -> Self {
        Self { settings }
    }

    pub fn ssh_args(&self, host: &str, command: &str) -> Result<Vec<String>, RemoteError> {
        let s = &self.settings;
        let mut args = vec![
            "-o".to_string(),
            "BatchMode=yes".to_string(),
            "-o".to_string(),
            format!("ConnectTimeout={}", s.connect_timeout_secs),
            "-p".to_string(),
            s.port.to_string(),
        ];
        if let Some(identity) = &s.identity_file {
            args.push("-i".to_string());
            args.push(identity.display().to_string());
        }
        if let Some(extra) = &s.extra_options {
            let extra = shell_words::split(extra).map_err(|e| RemoteError::Launch {
                host: host.to_string(),
                reason: format!("invalid ssh extra_options: {e}"),
            })?;
            args.extend(extra);
        }
        args.push(format!("{}@{}", s.user, host));
        args.push(command.to_string());
        Ok(args)
    }
}

#[async_trait]
impl RemoteExecutor for SshExecutor {
    async fn run(&self, host: &str, command: &str) -> Result<CommandOutput, RemoteError> {
        let start_time = Instant::now();
        let args = self.ssh_args(host, command)?;
        debug!("ssh {}: {}", host, command);

        let timeout_secs = self.settings.command_timeout_secs;
        let output = tokio::time::timeout(
            Duration::from_secs(timeout_secs),
            AsyncCommand::new(&self.settings.binary)
                .args(&args)
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .kill_on_drop(true)
                .output(),
        )
        .await
        .map_err(|_| RemoteError::TimedOut {
            host: host.to_string(),
            secs: timeout_secs,
        })?
        .map_err(|e| RemoteError::Launch {
            host: host.to_string(),
            reason: e.to_string(),
        })?;

        classify(
            host,
            output.status.code().unwrap_or(-1),
            String::from_utf8_lossy(&output.stdout).to_string(),
            String::from_utf8_lossy(&output.stderr).to_string(),
            start_time.elapsed().as_millis(),
        )
    }
}

fn classify(
    host: &str,
    exit_code: i32,
    stdout: String,
    stderr: String,
    execution_time_ms: u128,
) -> Result<CommandOutput, RemoteError> {
    if exit_code == SSH_CONNECTION_FAILURE {
        let reason = stderr.trim();
        return Err(RemoteError::Unreachable {
            host: host.to_string(),
            reason: if reason.is_empty() {
                "connection failed".to_string()
            } else {
                reason.to_string()
            },
        });
    }
    Ok(CommandOutput {
        exit_code,
        stdout,
        stderr,
        execution_time_ms,
    })
}
