//! Node prober: liveness of the Presto server on one host
//!
//! A single remote script answers three questions at once:
//! ```text
//! installed=true|false   launcher present and executable
//! running=true|false     `launcher status` exit code
//! node_id=<id>           node.id from the host's node.properties (may be empty)
//! ```

use super::node::{ProcessState, MSG_UNEXPECTED_PROBE_OUTPUT};
use crate::remote::RemoteExecutor;
use crate::settings::AdminSettings;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ProbeOutcome {
    Unreachable { reason: String },
    /// The probe could not be started from this machine
    Failed { reason: String },
    Unexpected { output: String },
    NotInstalled,
    NotRunning,
    Running,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeResult {
    pub host: String,
    pub outcome: ProbeOutcome,
    pub node_id: Option<String>,
}

impl ProbeResult {
    pub fn unreachable<S: Into<String>>(host: &str, reason: S) -> Self {
        Self {
            host: host.to_string(),
            outcome: ProbeOutcome::Unreachable {
                reason: reason.into(),
            },
            node_id: None,
        }
    }

    pub fn failed<S: Into<String>>(host: &str, reason: S) -> Self {
        Self {
            host: host.to_string(),
            outcome: ProbeOutcome::Failed {
                reason: reason.into(),
            },
            node_id: None,
        }
    }

    pub fn reachable(&self) -> bool {
        !matches!(self.outcome, ProbeOutcome::Unreachable { .. })
    }

    pub fn process_state(&self) -> ProcessState {
        match self.outcome {
            ProbeOutcome::Running => ProcessState::Running,
            ProbeOutcome::NotRunning | ProbeOutcome::NotInstalled => ProcessState::NotRunning,
            ProbeOutcome::Unreachable { .. }
            | ProbeOutcome::Failed { .. }
            | ProbeOutcome::Unexpected { .. } => ProcessState::Unknown,
        }
    }

    pub fn probe_error(&self) -> Option<String> {
        match &self.outcome {
            ProbeOutcome::Failed { reason } => Some(reason.clone()),
            ProbeOutcome::Unexpected { output } if output.is_empty() => {
                Some(MSG_UNEXPECTED_PROBE_OUTPUT.to_string())
            }
            ProbeOutcome::Unexpected { output } => {
                Some(format!("{MSG_UNEXPECTED_PROBE_OUTPUT}: {output}"))
            }
            _ => None,
        }
    }
}

pub struct NodeProber {
    executor: Arc<dyn RemoteExecutor>,
    launcher: PathBuf,
    node_properties: PathBuf,
    timeout: Duration,
}

impl NodeProber {
    pub fn new(
        executor: Arc<dyn RemoteExecutor>,
        launcher: &Path,
        remote_config_dir: &Path,
        timeout: Duration,
    ) -> Self {
        Self {
            executor,
            launcher: launcher.to_path_buf(),
            node_properties: remote_config_dir.join("node.properties"),
            timeout,
        }
    }

    pub fn from_settings(executor: Arc<dyn RemoteExecutor>, settings: &AdminSettings) -> Self {
        Self::new(
            executor,
            &settings.paths.launcher,
            &settings.paths.remote_config_dir,
            settings.status.probe_timeout(),
        )
    }

    pub fn script(&self) -> String {
        let launcher = shell_words::quote(&self.launcher.to_string_lossy()).into_owned();
        let props = shell_words::quote(&self.node_properties.to_string_lossy()).into_owned();
        format!(
            "if [ -x {launcher} ]; then echo installed=true; else echo installed=false; fi; \
             if {launcher} status >/dev/null 2>&1; then echo running=true; else echo running=false; fi; \
             echo node_id=$(sed -n 's/^node\\.id[[:space:]]*[=:][[:space:]]*//p' {props} 2>/dev/null | head -n 1)"
        )
    }

    /// Never fails: every problem becomes part of the result.
    pub async fn probe(&self, host: &str) -> ProbeResult {
        debug!("probing {}", host);
        let script = self.script();
        let result = match tokio::time::timeout(self.timeout, self.executor.run(host, &script)).await
        {
            Err(_) => ProbeResult::unreachable(
                host,
                format!(
                    "unable to connect to host {host}: probe timed out after {}s",
                    self.timeout.as_secs()
                ),
            ),
            Ok(Err(e)) if e.is_connection_failure() => ProbeResult::unreachable(host, e.to_string()),
            Ok(Err(e)) => ProbeResult::failed(host, e.to_string()),
            Ok(Ok(output)) => parse_probe_output(host, &output.stdout),
        };

        match &result.outcome {
            ProbeOutcome::Unreachable { reason } => warn!("{}", reason),
            ProbeOutcome::Failed { reason } => error!("{}", reason),
            ProbeOutcome::Unexpected { output } => {
                warn!("unexpected probe output from {}: {:?}", host, output)
            }
            outcome => debug!("probe {}: {:?}", host, outcome),
        }
        result
    }
}

pub fn parse_probe_output(host: &str, stdout: &str) -> ProbeResult {
    let mut installed = None;
    let mut running = None;
    let mut node_id = None;

    for line in stdout.lines() {
        let Some((key, value)) = line.trim().split_once('=') else {
            continue;
        };
        let value = value.trim();
        match key.trim() {
            "installed" => installed = value.parse::<bool>().ok(),
            "running" => running = value.parse::<bool>().ok(),
            "node_id" if !value.is_empty() => node_id = Some(value.to_string()),
            _ => {}
        }
    }

    let outcome = match (installed, running) {
        (Some(false), _) => ProbeOutcome::NotInstalled,
        (Some(true), Some(true)) => ProbeOutcome::Running,
        (Some(true), Some(false)) => ProbeOutcome::NotRunning,
        _ => ProbeOutcome::Unexpected {
            output: stdout.trim().to_string(),
        },
    };

    ProbeResult {
        host: host.to_string(),
        outcome,
        node_id,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_running() {
        let r = parse_probe_output("slave1", "installed=true\nrunning=true\nnode_id=abc-1\n");
        assert_eq!(r.outcome, ProbeOutcome::Running);
        assert_eq!(r.node_id.as_deref(), Some("abc-1"));
        assert!(r.reachable());
        assert_eq!(r.process_state(), ProcessState::Running);
    }

    #[test]
    fn test_parse_not_installed_wins() {
        let r = parse_probe_output("slave1", "installed=false\nrunning=false\nnode_id=\n");
        assert_eq!(r.outcome, ProbeOutcome::NotInstalled);
        assert_eq!(r.node_id, None);
        assert_eq!(r.process_state(), ProcessState::NotRunning);
    }

    #[test]
    fn test_parse_garbage() {
        let r = parse_probe_output("slave1", "bash: sed: command not found\n");
        assert!(matches!(r.outcome, ProbeOutcome::Unexpected { .. }));
        assert_eq!(r.process_state(), ProcessState::Unknown);
        assert!(r.reachable());
        assert!(r.probe_error().unwrap().starts_with("unexpected probe output"));
    }

    #[test]
    fn test_script_quotes_paths() {
        let prober = NodeProber::new(
            Arc::new(NoExecutor),
            Path::new("/opt/my presto/bin/launcher"),
            Path::new("/etc/presto"),
            Duration::from_secs(1),
        );
        let script = prober.script();
        assert!(script.contains("'/opt/my presto/bin/launcher' status"));
        assert!(script.contains("/etc/presto/node.properties"));
    }

    struct NoExecutor;

    #[async_trait::async_trait]
    impl RemoteExecutor for NoExecutor {
        async fn run(
            &self,
            host: &str,
            _command: &str,
        ) -> Result<crate::remote::CommandOutput, crate::remote::RemoteError> {
            Err(crate::remote::RemoteError::Unreachable {
                host: host.to_string(),
                reason: "no route".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_probe_unreachable() {
        let prober = NodeProber::new(
            Arc::new(NoExecutor),
            Path::new("/usr/lib/presto/bin/launcher"),
            Path::new("/etc/presto"),
            Duration::from_secs(1),
        );
        let r = prober.probe("slave3").await;
        assert_eq!(
            r.outcome,
            ProbeOutcome::Unreachable {
                reason: "unable to connect to host slave3: no route".into()
            }
        );
        assert_eq!(r.process_state(), ProcessState::Unknown);
    }

    struct BrokenSsh;

    #[async_trait::async_trait]
    impl RemoteExecutor for BrokenSsh {
        async fn run(
            &self,
            host: &str,
            _command: &str,
        ) -> Result<crate::remote::CommandOutput, crate::remote::RemoteError> {
            Err(crate::remote::RemoteError::Launch {
                host: host.to_string(),
                reason: "invalid ssh extra_options: missing closing quote".into(),
            })
        }
    }

    #[tokio::test]
    async fn test_local_launch_failure_is_not_unreachable() {
        let prober = NodeProber::new(
            Arc::new(BrokenSsh),
            Path::new("/usr/lib/presto/bin/launcher"),
            Path::new("/etc/presto"),
            Duration::from_secs(1),
        );
        let r = prober.probe("slave1").await;
        assert!(matches!(r.outcome, ProbeOutcome::Failed { .. }));
        assert!(r.reachable());
        assert_eq!(r.process_state(), ProcessState::Unknown);
        assert!(r.probe_error().unwrap().contains("invalid ssh extra_options"));
    }
}
