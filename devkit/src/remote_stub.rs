/*!
Exécuteur distant simulé pour tests sans SSH

Chaque hôte reçoit un comportement scripté (sain, arrêté, non installé,
injoignable, bloqué). Toutes les commandes reçues sont enregistrées pour
les assertions.
*/

use async_trait::async_trait;
use parking_lot::Mutex;
use prestoctl_core::remote::{CommandOutput, RemoteError, RemoteExecutor};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostBehavior {
    /// Presto installé et démarré, `node.id` donné
    Healthy { node_id: String },
    NotRunning,
    NotInstalled,
    Unreachable,
    /// Ne répond jamais (teste le timeout de la sonde)
    Hangs,
    /// Sortie arbitraire renvoyée telle quelle
    Raw(String),
}

impl HostBehavior {
    pub fn healthy<S: Into<String>>(node_id: S) -> Self {
        HostBehavior::Healthy {
            node_id: node_id.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCall {
    pub host: String,
    pub command: String,
}

/// Mock de `RemoteExecutor` partagé entre le test et l'agrégateur
#[derive(Clone, Default)]
pub struct MockRemoteExecutor {
    behaviors: Arc<Mutex<HashMap<String, HostBehavior>>>,
    calls: Arc<Mutex<Vec<MockCall>>>,
}

impl MockRemoteExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_host<S: Into<String>>(&self, host: S, behavior: HostBehavior) -> &Self {
        self.behaviors.lock().insert(host.into(), behavior);
        self
    }

    pub fn behavior(&self, host: &str) -> HostBehavior {
        self.behaviors
            .lock()
            .get(host)
            .cloned()
            .unwrap_or(HostBehavior::Unreachable)
    }

    pub fn calls(&self) -> Vec<MockCall> {
        self.calls.lock().clone()
    }

    pub fn calls_for(&self, host: &str) -> Vec<MockCall> {
        self.calls
            .lock()
            .iter()
            .filter(|c| c.host == host)
            .cloned()
            .collect()
    }

    pub fn clear(&self) {
        self.calls.lock().clear();
    }

    fn probe_output(behavior: &HostBehavior) -> String {
        match behavior {
            HostBehavior::Healthy { node_id } => {
                format!("installed=true\nrunning=true\nnode_id={node_id}\n")
            }
            HostBehavior::NotRunning => "installed=true\nrunning=false\nnode_id=\n".to_string(),
            HostBehavior::NotInstalled => "installed=false\nrunning=false\nnode_id=\n".to_string(),
            HostBehavior::Raw(out) => out.clone(),
            HostBehavior::Unreachable | HostBehavior::Hangs => String::new(),
        }
    }

    fn output(stdout: String, stderr: String) -> CommandOutput {
        CommandOutput {
            exit_code: 0,
            stdout,
            stderr,
            execution_time_ms: 1,
        }
    }
}

#[async_trait]
impl RemoteExecutor for MockRemoteExecutor {
    async fn run(&self, host: &str, command: &str) -> Result<CommandOutput, RemoteError> {
        self.calls.lock().push(MockCall {
            host: host.to_string(),
            command: command.to_string(),
        });
        let behavior = self.behavior(host);
        info!("🔌 [MOCK] {} ({:?}): {}", host, behavior, command);

        match behavior {
            HostBehavior::Unreachable => Err(RemoteError::Unreachable {
                host: host.to_string(),
                reason: "Connection refused".to_string(),
            }),
            HostBehavior::Hangs => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Err(RemoteError::TimedOut {
                    host: host.to_string(),
                    secs: 3600,
                })
            }
            behavior => Ok(match command {
                "uname -a" => Self::output(
                    format!("Linux {host} 5.15.0 x86_64 GNU/Linux\n"),
                    String::new(),
                ),
                "java -version" => Self::output(
                    String::new(),
                    "openjdk version \"1.8.0_292\"\n".to_string(),
                ),
                _ => Self::output(Self::probe_output(&behavior), String::new()),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_scripted_hosts() {
        let remote = MockRemoteExecutor::new();
        remote
            .set_host("a", HostBehavior::healthy("a-id"))
            .set_host("b", HostBehavior::NotInstalled);

        let out = remote.run("a", "probe").await.unwrap();
        assert!(out.stdout.contains("node_id=a-id"));
        let out = remote.run("b", "probe").await.unwrap();
        assert!(out.stdout.starts_with("installed=false"));
        assert!(remote.run("unknown", "probe").await.is_err());

        assert_eq!(remote.calls().len(), 3);
        assert_eq!(remote.calls_for("a")[0].command, "probe");
    }
}
