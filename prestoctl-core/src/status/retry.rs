//! Retry driver: re-runs whole aggregation cycles while the report still
//! holds a transient condition. Running out of attempts is not an error;
//! the last report is the answer.

use super::aggregate::StatusSource;
use super::node::ClusterStatusReport;
use crate::settings::StatusSettings;
use std::time::Duration;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    attempts: u32,
    wait: Duration,
}

impl RetryPolicy {
    /// Fewer than one attempt is treated as one.
    pub fn new(attempts: u32, wait: Duration) -> Self {
        Self {
            attempts: attempts.max(1),
            wait,
        }
    }

    pub fn once() -> Self {
        Self::new(1, Duration::ZERO)
    }

    pub fn from_settings(settings: &StatusSettings) -> Self {
        Self::new(settings.retry_attempts, settings.retry_wait())
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn wait(&self) -> Duration {
        self.wait
    }
}

pub struct RetryDriver<S> {
    source: S,
    policy: RetryPolicy,
}

impl<S: StatusSource> RetryDriver<S> {
    pub fn new(source: S, policy: RetryPolicy) -> Self {
        Self { source, policy }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub async fn run(&self) -> ClusterStatusReport {
        let mut attempt = 1;
        loop {
            let report = self.source.collect().await;
            if report.is_stable() {
                debug!("stable report after {} attempt(s)", attempt);
                return report;
            }
            if attempt >= self.policy.attempts {
                info!(
                    "giving up after {} attempt(s), {} host(s) still transient",
                    attempt,
                    report.transient_hosts().len()
                );
                return report;
            }
            for (host, status) in report.transient_hosts() {
                debug!("{} is transient ({:?})", host, status);
            }
            info!(
                "attempt {}/{}: cluster not settled, retrying in {:?}",
                attempt, self.policy.attempts, self.policy.wait
            );
            attempt += 1;
            tokio::time::sleep(self.policy.wait).await;
        }
    }
}
