//! Bounded readiness polling.
//!
//! Fixed number of attempts with a constant interval between failures; the
//! last failure is returned when the budget runs out.

use crate::admin::AdminClient;
use crate::config::ClusterConfig;
use crate::error::{GokiError, Result};
use crate::naming::NodeId;
use std::future::Future;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReadinessPoller {
    pub max_attempts: u32,
    pub interval: Duration,
}

impl Default for ReadinessPoller {
    fn default() -> Self {
        Self { max_attempts: 10, interval: Duration::from_secs(1) }
    }
}

impl ReadinessPoller {
    pub fn new(max_attempts: u32, interval: Duration) -> Self {
        Self { max_attempts, interval }
    }

    pub fn from_config(config: &ClusterConfig) -> Self {
        Self::new(config.readiness_attempts, config.readiness_interval())
    }

    /// Run `probe` until it succeeds or `max_attempts` are spent.
    pub async fn poll<F, Fut, T>(&self, mut probe: F) -> Result<T>
    where
        F: FnMut(u32) -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 1;
        loop {
            metrics::counter!("goki_readiness_attempts_total").increment(1);
            match probe(attempt).await {
                Ok(value) => return Ok(value),
                Err(e) if attempt >= self.max_attempts => {
                    return Err(GokiError::NotReady { attempts: attempt, last: Box::new(e) });
                }
                Err(e) => {
                    warn!(attempt, max = self.max_attempts, error = %e, "Not ready yet");
                    tokio::time::sleep(self.interval).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Wait until `node` answers a trivial query through the helper sandbox.
    pub async fn await_reachable(&self, admin: &AdminClient<'_>, node: NodeId) -> Result<()> {
        self.poll(|_| admin.ping(node)).await?;
        info!("CockroachDB is ready to accept connections");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn failure(n: u32) -> GokiError {
        GokiError::ToolFailed { command: "ping".to_string(), output: format!("attempt {}", n) }
    }

    #[tokio::test]
    async fn succeeds_on_nth_attempt() {
        let poller = ReadinessPoller::new(10, Duration::ZERO);
        let calls = Cell::new(0);
        let result = poller
            .poll(|attempt| {
                calls.set(calls.get() + 1);
                async move { if attempt == 4 { Ok(attempt) } else { Err(failure(attempt)) } }
            })
            .await;
        assert_eq!(result.unwrap(), 4);
        assert_eq!(calls.get(), 4);
    }

    #[tokio::test]
    async fn returns_last_failure_after_budget() {
        let poller = ReadinessPoller::new(3, Duration::ZERO);
        let calls = Cell::new(0);
        let result: Result<()> = poller
            .poll(|attempt| {
                calls.set(calls.get() + 1);
                async move { Err(failure(attempt)) }
            })
            .await;
        assert_eq!(calls.get(), 3);
        match result {
            Err(GokiError::NotReady { attempts, last }) => {
                assert_eq!(attempts, 3);
                assert!(last.to_string().contains("attempt 3"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn sleeps_between_failures_only() {
        let poller = ReadinessPoller::new(3, Duration::from_secs(1));
        let start = tokio::time::Instant::now();
        let _: Result<()> = poller.poll(|attempt| async move { Err(failure(attempt)) }).await;
        assert_eq!(start.elapsed(), Duration::from_secs(2));
    }

    #[tokio::test]
    async fn first_success_does_not_retry() {
        let poller = ReadinessPoller::default();
        let calls = Cell::new(0);
        poller
            .poll(|_| {
                calls.set(calls.get() + 1);
                async { Ok(()) }
            })
            .await
            .unwrap();
        assert_eq!(calls.get(), 1);
    }
}
