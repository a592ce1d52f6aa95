//! Node liveness classification.
//!
//! The control tool can list "running" sandboxes and "running or stopped"
//! sandboxes, nothing tri-state. Classification therefore takes two listings.

use crate::config::ClusterConfig;
use crate::error::{GokiError, Result};
use crate::naming::{Naming, NodeId, ResourceKind};
use crate::sandbox::{ListScope, SandboxClient};
use std::fmt;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Liveness {
    Running,
    Stopped,
    Absent,
}

impl fmt::Display for Liveness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Running => write!(f, "running"),
            Self::Stopped => write!(f, "stopped"),
            Self::Absent => write!(f, "absent"),
        }
    }
}

/// Classify `name` from the two listings.
pub fn classify(name: &str, running: &[String], all: &[String]) -> Liveness {
    if running.iter().any(|n| n == name) {
        Liveness::Running
    } else if all.iter().any(|n| n == name) {
        Liveness::Stopped
    } else {
        Liveness::Absent
    }
}

/// Every labeled node, grouped by liveness.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterLiveness {
    pub running: Vec<NodeId>,
    pub stopped: Vec<NodeId>,
    /// Labeled sandboxes, helper included.
    pub labeled: usize,
}

impl ClusterLiveness {
    pub fn node_count(&self) -> usize {
        self.running.len() + self.stopped.len()
    }
}

pub struct LivenessClassifier<'a> {
    client: &'a dyn SandboxClient,
    config: &'a ClusterConfig,
    naming: Naming,
}

impl<'a> LivenessClassifier<'a> {
    pub fn new(client: &'a dyn SandboxClient, config: &'a ClusterConfig) -> Self {
        Self { client, config, naming: Naming::new(&config.resource_prefix) }
    }

    async fn listings(&self) -> Result<(Vec<String>, Vec<String>)> {
        let label = &self.config.resource_label;
        let running = self.client.list(ResourceKind::Sandbox, label, ListScope::Running).await?;
        let all = self.client.list(ResourceKind::Sandbox, label, ListScope::All).await?;
        Ok((running, all))
    }

    /// Liveness of one node; a node missing from both listings is an error.
    pub async fn status(&self, node: NodeId) -> Result<Liveness> {
        let name = self.naming.node(node);
        let label = &self.config.resource_label;

        let running = self.client.list(ResourceKind::Sandbox, label, ListScope::Running).await?;
        if classify(&name, &running, &[]) == Liveness::Running {
            return Ok(Liveness::Running);
        }

        let all = self.client.list(ResourceKind::Sandbox, label, ListScope::All).await?;
        match classify(&name, &running, &all) {
            Liveness::Absent => Err(GokiError::NodeNotFound { name }),
            liveness => {
                debug!(node = %name, %liveness, "Classified node");
                Ok(liveness)
            }
        }
    }

    /// Classify every possible node id with a single pair of listings.
    pub async fn cluster(&self) -> Result<ClusterLiveness> {
        let (running, all) = self.listings().await?;
        let mut report = ClusterLiveness { labeled: all.len(), ..Default::default() };
        for node in NodeId::all() {
            match classify(&self.naming.node(node), &running, &all) {
                Liveness::Running => report.running.push(node),
                Liveness::Stopped => report.stopped.push(node),
                Liveness::Absent => {}
            }
        }
        Ok(report)
    }

    /// Kill a running node.
    pub async fn kill(&self, node: NodeId) -> Result<String> {
        let name = self.naming.node(node);
        if self.status(node).await? != Liveness::Running {
            return Err(GokiError::NotRunning { name });
        }
        self.client.kill(&name).await?;
        metrics::counter!("goki_nodes_killed_total").increment(1);
        info!(node = %name, "Killed node");
        Ok(name)
    }

    /// Start a stopped node again.
    pub async fn revive(&self, node: NodeId) -> Result<String> {
        let name = self.naming.node(node);
        if self.status(node).await? == Liveness::Running {
            return Err(GokiError::AlreadyRunning { name });
        }
        self.client.start(&name).await?;
        metrics::counter!("goki_nodes_started_total").increment(1);
        info!(node = %name, "Revived node");
        Ok(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn classification_is_total() {
        let running = names(&["goki-1", "goki-client"]);
        let all = names(&["goki-1", "goki-2", "goki-client"]);
        assert_eq!(classify("goki-1", &running, &all), Liveness::Running);
        assert_eq!(classify("goki-2", &running, &all), Liveness::Stopped);
        assert_eq!(classify("goki-3", &running, &all), Liveness::Absent);
    }

    #[test]
    fn running_wins_over_all_listing() {
        let running = names(&["goki-1"]);
        assert_eq!(classify("goki-1", &running, &[]), Liveness::Running);
    }
}
