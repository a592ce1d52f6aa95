//! Cluster teardown.
//!
//! Phases run in a fixed order: kill running sandboxes, remove all
//! sandboxes, remove the network, then (only when asked) remove volumes.
//! Volumes are kept by default so a later `create` can reuse the data.

use crate::config::ClusterConfig;
use crate::error::Result;
use crate::naming::ResourceKind;
use crate::sandbox::{ListScope, SandboxClient};
use std::fmt;
use tracing::{info, instrument};

/// What one phase acted on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PhaseOutcome {
    /// The phase was not requested.
    Skipped,
    Removed(Vec<String>),
}

impl PhaseOutcome {
    pub fn is_nothing(&self) -> bool {
        matches!(self, Self::Removed(names) if names.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TeardownReport {
    pub killed: Vec<String>,
    pub sandboxes: PhaseOutcome,
    pub networks: PhaseOutcome,
    pub volumes: PhaseOutcome,
}

impl TeardownReport {
    /// True when no phase found anything to act on.
    pub fn is_empty(&self) -> bool {
        self.killed.is_empty()
            && self.sandboxes.is_nothing()
            && self.networks.is_nothing()
            && !matches!(&self.volumes, PhaseOutcome::Removed(v) if !v.is_empty())
    }
}

fn write_names(f: &mut fmt::Formatter<'_>, title: &str, names: &[String]) -> fmt::Result {
    writeln!(f, "  {}:", title)?;
    if names.is_empty() {
        writeln!(f, "    Nothing")?;
    }
    for name in names {
        writeln!(f, "    {}", name)?;
    }
    Ok(())
}

fn write_phase(f: &mut fmt::Formatter<'_>, title: &str, outcome: &PhaseOutcome) -> fmt::Result {
    match outcome {
        PhaseOutcome::Skipped => Ok(()),
        PhaseOutcome::Removed(names) => write_names(f, title, names),
    }
}

impl fmt::Display for TeardownReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_names(f, "Killed Containers", &self.killed)?;
        write_phase(f, "Docker Containers", &self.sandboxes)?;
        write_phase(f, "Docker Network", &self.networks)?;
        write_phase(f, "Docker Volumes", &self.volumes)
    }
}

pub struct Teardown<'a> {
    client: &'a dyn SandboxClient,
    label: &'a str,
}

impl<'a> Teardown<'a> {
    pub fn new(client: &'a dyn SandboxClient, config: &'a ClusterConfig) -> Self {
        Self { client, label: &config.resource_label }
    }

    async fn remove_all(&self, kind: ResourceKind) -> Result<Vec<String>> {
        let names = self.client.list(kind, self.label, ListScope::All).await?;
        for name in &names {
            self.client.remove(kind, name).await?;
        }
        info!(%kind, count = names.len(), "Removed labeled resources");
        Ok(names)
    }

    /// Tear the cluster down. Stops at the first failure, leaving whatever
    /// was not yet removed in place.
    #[instrument(skip(self))]
    pub async fn run(&self, delete_volumes: bool) -> Result<TeardownReport> {
        let running = self.client.list(ResourceKind::Sandbox, self.label, ListScope::Running).await?;
        for name in &running {
            self.client.kill(name).await?;
        }
        info!(count = running.len(), "Killed running containers");

        let sandboxes = self.remove_all(ResourceKind::Sandbox).await?;
        let networks = self.remove_all(ResourceKind::Network).await?;
        let volumes = if delete_volumes {
            PhaseOutcome::Removed(self.remove_all(ResourceKind::Volume).await?)
        } else {
            PhaseOutcome::Skipped
        };

        Ok(TeardownReport {
            killed: running,
            sandboxes: PhaseOutcome::Removed(sandboxes),
            networks: PhaseOutcome::Removed(networks),
            volumes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_phases_say_nothing() {
        let report = TeardownReport {
            killed: vec![],
            sandboxes: PhaseOutcome::Removed(vec![]),
            networks: PhaseOutcome::Removed(vec![]),
            volumes: PhaseOutcome::Removed(vec![]),
        };
        assert!(report.is_empty());
        let text = report.to_string();
        assert!(text.starts_with("  Killed Containers:\n    Nothing\n"));
        assert_eq!(text.matches("Nothing").count(), 4);
    }

    #[test]
    fn skipped_volumes_are_not_listed() {
        let report = TeardownReport {
            killed: vec!["goki-1".to_string()],
            sandboxes: PhaseOutcome::Removed(vec!["goki-1".to_string()]),
            networks: PhaseOutcome::Removed(vec!["goki-net".to_string()]),
            volumes: PhaseOutcome::Skipped,
        };
        let text = report.to_string();
        assert!(text.contains("  Killed Containers:\n    goki-1\n"));
        assert!(text.contains("    goki-net"));
        assert!(!text.contains("Docker Volumes"));
        assert!(!report.is_empty());
    }
}
