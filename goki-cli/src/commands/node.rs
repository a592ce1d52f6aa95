//! `goki jet` and `goki revive` commands

use anyhow::Result;
use colored::Colorize;
use goki_core::{ClusterConfig, LivenessClassifier, NodeId, SandboxClient};

/// Kill one node, leaving its container and data in place.
pub async fn kill(config: &ClusterConfig, client: &dyn SandboxClient, id: i64) -> Result<()> {
    let node = NodeId::new(id)?;
    let name = LivenessClassifier::new(client, config).kill(node).await?;
    println!("{} {}", "Killed".red().bold(), name);
    Ok(())
}

/// Start a previously killed node.
pub async fn revive(config: &ClusterConfig, client: &dyn SandboxClient, id: i64) -> Result<()> {
    let node = NodeId::new(id)?;
    let name = LivenessClassifier::new(client, config).revive(node).await?;
    println!("{} {}", "Revived".green().bold(), name);
    Ok(())
}
