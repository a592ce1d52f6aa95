//! `goki status` command

use anyhow::Result;
use colored::Colorize;
use goki_core::{ClusterConfig, ClusterLiveness, LivenessClassifier, Naming, NodeId, SandboxClient};
use tabled::{settings::Style, Table, Tabled};

#[derive(Tabled)]
struct NodeRow {
    #[tabled(rename = "CONTAINER")]
    name: String,
    #[tabled(rename = "STATE")]
    state: String,
}

fn rows(naming: &Naming, liveness: &ClusterLiveness) -> Vec<NodeRow> {
    let mut nodes: Vec<_> = liveness
        .running
        .iter()
        .map(|id| (*id, "Alive"))
        .chain(liveness.stopped.iter().map(|id| (*id, "Dead")))
        .collect();
    nodes.sort_by_key(|(id, _)| *id);
    nodes
        .into_iter()
        .map(|(id, state)| NodeRow { name: naming.node(id), state: state.to_string() })
        .collect()
}

fn names(naming: &Naming, ids: &[NodeId]) -> String {
    if ids.is_empty() {
        return "Nothing".to_string();
    }
    ids.iter().map(|id| naming.node(*id)).collect::<Vec<_>>().join(", ")
}

/// Show which nodes are alive and which are dead.
pub async fn status(config: &ClusterConfig, client: &dyn SandboxClient) -> Result<()> {
    let liveness = LivenessClassifier::new(client, config).cluster().await?;

    if liveness.labeled == 0 {
        eprintln!("There is no containers of Goki.");
        return Ok(());
    }

    let naming = Naming::new(&config.resource_prefix);
    if liveness.node_count() > 0 {
        let mut table = Table::new(rows(&naming, &liveness));
        table.with(Style::modern());
        println!("{}", table);
    }

    println!("{} {}", "Alive:".green().bold(), names(&naming, &liveness.running));
    println!("{} {}", "Dead:".red().bold(), names(&naming, &liveness.stopped));
    Ok(())
}
