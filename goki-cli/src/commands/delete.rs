//! `goki delete` command

use anyhow::Result;
use colored::Colorize;
use goki_core::{ClusterConfig, SandboxClient, Teardown};

pub async fn delete(config: &ClusterConfig, client: &dyn SandboxClient, volumes: bool) -> Result<()> {
    let report = Teardown::new(client, config).run(volumes).await?;

    println!("{}", "Deleted the following resources.".bold());
    print!("{}", report);

    if !volumes {
        println!();
        println!(
            "{} Docker volumes are kept, so the next `goki create` reuses the DB data. \
             Run `goki delete -v` to delete them too.",
            "HINT:".yellow().bold()
        );
    }
    Ok(())
}
