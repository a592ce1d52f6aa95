//! `goki create` command

use anyhow::Result;
use colored::Colorize;
use goki_core::{BringUp, ClusterConfig, CreateOptions, SandboxClient};

/// Create the cluster and print how to reach it.
pub async fn create(
    config: &ClusterConfig,
    client: &dyn SandboxClient,
    nodes: i64,
    version: Option<String>,
    set_locality: bool,
) -> Result<()> {
    let options = CreateOptions {
        nodes,
        version: version.unwrap_or_else(|| config.default_version.clone()),
        set_locality,
    };

    let report = BringUp::new(client, config, options)?.run().await?;

    println!("{}", "CockroachDB Local Cluster is ready.".green().bold());
    if report.reused_data {
        println!("Existing cluster data was reused.");
    }
    println!();
    println!("{}", "Cluster Status".bold());
    println!("{}", report.status_report.trim_end());

    if let Some(demo) = &report.demo_output {
        println!();
        println!("{}", "Sample Query (SELECT v FROM intro.mytable)".bold());
        println!("{}", demo.trim_end());
    }

    println!();
    print!("{}", access_instructions(config));
    Ok(())
}

fn access_instructions(config: &ClusterConfig) -> String {
    format!(
        "Access:\n  \
         SQL (root):     goki sql\n  \
         SQL ({user}):     goki sql --non-root  (password: {password})\n  \
         SQL (host):     cockroach sql --url 'postgresql://{user}:{password}@{sql_ip}:{sql_port}/defaultdb?sslmode=require'\n  \
         DB Console:     https://{web_ip}:{web_port}  (root / {root_password})\n",
        user = config.non_root_user,
        password = config.non_root_password,
        sql_ip = config.sql_ip,
        sql_port = config.sql_port,
        web_ip = config.web_ui_ip,
        web_port = config.web_ui_port,
        root_password = config.root_password,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn access_instructions_use_configured_endpoints() {
        let config = ClusterConfig { sql_port: 36257, web_ui_port: 9090, ..Default::default() };
        let text = access_instructions(&config);
        assert!(text.contains("127.0.0.1:36257"));
        assert!(text.contains("https://127.0.0.1:9090"));
        assert!(text.contains("goki:goki@"));
    }
}
