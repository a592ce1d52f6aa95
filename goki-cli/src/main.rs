use anyhow::Result;
use clap::{Parser, Subcommand};
use colored::Colorize;
use goki_core::{ClusterConfig, DockerClient, GokiError};
use std::process::ExitCode;

mod commands;

#[derive(Parser)]
#[command(name = "goki", version)]
#[command(about = "Goki creates or deletes CockroachDB Local Cluster utilizes Docker")]
#[command(long_about = "Goki is a CLI tool to create or delete CockroachDB Local Cluster utilizes Docker.
Goki deploys the swarm of cockroaches on your local environment.

Note: For test at your local or development environment. Not for production.")]
struct Cli {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the CockroachDB Local Cluster
    Create {
        /// The number of cockroaches (1 to 9)
        #[arg(short = 'n', long, default_value_t = 3, allow_negative_numbers = true)]
        node: i64,

        /// Version of CockroachDB (tag of container image)
        #[arg(long)]
        crdb_version: Option<String>,

        /// Set --locality flag (region and zone value) to all nodes
        #[arg(short = 'l', long)]
        set_locality: bool,
    },

    /// Delete the CockroachDB Local Cluster
    Delete {
        /// Delete docker volumes (DB data) too
        #[arg(short, long)]
        volume: bool,
    },

    /// Kill a specified container
    #[command(visible_alias = "kill")]
    Jet {
        /// The node ID of the container to kill
        #[arg(short, long, default_value_t = 1)]
        goki: i64,
    },

    /// Revive a specified container
    #[command(visible_alias = "start")]
    Revive {
        /// The node ID of the container to revive
        #[arg(short, long, default_value_t = 1)]
        goki: i64,
    },

    /// Access the CockroachDB Local Cluster by built-in SQL shell
    Sql {
        /// The node ID of the container to access
        #[arg(short, long, default_value_t = 1)]
        goki: i64,

        /// Access as the default non-root user
        #[arg(long)]
        non_root: bool,

        /// The user name to access DB
        #[arg(short, long)]
        user: Option<String>,

        /// The password to access DB
        #[arg(short, long, requires = "user")]
        password: Option<String>,
    },

    /// Show container status
    Status,
}

async fn run(cli: Cli) -> Result<()> {
    let config = ClusterConfig::load()?;
    tracing::debug!(?config, "Loaded configuration");
    let client = DockerClient::new(&config.docker_binary);

    match cli.command {
        Commands::Create { node, crdb_version, set_locality } => {
            commands::create(&config, &client, node, crdb_version, set_locality).await?;
        }

        Commands::Delete { volume } => {
            commands::delete(&config, &client, volume).await?;
        }

        Commands::Jet { goki } => {
            commands::node::kill(&config, &client, goki).await?;
        }

        Commands::Revive { goki } => {
            commands::node::revive(&config, &client, goki).await?;
        }

        Commands::Sql { goki, non_root, user, password } => {
            commands::sql(&config, &client, goki, non_root, user, password).await?;
        }

        Commands::Status => {
            commands::status(&config, &client).await?;
        }
    }

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = goki_core::init_observability(&cli.log_level) {
        eprintln!("{} {}", "ERROR:".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{} {:#}", "ERROR:".red().bold(), e);
            if let Some(hint) = e.downcast_ref::<GokiError>().and_then(GokiError::hint) {
                eprintln!("{} {}", "HINT:".yellow().bold(), hint);
            }
            ExitCode::FAILURE
        }
    }
}
