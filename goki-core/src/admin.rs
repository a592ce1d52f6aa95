//! CockroachDB administrative interface.
//!
//! Every command runs through the helper sandbox, which mounts the
//! credential volume at [`CERTS_DIR`].

use crate::config::ClusterConfig;
use crate::error::{GokiError, Result};
use crate::naming::{Naming, NodeId};
use crate::sandbox::SandboxClient;
use tracing::{info, instrument, warn};

/// Mount point of the credential volume inside every sandbox.
pub const CERTS_DIR: &str = "/cockroach/certs";

/// Query used to read back a node's cluster-assigned id and address.
pub const IDENTITY_QUERY: &str = "SELECT node_id, address FROM crdb_internal.gossip_nodes WHERE node_id =";

/// Query returning one value of the demonstration dataset.
pub const DEMO_QUERY: &str =
    "SELECT v as \"Hello, CockroachDB!\" FROM intro.mytable WHERE (l % 2) = 0";

/// How an interactive SQL shell authenticates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellAuth {
    /// Root user with the client certificate.
    RootCertificate,
    Password { user: String, password: String },
}

/// One row of the identity query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NodeIdentity {
    pub node_id: i64,
    pub address: String,
}

/// Parse `--format=csv` output of the identity query. The header and any
/// non-numeric line are skipped.
pub fn parse_identity_rows(output: &str) -> Vec<NodeIdentity> {
    output
        .lines()
        .filter_map(|line| {
            let (id, address) = line.trim().split_once(',')?;
            let node_id = id.trim().trim_matches('"').parse().ok()?;
            Some(NodeIdentity { node_id, address: address.trim().trim_matches('"').to_string() })
        })
        .collect()
}

/// Check the rows returned for `expected`. Either a wrong id or a wrong
/// advertised address is a mismatch.
pub fn check_identity(rows: &[NodeIdentity], expected: NodeId, expected_address: &str) -> Result<()> {
    for row in rows {
        if row.node_id != i64::from(expected.get()) || row.address != expected_address {
            return Err(GokiError::IdentityMismatch {
                expected_id: expected.get(),
                expected_address: expected_address.to_string(),
                actual_id: row.node_id,
                actual_address: row.address.clone(),
            });
        }
    }
    Ok(())
}

pub struct AdminClient<'a> {
    client: &'a dyn SandboxClient,
    config: &'a ClusterConfig,
    naming: Naming,
    helper: String,
}

impl<'a> AdminClient<'a> {
    pub fn new(client: &'a dyn SandboxClient, config: &'a ClusterConfig) -> Self {
        let naming = Naming::new(&config.resource_prefix);
        let helper = naming.helper();
        Self { client, config, naming, helper }
    }

    fn cockroach(args: &[&str]) -> Vec<String> {
        std::iter::once("./cockroach").chain(args.iter().copied()).map(String::from).collect()
    }

    fn host_flag(&self, node: NodeId) -> String {
        format!("--host={}", self.naming.node_address(node))
    }

    /// Run one statement against `node` as root.
    pub async fn execute(&self, node: NodeId, statement: &str) -> Result<String> {
        let certs = format!("--certs-dir={}/", CERTS_DIR);
        let argv = Self::cockroach(&["sql", &certs, &self.host_flag(node), "-e", statement]);
        self.client.exec(&self.helper, &argv).await
    }

    async fn query_csv(&self, node: NodeId, statement: &str) -> Result<String> {
        let certs = format!("--certs-dir={}/", CERTS_DIR);
        let argv =
            Self::cockroach(&["sql", &certs, &self.host_flag(node), "--format=csv", "-e", statement]);
        self.client.exec(&self.helper, &argv).await
    }

    /// Trivial query used by the readiness poller.
    pub async fn ping(&self, node: NodeId) -> Result<()> {
        self.execute(node, "SELECT 1").await.map(drop)
    }

    /// `cockroach init` against `node`.
    #[instrument(skip(self))]
    pub async fn init_cluster(&self, node: NodeId) -> Result<()> {
        let argv = Self::cockroach(&["init", "--certs-dir=certs/", &self.host_flag(node)]);
        self.client.exec(&self.helper, &argv).await?;
        info!("Initialized cluster");
        Ok(())
    }

    pub async fn set_root_password(&self, node: NodeId) -> Result<()> {
        let statement = format!("ALTER USER root WITH PASSWORD '{}'", self.config.root_password);
        self.execute(node, &statement).await.map(drop)
    }

    pub async fn create_non_root_user(&self, node: NodeId) -> Result<()> {
        let statement = format!(
            "CREATE USER IF NOT EXISTS {} WITH PASSWORD '{}'",
            self.config.non_root_user, self.config.non_root_password
        );
        self.execute(node, &statement).await.map(drop)
    }

    /// Verify that the cluster gave `expected` the internal id equal to its ordinal.
    #[instrument(skip(self), fields(expected = %expected))]
    pub async fn verify_identity(&self, via: NodeId, expected: NodeId) -> Result<()> {
        let statement = format!("{} {}", IDENTITY_QUERY, expected);
        let output = self.query_csv(via, &statement).await?;
        let rows = parse_identity_rows(&output);
        let expected_address = self.naming.node_address(expected);
        if rows.is_empty() {
            warn!(node = %expected_address, "Node not yet visible in gossip, skipping id check");
        }
        check_identity(&rows, expected, &expected_address)
    }

    /// Human-readable `cockroach node status` report.
    pub async fn node_status(&self, node: NodeId) -> Result<String> {
        let certs = format!("--certs-dir={}/", CERTS_DIR);
        let argv = Self::cockroach(&["node", "status", &certs, &self.host_flag(node)]);
        self.client.exec(&self.helper, &argv).await
    }

    /// Load the built-in `intro` workload.
    pub async fn load_demo_dataset(&self, node: NodeId) -> Result<()> {
        let url = format!(
            "postgresql://root@{}?sslcert=certs%2Fclient.root.crt&sslkey=certs%2Fclient.root.key\
             &sslmode=verify-full&sslrootcert=certs%2Fca.crt",
            self.naming.node_address(node)
        );
        let argv = Self::cockroach(&["workload", "init", "intro", &url]);
        self.client.exec(&self.helper, &argv).await.map(drop)
    }

    pub async fn demo_value(&self, node: NodeId) -> Result<String> {
        self.execute(node, DEMO_QUERY).await
    }

    /// Interactive SQL shell against `node`.
    pub async fn shell(&self, node: NodeId, auth: &ShellAuth) -> Result<()> {
        let argv = match auth {
            ShellAuth::RootCertificate => {
                let certs = format!("--certs-dir={}/", CERTS_DIR);
                Self::cockroach(&["sql", &certs, &self.host_flag(node)])
            }
            ShellAuth::Password { user, password } => {
                let url = format!(
                    "postgresql://{}:{}@{}/defaultdb?sslmode=require",
                    user,
                    password,
                    self.naming.node_address(node)
                );
                Self::cockroach(&["sql", "--url", &url])
            }
        };
        self.client.run_interactive(&self.helper, &argv).await
    }
}
