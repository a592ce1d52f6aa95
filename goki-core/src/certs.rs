//! Certificate bootstrap.
//!
//! Produces the CA, one certificate per node and the root client certificate
//! on the credential volume. Each step reads files written by the previous
//! one, so the first failure aborts the chain.

use crate::admin::CERTS_DIR;
use crate::config::ClusterConfig;
use crate::error::Result;
use crate::naming::{Naming, NodeId};
use crate::sandbox::SandboxClient;
use std::fmt;
use tracing::{error, info, instrument};

/// Steps of the bootstrap chain, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CertStep {
    CreateDirectories,
    CreateCa,
    CreateNodeCert(NodeId),
    CreateClientCert,
}

impl fmt::Display for CertStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CreateDirectories => write!(f, "create certs directories"),
            Self::CreateCa => write!(f, "create CA"),
            Self::CreateNodeCert(id) => write!(f, "create node {} certs", id),
            Self::CreateClientCert => write!(f, "create client certs"),
        }
    }
}

/// The full chain for `nodes`.
pub fn plan(nodes: &[NodeId]) -> Vec<CertStep> {
    let mut steps = vec![CertStep::CreateDirectories, CertStep::CreateCa];
    steps.extend(nodes.iter().map(|id| CertStep::CreateNodeCert(*id)));
    steps.push(CertStep::CreateClientCert);
    steps
}

fn safe_dir() -> String {
    format!("{}/.setup/my-safe-directory", CERTS_DIR)
}

fn tmp_dir() -> String {
    format!("{}/.setup/cert-tmp", CERTS_DIR)
}

fn argv(args: &[&str]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Directory holding a node's certificates on the credential volume.
pub fn node_certs_dir(naming: &Naming, node: NodeId) -> String {
    format!("{}/node-certs/{}", CERTS_DIR, naming.node(node))
}

/// Commands making up one step.
pub fn step_commands(naming: &Naming, step: CertStep, nodes: &[NodeId]) -> Vec<Vec<String>> {
    let certs_dir = format!("--certs-dir={}", tmp_dir());
    let ca_key = format!("--ca-key={}/ca.key", safe_dir());
    let tmp = tmp_dir();
    match step {
        CertStep::CreateDirectories => {
            let mut commands = vec![argv(&["mkdir", "-p", &format!("{}/", safe_dir())])];
            commands.extend(
                nodes.iter().map(|id| argv(&["mkdir", "-p", &node_certs_dir(naming, *id)])),
            );
            commands
        }
        CertStep::CreateCa => vec![argv(&[
            "./cockroach",
            "cert",
            "create-ca",
            &certs_dir,
            &ca_key,
            "--allow-ca-key-reuse",
            "--overwrite",
        ])],
        CertStep::CreateNodeCert(id) => vec![
            argv(&[
                "./cockroach",
                "cert",
                "create-node",
                &naming.node(id),
                "localhost",
                &certs_dir,
                &ca_key,
                "--overwrite",
            ]),
            argv(&[
                "cp",
                &format!("{}/ca.crt", tmp),
                &format!("{}/node.crt", tmp),
                &format!("{}/node.key", tmp),
                &format!("{}/", node_certs_dir(naming, id)),
            ]),
        ],
        CertStep::CreateClientCert => vec![
            argv(&[
                "./cockroach",
                "cert",
                "create-client",
                "root",
                &certs_dir,
                &ca_key,
                "--overwrite",
            ]),
            argv(&[
                "cp",
                &format!("{}/ca.crt", tmp),
                &format!("{}/client.root.crt", tmp),
                &format!("{}/client.root.key", tmp),
                &format!("{}/", CERTS_DIR),
            ]),
        ],
    }
}

pub struct CertificateSequencer<'a> {
    client: &'a dyn SandboxClient,
    naming: Naming,
}

impl<'a> CertificateSequencer<'a> {
    pub fn new(client: &'a dyn SandboxClient, config: &'a ClusterConfig) -> Self {
        Self { client, naming: Naming::new(&config.resource_prefix) }
    }

    /// Run the whole chain inside the helper sandbox.
    #[instrument(skip(self, nodes), fields(nodes = nodes.len()))]
    pub async fn run(&self, nodes: &[NodeId]) -> Result<()> {
        info!("Creating cert files start");
        let helper = self.naming.helper();
        for step in plan(nodes) {
            for command in step_commands(&self.naming, step, nodes) {
                if let Err(e) = self.client.exec(&helper, &command).await {
                    error!(%step, "Creating cert files failed");
                    return Err(e);
                }
            }
        }
        info!("Creating cert files done");
        Ok(())
    }
}
