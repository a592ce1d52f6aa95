//! Cluster bring-up.
//!
//! Creation is an explicit state machine. Each call to [`BringUp::step`]
//! performs exactly one transition:
//!
//! ```text
//! NotStarted -> NetworkReady -> VolumesReady -> HelperReady -> CertsReady
//!   -> FirstNodeUp -> Initialized -> UsersReady -> NodesRolledOut
//!                  \-> ReusedData ----------------/
//!   -> ReachabilityConfirmed -> SteadyState
//! ```
//!
//! Whether existing data is reused is decided once, before anything is
//! created, from the presence of any labeled volume. Nodes are started one at
//! a time: the cluster hands out internal ids in join order, and the identity
//! check relies on that.

use crate::admin::{AdminClient, CERTS_DIR};
use crate::certs::CertificateSequencer;
use crate::config::{ClusterConfig, CreateOptions};
use crate::error::{GokiError, Result};
use crate::locality;
use crate::naming::{Naming, NodeId, Resource, ResourceKind, NODE_HTTP_PORT, NODE_SQL_PORT};
use crate::readiness::ReadinessPoller;
use crate::sandbox::{
    CreateSpec, ListScope, Mount, NetworkSpec, PublishedPort, SandboxClient, SandboxSpec,
    VolumeSpec,
};
use std::fmt;
use tracing::{error, info, instrument};

/// Mount point of each node's data volume.
pub const DATA_DIR: &str = "/cockroach/cockroach-data";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BringUpState {
    NotStarted,
    NetworkReady,
    VolumesReady,
    HelperReady,
    CertsReady,
    FirstNodeUp,
    Initialized,
    ReusedData,
    UsersReady,
    NodesRolledOut,
    ReachabilityConfirmed,
    SteadyState,
}

impl fmt::Display for BringUpState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::NotStarted => "not-started",
            Self::NetworkReady => "network-ready",
            Self::VolumesReady => "volumes-ready",
            Self::HelperReady => "helper-ready",
            Self::CertsReady => "certs-ready",
            Self::FirstNodeUp => "first-node-up",
            Self::Initialized => "initialized",
            Self::ReusedData => "reused-data",
            Self::UsersReady => "users-ready",
            Self::NodesRolledOut => "nodes-rolled-out",
            Self::ReachabilityConfirmed => "reachability-confirmed",
            Self::SteadyState => "steady-state",
        };
        f.write_str(name)
    }
}

/// Outcome of a completed bring-up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BringUpReport {
    pub nodes: Vec<NodeId>,
    pub reused_data: bool,
    /// Output of `cockroach node status`.
    pub status_report: String,
    /// Smoke-test query output; fresh clusters only.
    pub demo_output: Option<String>,
    /// Every state entered, in order.
    pub history: Vec<BringUpState>,
}

pub struct BringUp<'a> {
    client: &'a dyn SandboxClient,
    config: &'a ClusterConfig,
    options: CreateOptions,
    naming: Naming,
    nodes: Vec<NodeId>,
    state: BringUpState,
    reuse_data: bool,
    history: Vec<BringUpState>,
    status_report: String,
    demo_output: Option<String>,
}

impl<'a> BringUp<'a> {
    /// Validates the options; nothing is queried or created yet.
    pub fn new(
        client: &'a dyn SandboxClient,
        config: &'a ClusterConfig,
        options: CreateOptions,
    ) -> Result<Self> {
        let nodes = options.node_ids()?;
        Ok(Self {
            client,
            config,
            options,
            naming: Naming::new(&config.resource_prefix),
            nodes,
            state: BringUpState::NotStarted,
            reuse_data: false,
            history: vec![BringUpState::NotStarted],
            status_report: String::new(),
            demo_output: None,
        })
    }

    pub fn state(&self) -> BringUpState {
        self.state
    }

    fn first_node(&self) -> NodeId {
        self.nodes[0]
    }

    fn admin(&self) -> AdminClient<'a> {
        AdminClient::new(self.client, self.config)
    }

    /// Perform one transition and return the new state.
    pub async fn step(&mut self) -> Result<BringUpState> {
        let next = match self.state {
            BringUpState::NotStarted => {
                self.check_preconditions().await?;
                self.create_network().await?;
                BringUpState::NetworkReady
            }
            BringUpState::NetworkReady => {
                self.create_volumes().await?;
                BringUpState::VolumesReady
            }
            BringUpState::VolumesReady => {
                self.create_helper().await?;
                BringUpState::HelperReady
            }
            BringUpState::HelperReady => {
                CertificateSequencer::new(self.client, self.config).run(&self.nodes).await?;
                BringUpState::CertsReady
            }
            BringUpState::CertsReady => {
                self.start_node(self.first_node()).await?;
                BringUpState::FirstNodeUp
            }
            BringUpState::FirstNodeUp if self.reuse_data => {
                info!("Skip initializing cluster, because the Cluster is already initialized");
                BringUpState::ReusedData
            }
            BringUpState::FirstNodeUp => {
                info!("Initializing Cluster start");
                self.admin().init_cluster(self.first_node()).await?;
                BringUpState::Initialized
            }
            BringUpState::Initialized => {
                self.bootstrap_users().await?;
                BringUpState::UsersReady
            }
            BringUpState::ReusedData | BringUpState::UsersReady => {
                self.roll_out().await?;
                BringUpState::NodesRolledOut
            }
            BringUpState::NodesRolledOut => {
                ReadinessPoller::from_config(self.config)
                    .await_reachable(&self.admin(), self.first_node())
                    .await?;
                BringUpState::ReachabilityConfirmed
            }
            BringUpState::ReachabilityConfirmed => {
                self.report_status().await?;
                BringUpState::SteadyState
            }
            BringUpState::SteadyState => return Ok(BringUpState::SteadyState),
        };
        info!(from = %self.state, to = %next, "Bring-up transition");
        self.state = next;
        self.history.push(next);
        Ok(next)
    }

    /// Drive the machine to [`BringUpState::SteadyState`].
    #[instrument(skip(self), fields(nodes = self.nodes.len(), version = %self.options.version))]
    pub async fn run(mut self) -> Result<BringUpReport> {
        info!("*** Start Creating CockroachDB Local Cluster ***");
        while self.state != BringUpState::SteadyState {
            let state = self.state;
            if let Err(e) = self.step().await {
                error!(%state, error = %e, "Bring-up failed, resources are left as they are");
                return Err(e);
            }
        }
        Ok(BringUpReport {
            nodes: self.nodes,
            reused_data: self.reuse_data,
            status_report: self.status_report,
            demo_output: self.demo_output,
            history: self.history,
        })
    }

    async fn check_preconditions(&mut self) -> Result<()> {
        self.client.version().await?;

        let label = &self.config.resource_label;
        for kind in [ResourceKind::Sandbox, ResourceKind::Network] {
            let existing = self.client.list(kind, label, ListScope::All).await?;
            if !existing.is_empty() {
                return Err(GokiError::ResourcesExist { kind: kind.to_string(), names: existing });
            }
        }

        let volumes = self.client.list(ResourceKind::Volume, label, ListScope::All).await?;
        self.reuse_data = !volumes.is_empty();
        if self.reuse_data {
            info!(volumes = ?volumes, "Found existing volumes, re-using cluster data");
        }
        Ok(())
    }

    async fn create(&self, spec: CreateSpec) -> Result<String> {
        let handle = self.client.create(&spec, &self.config.resource_label).await?;
        info!(kind = %spec.kind(), name = spec.name(), %handle, "Created");
        Ok(handle)
    }

    async fn create_network(&self) -> Result<()> {
        let name = self.naming.network();
        self.create(CreateSpec::Network(NetworkSpec { bridge_name: name.clone(), name })).await?;
        Ok(())
    }

    async fn create_volumes(&self) -> Result<()> {
        let resources = std::iter::once(Resource::CredentialVolume)
            .chain(self.nodes.iter().map(|id| Resource::NodeVolume(*id)));
        for resource in resources {
            let name = self.naming.name(resource);
            self.create(CreateSpec::Volume(VolumeSpec { name })).await?;
        }
        Ok(())
    }

    fn image(&self) -> String {
        format!("{}:{}", self.config.image, self.options.version)
    }

    fn certs_mount(&self) -> Mount {
        Mount {
            source: self.naming.name(Resource::CredentialVolume),
            target: CERTS_DIR.to_string(),
        }
    }

    async fn create_helper(&self) -> Result<()> {
        let name = self.naming.helper();
        self.create(CreateSpec::Sandbox(SandboxSpec {
            hostname: name.clone(),
            name,
            network: self.naming.network(),
            image: self.image(),
            ports: vec![],
            mounts: vec![self.certs_mount()],
            entrypoint: Some("sleep".to_string()),
            args: vec!["inf".to_string()],
        }))
        .await?;
        Ok(())
    }

    /// Sandbox definition of a database node.
    pub fn node_spec(&self, node: NodeId) -> SandboxSpec {
        let name = self.naming.node(node);
        let ports = if node == self.first_node() {
            vec![
                PublishedPort {
                    host_ip: self.config.sql_ip.clone(),
                    host_port: self.config.sql_port,
                    container_port: NODE_SQL_PORT,
                },
                PublishedPort {
                    host_ip: self.config.web_ui_ip.clone(),
                    host_port: self.config.web_ui_port,
                    container_port: NODE_HTTP_PORT,
                },
            ]
        } else {
            vec![]
        };

        let mut args = vec![
            "start".to_string(),
            format!("--certs-dir=certs/node-certs/{}", name),
            format!("--join={}", self.naming.join_list(&self.nodes)),
        ];
        if let Some(locality) = locality::assign(node, self.options.set_locality) {
            args.push(locality.flag());
        }

        SandboxSpec {
            hostname: name.clone(),
            name,
            network: self.naming.network(),
            image: self.image(),
            ports,
            mounts: vec![
                self.certs_mount(),
                Mount {
                    source: self.naming.name(Resource::NodeVolume(node)),
                    target: DATA_DIR.to_string(),
                },
            ],
            entrypoint: None,
            args,
        }
    }

    /// Start one node and wait for the settle delay.
    async fn start_node(&self, node: NodeId) -> Result<()> {
        self.create(CreateSpec::Sandbox(self.node_spec(node))).await?;
        metrics::counter!("goki_nodes_started_total").increment(1);
        tokio::time::sleep(self.config.settle_delay()).await;
        Ok(())
    }

    async fn bootstrap_users(&self) -> Result<()> {
        let admin = self.admin();
        let first = self.first_node();
        admin.set_root_password(first).await?;
        admin.create_non_root_user(first).await?;
        admin.verify_identity(first, first).await
    }

    async fn roll_out(&self) -> Result<()> {
        info!("Creating Cluster start");
        let admin = self.admin();
        for &node in &self.nodes[1..] {
            self.start_node(node).await?;
            if !self.reuse_data {
                admin.verify_identity(self.first_node(), node).await?;
            }
        }
        info!("Creating Cluster done");
        Ok(())
    }

    async fn report_status(&mut self) -> Result<()> {
        let admin = self.admin();
        let first = self.first_node();
        self.status_report = admin.node_status(first).await?;
        if !self.reuse_data {
            admin.load_demo_dataset(first).await?;
            self.demo_output = Some(admin.demo_value(first).await?);
        }
        Ok(())
    }
}
