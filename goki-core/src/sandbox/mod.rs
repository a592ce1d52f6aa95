//! Sandbox resource client abstraction.
//!
//! Goki drives containers, networks and volumes through the `SandboxClient`
//! trait:
//! - Docker CLI (the only production implementation)
//! - In-memory fakes in tests
//!
//! Every listing is filtered by the resource label and an empty listing is a
//! valid result. Failures carry the tool's combined output.

use crate::error::Result;
use crate::naming::ResourceKind;
use async_trait::async_trait;

pub mod docker;

pub use docker::DockerClient;

/// Which sandboxes a listing returns. Networks and volumes ignore it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListScope {
    /// Currently running sandboxes only.
    Running,
    /// Running or stopped, not yet removed.
    All,
}

/// Named volume mounted into a sandbox.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mount {
    pub source: String,
    pub target: String,
}

/// Port published on the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishedPort {
    pub host_ip: String,
    pub host_port: u16,
    pub container_port: u16,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandboxSpec {
    pub name: String,
    pub hostname: String,
    pub network: String,
    pub image: String,
    pub ports: Vec<PublishedPort>,
    pub mounts: Vec<Mount>,
    /// Overrides the image entrypoint.
    pub entrypoint: Option<String>,
    pub args: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkSpec {
    pub name: String,
    /// Name of the host bridge interface.
    pub bridge_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeSpec {
    pub name: String,
}

/// Anything the client can create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CreateSpec {
    Network(NetworkSpec),
    Volume(VolumeSpec),
    Sandbox(SandboxSpec),
}

impl CreateSpec {
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Network(_) => ResourceKind::Network,
            Self::Volume(_) => ResourceKind::Volume,
            Self::Sandbox(_) => ResourceKind::Sandbox,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Network(spec) => &spec.name,
            Self::Volume(spec) => &spec.name,
            Self::Sandbox(spec) => &spec.name,
        }
    }
}

/// Sandbox control interface.
///
/// Calls block until the underlying tool returns; there is no timeout.
#[async_trait]
pub trait SandboxClient: Send + Sync {
    /// Check that the control tool is usable; returns its version report.
    async fn version(&self) -> Result<String>;

    /// Names of labeled resources of `kind`, in listing order.
    async fn list(&self, kind: ResourceKind, label: &str, scope: ListScope) -> Result<Vec<String>>;

    /// Create a labeled resource; returns the handle the tool printed.
    async fn create(&self, spec: &CreateSpec, label: &str) -> Result<String>;

    async fn remove(&self, kind: ResourceKind, name: &str) -> Result<()>;

    /// Start a stopped sandbox.
    async fn start(&self, name: &str) -> Result<()>;

    /// Kill a running sandbox without a graceful shutdown.
    async fn kill(&self, name: &str) -> Result<()>;

    /// Run `argv` inside a sandbox and capture stdout+stderr.
    async fn exec(&self, name: &str, argv: &[String]) -> Result<String>;

    /// Run `argv` inside a sandbox attached to the caller's terminal.
    async fn run_interactive(&self, name: &str, argv: &[String]) -> Result<()>;
}
