//! Goki Core Library
//!
//! Lifecycle orchestration for a local CockroachDB cluster running in Docker:
//! bring-up, teardown, and killing/reviving individual nodes.

pub mod admin;
pub mod bringup;
pub mod certs;
pub mod config;
pub mod error;
pub mod liveness;
pub mod locality;
pub mod naming;
pub mod observability;
pub mod readiness;
pub mod sandbox;
pub mod teardown;

// Re-export commonly used items
pub use admin::{AdminClient, ShellAuth};
pub use bringup::{BringUp, BringUpReport, BringUpState};
pub use config::{ClusterConfig, CreateOptions};
pub use error::{GokiError, Result};
pub use liveness::{ClusterLiveness, Liveness, LivenessClassifier};
pub use locality::Locality;
pub use naming::{Naming, NodeId, Resource, ResourceKind, MAX_NODES};
pub use observability::init as init_observability;
pub use readiness::ReadinessPoller;
pub use sandbox::{DockerClient, ListScope, SandboxClient};
pub use teardown::{PhaseOutcome, Teardown, TeardownReport};
