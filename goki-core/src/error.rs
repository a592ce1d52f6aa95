//! Error types for Goki.
//!
//! All errors use `thiserror`. Variants are grouped by how the operator is
//! expected to react: tool failures carry the tool's raw output, precondition
//! errors are raised before anything is mutated, and consistency errors abort
//! the rollout without rollback.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for Goki operations.
pub type Result<T> = std::result::Result<T, GokiError>;

/// Main error type for Goki.
#[derive(Error, Debug)]
pub enum GokiError {
    // Tool invocation errors
    #[error("`{command}` failed: {output}")]
    ToolFailed { command: String, output: String },

    #[error("Failed to run {tool}: {reason}")]
    ToolUnavailable { tool: String, reason: String },

    // Precondition errors
    #[error("Invalid number of nodes {count}: must be between 1 and {max}")]
    InvalidNodeCount { count: i64, max: u8 },

    #[error("Invalid node id {id}: must be between 1 and {max}")]
    InvalidNodeId { id: i64, max: u8 },

    #[error("Maybe the cluster is already running: labeled {kind} exist: {}", .names.join(", "))]
    ResourcesExist { kind: String, names: Vec<String> },

    #[error("{name} is already running")]
    AlreadyRunning { name: String },

    #[error("{name} is not running")]
    NotRunning { name: String },

    #[error("The specified container {name} does not exist")]
    NodeNotFound { name: String },

    // Consistency errors
    #[error(
        "Node number and internal ID do not match: expected id {expected_id} at {expected_address}, \
         got id {actual_id} at {actual_address}"
    )]
    IdentityMismatch {
        expected_id: u8,
        expected_address: String,
        actual_id: i64,
        actual_address: String,
    },

    // Readiness errors
    #[error("CockroachDB was not ready to accept connections after {attempts} attempts: {last}")]
    NotReady {
        attempts: u32,
        #[source]
        last: Box<GokiError>,
    },

    // Configuration errors
    #[error("Invalid configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("I/O error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl GokiError {
    /// True for errors raised before any resource was touched.
    pub fn is_precondition(&self) -> bool {
        matches!(
            self,
            Self::InvalidNodeCount { .. }
                | Self::InvalidNodeId { .. }
                | Self::ResourcesExist { .. }
                | Self::AlreadyRunning { .. }
                | Self::NotRunning { .. }
                | Self::NodeNotFound { .. }
        )
    }

    /// Operator-facing hint printed after the error line.
    pub fn hint(&self) -> Option<String> {
        match self {
            Self::InvalidNodeCount { max, .. } => {
                Some(format!("The max number of cockroaches of Goki is {}.", max))
            }
            Self::ResourcesExist { kind, names } => {
                Some(format!("The following Goki {} exist: {}", kind, names.join(", ")))
            }
            Self::ToolUnavailable { tool, .. } => {
                Some(format!("Goki needs {}. Please install it.", tool))
            }
            Self::NotReady { .. } => Some(
                "There is possibility that some error occurred. Please check the DB or Container log."
                    .to_string(),
            ),
            Self::IdentityMismatch { .. } => Some(
                "Nodes were assigned internal IDs out of order. Run `goki delete -v` and create again."
                    .to_string(),
            ),
            _ => None,
        }
    }
}
