//! Configuration management.
//!
//! A [`ClusterConfig`] is built once at process start and handed by reference
//! to every component. Nothing in the crate reads names, ports or credentials
//! from anywhere else.

use crate::error::{GokiError, Result};
use crate::naming::{NodeId, MAX_NODES};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Environment variable pointing at an alternative config file.
pub const CONFIG_ENV: &str = "GOKI_CONFIG";

/// Default CockroachDB version (tag of the container image).
pub const DEFAULT_CRDB_VERSION: &str = "v22.2.0";

/// Static settings shared by every operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClusterConfig {
    /// Prefix of each resource (goki-net, goki-client, goki-volume-1, ...).
    pub resource_prefix: String,
    /// Label attached to every sandbox, network and volume.
    pub resource_label: String,
    /// Container image of CockroachDB in the Docker Hub.
    pub image: String,
    pub default_version: String,
    pub sql_ip: String,
    pub sql_port: u16,
    pub web_ui_ip: String,
    pub web_ui_port: u16,
    pub root_password: String,
    pub non_root_user: String,
    pub non_root_password: String,
    /// Wait after each node start, in milliseconds.
    pub settle_delay_ms: u64,
    pub readiness_attempts: u32,
    pub readiness_interval_ms: u64,
    /// Sandbox control binary.
    pub docker_binary: String,
}

impl Default for ClusterConfig {
    fn default() -> Self {
        Self {
            resource_prefix: "goki".to_string(),
            resource_label: "goki".to_string(),
            image: "cockroachdb/cockroach".to_string(),
            default_version: DEFAULT_CRDB_VERSION.to_string(),
            sql_ip: "127.0.0.1".to_string(),
            sql_port: 26257,
            web_ui_ip: "127.0.0.1".to_string(),
            web_ui_port: 8081,
            root_password: "gokiroot".to_string(),
            non_root_user: "goki".to_string(),
            non_root_password: "goki".to_string(),
            settle_delay_ms: 1000,
            readiness_attempts: 10,
            readiness_interval_ms: 1000,
            docker_binary: "docker".to_string(),
        }
    }
}

impl ClusterConfig {
    /// `<config dir>/goki/config.json`.
    fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("goki").join("config.json"))
    }

    /// Load configuration from disk, falling back to defaults.
    ///
    /// A file named by `GOKI_CONFIG` must exist; the default location is
    /// optional.
    pub fn load() -> Result<Self> {
        Self::load_with(std::env::var_os(CONFIG_ENV).map(PathBuf::from))
    }

    fn load_with(explicit: Option<PathBuf>) -> Result<Self> {
        if let Some(path) = explicit {
            return Self::load_from(path);
        }
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(path),
            _ => Ok(Self::default()),
        }
    }

    /// Load configuration from an explicit path.
    pub fn load_from(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content =
            std::fs::read_to_string(&path).map_err(|e| GokiError::Io { path: path.clone(), source: e })?;
        let config: Self = serde_json::from_str(&content).map_err(|e| GokiError::InvalidConfig {
            reason: format!("Failed to parse {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        let required = [
            ("resource_prefix", &self.resource_prefix),
            ("resource_label", &self.resource_label),
            ("image", &self.image),
            ("default_version", &self.default_version),
            ("docker_binary", &self.docker_binary),
        ];
        if let Some((field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
            return Err(GokiError::InvalidConfig { reason: format!("{} must not be empty", field) });
        }
        if self.readiness_attempts == 0 {
            return Err(GokiError::InvalidConfig {
                reason: "readiness_attempts must be at least 1".to_string(),
            });
        }
        Ok(())
    }

    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn readiness_interval(&self) -> Duration {
        Duration::from_millis(self.readiness_interval_ms)
    }
}

/// Options of a single `create` invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateOptions {
    /// Number of nodes (1 to 9).
    pub nodes: i64,
    /// Tag of the container image.
    pub version: String,
    /// Attach region/zone locality to every node.
    pub set_locality: bool,
}

impl CreateOptions {
    pub fn new(config: &ClusterConfig) -> Self {
        Self { nodes: 3, version: config.default_version.clone(), set_locality: false }
    }

    /// Node ids 1..=nodes, or a precondition error when out of range.
    pub fn node_ids(&self) -> Result<Vec<NodeId>> {
        if !(1..=i64::from(MAX_NODES)).contains(&self.nodes) {
            return Err(GokiError::InvalidNodeCount { count: self.nodes, max: MAX_NODES });
        }
        (1..=self.nodes).map(NodeId::new).collect()
    }
}
