//! Docker CLI implementation of [`SandboxClient`].
//!
//! Uses the `docker` binary for everything. The CLI exposes no structured
//! error codes, so a non-zero exit is reported with its combined output.

use super::{CreateSpec, ListScope, SandboxClient, SandboxSpec};
use crate::error::{GokiError, Result};
use crate::naming::ResourceKind;
use async_trait::async_trait;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, instrument, warn};

/// Docker sandbox client.
pub struct DockerClient {
    binary: String,
}

impl DockerClient {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    /// Run the binary and return its combined output, failing on non-zero exit.
    async fn output(&self, operation: &'static str, args: Vec<String>) -> Result<String> {
        let command_line = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %command_line, "Running docker command");
        metrics::counter!("goki_sandbox_commands_total", "operation" => operation).increment(1);

        let output = Command::new(&self.binary).args(&args).output().await.map_err(|e| {
            GokiError::ToolUnavailable { tool: self.binary.clone(), reason: e.to_string() }
        })?;

        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            warn!(command = %command_line, "docker command failed");
            metrics::counter!("goki_sandbox_command_failures_total", "operation" => operation)
                .increment(1);
            return Err(GokiError::ToolFailed { command: command_line, output: combined });
        }

        Ok(combined)
    }
}

fn to_args<const N: usize>(args: [&str; N]) -> Vec<String> {
    args.iter().map(|s| s.to_string()).collect()
}

/// Arguments of `docker ps` / `network ls` / `volume ls` for a labeled listing.
pub(crate) fn list_args(kind: ResourceKind, label: &str, scope: ListScope) -> Vec<String> {
    let filter = format!("label={}", label);
    match kind {
        ResourceKind::Sandbox => {
            let flag = match scope {
                ListScope::Running => "-f",
                ListScope::All => "-af",
            };
            to_args(["ps", flag, &filter, "--format", "{{.Names}}"])
        }
        ResourceKind::Network => to_args(["network", "ls", "-f", &filter, "--format", "{{.Name}}"]),
        ResourceKind::Volume => to_args(["volume", "ls", "-f", &filter, "--format", "{{.Name}}"]),
    }
}

pub(crate) fn create_args(spec: &CreateSpec, label: &str) -> Vec<String> {
    let label_flag = format!("--label={}", label);
    match spec {
        CreateSpec::Network(net) => to_args([
            "network",
            "create",
            "-d",
            "bridge",
            &net.name,
            "-o",
            &format!("com.docker.network.bridge.name={}", net.bridge_name),
            &label_flag,
        ]),
        CreateSpec::Volume(vol) => to_args(["volume", "create", &vol.name, &label_flag]),
        CreateSpec::Sandbox(sandbox) => run_args(sandbox, &label_flag),
    }
}

fn run_args(spec: &SandboxSpec, label_flag: &str) -> Vec<String> {
    let mut args = to_args([
        "run",
        "-d",
        &format!("--name={}", spec.name),
        &format!("--hostname={}", spec.hostname),
        &format!("--network={}", spec.network),
    ]);
    for port in &spec.ports {
        args.push("-p".to_string());
        args.push(format!("{}:{}:{}", port.host_ip, port.host_port, port.container_port));
    }
    for mount in &spec.mounts {
        args.push(format!("--mount=type=volume,src={},dst={}", mount.source, mount.target));
    }
    args.push(label_flag.to_string());
    if let Some(entrypoint) = &spec.entrypoint {
        args.push(format!("--entrypoint={}", entrypoint));
    }
    args.push(spec.image.clone());
    args.extend(spec.args.iter().cloned());
    args
}

fn parse_names(output: &str) -> Vec<String> {
    output.lines().map(str::trim).filter(|l| !l.is_empty()).map(String::from).collect()
}

#[async_trait]
impl SandboxClient for DockerClient {
    async fn version(&self) -> Result<String> {
        self.output("version", to_args(["version"])).await
    }

    #[instrument(skip(self))]
    async fn list(&self, kind: ResourceKind, label: &str, scope: ListScope) -> Result<Vec<String>> {
        let output = self.output("list", list_args(kind, label, scope)).await?;
        Ok(parse_names(&output))
    }

    #[instrument(skip(self, spec), fields(name = %spec.name()))]
    async fn create(&self, spec: &CreateSpec, label: &str) -> Result<String> {
        let output = self.output("create", create_args(spec, label)).await?;
        Ok(output.trim().to_string())
    }

    #[instrument(skip(self))]
    async fn remove(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let args = match kind {
            ResourceKind::Sandbox => to_args(["rm", name]),
            ResourceKind::Network => to_args(["network", "rm", name]),
            ResourceKind::Volume => to_args(["volume", "rm", name]),
        };
        self.output("remove", args).await.map(drop)
    }

    #[instrument(skip(self))]
    async fn start(&self, name: &str) -> Result<()> {
        self.output("start", to_args(["start", name])).await.map(drop)
    }

    #[instrument(skip(self))]
    async fn kill(&self, name: &str) -> Result<()> {
        self.output("kill", to_args(["kill", name])).await.map(drop)
    }

    #[instrument(skip(self, argv))]
    async fn exec(&self, name: &str, argv: &[String]) -> Result<String> {
        let mut args = to_args(["exec", name]);
        args.extend(argv.iter().cloned());
        self.output("exec", args).await
    }

    #[instrument(skip(self, argv))]
    async fn run_interactive(&self, name: &str, argv: &[String]) -> Result<()> {
        let mut args = to_args(["exec", "-it", name]);
        args.extend(argv.iter().cloned());
        let command_line = format!("{} {}", self.binary, args.join(" "));
        debug!(command = %command_line, "Attaching interactive session");
        metrics::counter!("goki_sandbox_commands_total", "operation" => "run").increment(1);

        let status = Command::new(&self.binary)
            .args(&args)
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .await
            .map_err(|e| GokiError::ToolUnavailable {
                tool: self.binary.clone(),
                reason: e.to_string(),
            })?;

        if !status.success() {
            metrics::counter!("goki_sandbox_command_failures_total", "operation" => "run")
                .increment(1);
            return Err(GokiError::ToolFailed { command: command_line, output: status.to_string() });
        }
        Ok(())
    }
}
