//! In-memory Docker stand-in shared by the integration tests.
//!
//! Keeps labeled containers, networks and volumes in memory and answers the
//! handful of `cockroach` commands the orchestrator issues. Cluster data
//! lives "on" the first node's volume, so removing containers without
//! removing volumes keeps the cluster initialized.

#![allow(dead_code)]

use async_trait::async_trait;
use goki_core::error::{GokiError, Result};
use goki_core::sandbox::{CreateSpec, ListScope, SandboxClient, SandboxSpec};
use goki_core::{ClusterConfig, ResourceKind};
use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub struct FakeSandbox {
    pub name: String,
    pub running: bool,
    pub spec: SandboxSpec,
}

#[derive(Default)]
struct State {
    label: String,
    sandboxes: Vec<FakeSandbox>,
    networks: Vec<String>,
    volumes: Vec<String>,
    /// Volumes holding an initialized cluster.
    initialized: HashSet<String>,
    calls: Vec<String>,
    execs: Vec<Vec<String>>,
    identity_overrides: HashMap<String, String>,
    ping_failures: u32,
    fail_exec_matching: Option<String>,
}

pub struct FakeDocker {
    state: Mutex<State>,
}

pub fn test_config() -> ClusterConfig {
    ClusterConfig { settle_delay_ms: 0, readiness_interval_ms: 0, ..Default::default() }
}

fn fail(command: &str, output: &str) -> GokiError {
    GokiError::ToolFailed { command: command.to_string(), output: output.to_string() }
}

impl FakeDocker {
    pub fn new() -> Self {
        Self { state: Mutex::new(State { label: "goki".to_string(), ..Default::default() }) }
    }

    fn state(&self) -> std::sync::MutexGuard<'_, State> {
        self.state.lock().unwrap()
    }

    /// Every call, formatted as `operation target`.
    pub fn calls(&self) -> Vec<String> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        let mut state = self.state();
        state.calls.clear();
        state.execs.clear();
    }

    /// Calls that change anything.
    pub fn mutations(&self) -> Vec<String> {
        self.calls()
            .into_iter()
            .filter(|c| {
                ["create", "remove", "start", "kill", "exec"].iter().any(|op| c.starts_with(op))
            })
            .collect()
    }

    pub fn execs(&self) -> Vec<Vec<String>> {
        self.state().execs.clone()
    }

    /// Exec command lines joined with spaces.
    pub fn exec_lines(&self) -> Vec<String> {
        self.execs().iter().map(|argv| argv.join(" ")).collect()
    }

    pub fn sandbox(&self, name: &str) -> Option<FakeSandbox> {
        self.state().sandboxes.iter().find(|s| s.name == name).cloned()
    }

    pub fn sandbox_names(&self) -> Vec<String> {
        self.state().sandboxes.iter().map(|s| s.name.clone()).collect()
    }

    pub fn volumes(&self) -> Vec<String> {
        self.state().volumes.clone()
    }

    pub fn networks(&self) -> Vec<String> {
        self.state().networks.clone()
    }

    /// Add a labeled container that no bring-up created.
    pub fn add_stray_sandbox(&self, name: &str, running: bool) {
        let spec = SandboxSpec {
            name: name.to_string(),
            hostname: name.to_string(),
            network: String::new(),
            image: String::new(),
            ports: vec![],
            mounts: vec![],
            entrypoint: None,
            args: vec![],
        };
        self.state().sandboxes.push(FakeSandbox { name: name.to_string(), running, spec });
    }

    pub fn add_volume(&self, name: &str) {
        self.state().volumes.push(name.to_string());
    }

    /// Answer the identity query for `node_name` with `csv` instead.
    pub fn override_identity(&self, node_name: &str, csv: &str) {
        self.state().identity_overrides.insert(node_name.to_string(), csv.to_string());
    }

    /// Make the next `n` readiness probes fail.
    pub fn fail_pings(&self, n: u32) {
        self.state().ping_failures = n;
    }

    /// Fail every exec whose command line contains `needle`.
    pub fn fail_exec_matching(&self, needle: &str) {
        self.state().fail_exec_matching = Some(needle.to_string());
    }

    fn respond(state: &mut State, name: &str, argv: &[String]) -> Result<String> {
        let line = argv.join(" ");
        if let Some(needle) = &state.fail_exec_matching {
            if line.contains(needle.as_str()) {
                return Err(fail(&line, "simulated failure"));
            }
        }

        let running_node = |state: &State, host: &str| {
            state.sandboxes.iter().any(|s| s.running && s.name == host && s.name != name)
        };
        let host = argv
            .iter()
            .find_map(|a| a.strip_prefix("--host="))
            .map(|h| h.trim_end_matches(":26257").to_string());

        if argv.get(1).map(String::as_str) == Some("init") {
            let host = host.unwrap_or_default();
            let volume = host.replace("goki-", "goki-volume-");
            if state.initialized.contains(&volume) {
                return Err(fail(&line, "ERROR: cluster has already been initialized"));
            }
            state.initialized.insert(volume);
            return Ok("Cluster successfully initialized\n".to_string());
        }

        if line.contains("crdb_internal.gossip_nodes") {
            let id = argv.last().and_then(|s| s.rsplit(' ').next()).unwrap_or("0").to_string();
            let node_name = format!("goki-{}", id);
            if let Some(csv) = state.identity_overrides.get(&node_name) {
                return Ok(csv.clone());
            }
            if running_node(state, &node_name) {
                return Ok(format!("node_id,address\n{},{}:26257\n", id, node_name));
            }
            return Ok("node_id,address\n".to_string());
        }

        if argv.iter().any(|a| a == "SELECT 1") {
            if state.ping_failures > 0 {
                state.ping_failures -= 1;
                return Err(fail(&line, "ERROR: server is not accepting clients"));
            }
            return Ok("  ?column?\n------------\n         1\n".to_string());
        }

        if line.contains("node status") {
            let mut out = String::from("  id |    address\n");
            for s in state.sandboxes.iter().filter(|s| s.running && s.spec.entrypoint.is_none()) {
                out.push_str(&format!("  {} | {}:26257\n", s.name.trim_start_matches("goki-"), s.name));
            }
            return Ok(out);
        }

        if line.contains("intro.mytable") {
            return Ok("  Hello, CockroachDB!\n  ----------------\n".to_string());
        }

        Ok(String::new())
    }
}

#[async_trait]
impl SandboxClient for FakeDocker {
    async fn version(&self) -> Result<String> {
        self.state().calls.push("version".to_string());
        Ok("Docker version 24.0.0 (fake)".to_string())
    }

    async fn list(&self, kind: ResourceKind, label: &str, scope: ListScope) -> Result<Vec<String>> {
        let mut state = self.state();
        state.calls.push(format!("list {:?} {:?}", kind, scope));
        if label != state.label {
            return Ok(vec![]);
        }
        Ok(match kind {
            ResourceKind::Sandbox => state
                .sandboxes
                .iter()
                .filter(|s| scope == ListScope::All || s.running)
                .map(|s| s.name.clone())
                .collect(),
            ResourceKind::Network => state.networks.clone(),
            ResourceKind::Volume => state.volumes.clone(),
        })
    }

    async fn create(&self, spec: &CreateSpec, label: &str) -> Result<String> {
        let mut state = self.state();
        state.calls.push(format!("create {} {}", spec.kind(), spec.name()));
        assert_eq!(label, state.label, "every resource must carry the cluster label");
        let name = spec.name().to_string();
        match spec {
            CreateSpec::Network(_) => {
                if state.networks.contains(&name) {
                    return Err(fail("network create", "network already exists"));
                }
                state.networks.push(name.clone());
            }
            CreateSpec::Volume(_) => {
                // `docker volume create` is idempotent for an existing name.
                if !state.volumes.contains(&name) {
                    state.volumes.push(name.clone());
                }
            }
            CreateSpec::Sandbox(sandbox) => {
                if state.sandboxes.iter().any(|s| s.name == name) {
                    return Err(fail("run", "Conflict. The container name is already in use"));
                }
                if !state.networks.contains(&sandbox.network) {
                    return Err(fail("run", "network not found"));
                }
                state.sandboxes.push(FakeSandbox {
                    name: name.clone(),
                    running: true,
                    spec: sandbox.clone(),
                });
            }
        }
        Ok(name)
    }

    async fn remove(&self, kind: ResourceKind, name: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("remove {} {}", kind, name));
        match kind {
            ResourceKind::Sandbox => {
                let idx = state
                    .sandboxes
                    .iter()
                    .position(|s| s.name == name)
                    .ok_or_else(|| fail("rm", "No such container"))?;
                if state.sandboxes[idx].running {
                    return Err(fail("rm", "You cannot remove a running container"));
                }
                state.sandboxes.remove(idx);
            }
            ResourceKind::Network => state.networks.retain(|n| n != name),
            ResourceKind::Volume => {
                state.volumes.retain(|v| v != name);
                state.initialized.remove(name);
            }
        }
        Ok(())
    }

    async fn start(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("start {}", name));
        let sandbox = state
            .sandboxes
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| fail("start", "No such container"))?;
        sandbox.running = true;
        Ok(())
    }

    async fn kill(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("kill {}", name));
        let sandbox = state
            .sandboxes
            .iter_mut()
            .find(|s| s.name == name)
            .ok_or_else(|| fail("kill", "No such container"))?;
        if !sandbox.running {
            return Err(fail("kill", "is not running"));
        }
        sandbox.running = false;
        Ok(())
    }

    async fn exec(&self, name: &str, argv: &[String]) -> Result<String> {
        let mut state = self.state();
        state.calls.push(format!("exec {}", name));
        state.execs.push(argv.to_vec());
        if !state.sandboxes.iter().any(|s| s.name == name && s.running) {
            return Err(fail("exec", "container is not running"));
        }
        Self::respond(&mut state, name, argv)
    }

    async fn run_interactive(&self, name: &str, argv: &[String]) -> Result<()> {
        let mut state = self.state();
        state.calls.push(format!("run {}", name));
        state.execs.push(argv.to_vec());
        Ok(())
    }
}
