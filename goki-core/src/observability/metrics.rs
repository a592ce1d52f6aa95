//! Core metrics definitions.
//!
//! Counters follow Prometheus naming (`_total` suffix). Goki installs no
//! exporter; an embedding application may install a recorder.

use metrics::describe_counter;

/// Register all core metrics with descriptions.
pub fn register_core_metrics() {
    describe_counter!(
        "goki_sandbox_commands_total",
        "Total number of sandbox control commands issued (by operation)"
    );
    describe_counter!(
        "goki_sandbox_command_failures_total",
        "Total number of sandbox control commands that exited non-zero (by operation)"
    );
    describe_counter!("goki_nodes_started_total", "Total number of node sandboxes started or revived");
    describe_counter!("goki_nodes_killed_total", "Total number of node sandboxes killed");
    describe_counter!("goki_readiness_attempts_total", "Total number of readiness probe attempts");
}
