//! Fleet lifecycle orchestration.
//!
//! The manager owns no durable state: every read re-queries the daemon's
//! container list and filters by the managed-instance prefix. Mutations are
//! multi-step workflows over the engine client.

use parking_lot::Mutex;
use serde::Serialize;
use tracing::{info, warn};

use dockhand_engine::{
    ContainerId, ContainerState, ContainerSummary, CreateSpec, EngineClient, EngineError,
    SocketTransport, Transport, decode_lines,
};

use crate::config::FleetConfig;
use crate::error::{FleetError, FleetResult};
use crate::{naming, resources};

/// Allocation attempts before giving up on a conflicting prefix.
const NAME_RETRY_LIMIT: u32 = 3;

/// Outcome of a best-effort step in the create workflow.
///
/// Degraded outcomes are visible to callers instead of being swallowed;
/// only the mandatory create + start steps can fail the workflow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum StepOutcome {
    /// The step ran and succeeded.
    Completed,
    /// The step was not configured.
    Skipped,
    /// The step ran and failed; the failure detail is attached.
    Failed(String),
}

impl StepOutcome {
    /// Whether the step failed.
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }
}

/// Result of a create workflow.
#[derive(Debug, Clone)]
pub struct CreateReport {
    /// Allocated instance name.
    pub name: String,
    /// Daemon-assigned container ID.
    pub id: ContainerId,
    /// Outcome of the overlay network attach.
    pub network_attach: StepOutcome,
    /// Outcome of the post-create command.
    pub post_create: StepOutcome,
}

impl CreateReport {
    /// Whether any best-effort step failed.
    #[must_use]
    pub fn degraded(&self) -> bool {
        self.network_attach.is_failed() || self.post_create.is_failed()
    }
}

/// Caller-supplied parameters for a new instance.
#[derive(Debug, Clone, Default)]
pub struct InstanceRequest {
    /// Environment variables for the instance.
    pub env: Vec<(String, String)>,
    /// Port mappings, `(container, host)` pairs.
    pub ports: Vec<(u16, u16)>,
}

impl InstanceRequest {
    /// Empty request: image defaults only.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Add a port mapping.
    #[must_use]
    pub fn with_port(mut self, container_port: u16, host_port: u16) -> Self {
        self.ports.push((container_port, host_port));
        self
    }
}

/// A managed instance as presented to operators and collaborators.
#[derive(Debug, Clone, Serialize)]
pub struct Instance {
    /// Short container ID.
    pub id: String,
    /// Instance name.
    pub name: String,
    /// Lifecycle state.
    pub state: ContainerState,
    /// Image reference.
    pub image: String,
    /// Published ports, `host:container/proto`.
    pub ports: Vec<String>,
    /// Memory limit in human form.
    pub memory: String,
    /// CPU limit in human form.
    pub cpus: String,
}

/// Resource limits of one instance, canonical and human forms.
#[derive(Debug, Clone, Serialize)]
pub struct ResourceReport {
    /// Instance name.
    pub name: String,
    /// Memory limit in human form.
    pub memory: String,
    /// CPU limit in human form.
    pub cpus: String,
    /// Memory limit in bytes.
    pub memory_bytes: u64,
    /// CPU limit in nanocpus.
    pub nano_cpus: u64,
}

/// Aggregate counts over one list call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FleetStats {
    /// All containers on the daemon.
    pub total: usize,
    /// Containers currently running.
    pub running: usize,
    /// Containers not running.
    pub stopped: usize,
    /// Containers under the managed prefix.
    pub managed: usize,
}

/// Orchestrates instance naming, creation, lifecycle control and resource
/// limits over an [`EngineClient`].
#[derive(Debug)]
pub struct FleetManager<T: Transport = SocketTransport> {
    client: EngineClient<T>,
    config: FleetConfig,
    /// Serializes scan-then-allocate naming; the daemon list is the only
    /// record of used suffixes and the scan is not atomic.
    name_arbiter: Mutex<()>,
}

impl FleetManager {
    /// Manager over the daemon socket named in the config.
    #[must_use]
    pub fn connect(config: FleetConfig) -> Self {
        let client = EngineClient::new(
            SocketTransport::with_path(&config.socket_path),
            config.timeouts,
        );
        Self::with_client(client, config)
    }
}

impl<T: Transport> FleetManager<T> {
    /// Manager over an arbitrary engine client (fakes in tests).
    #[must_use]
    pub fn with_client(client: EngineClient<T>, config: FleetConfig) -> Self {
        Self {
            client,
            config,
            name_arbiter: Mutex::new(()),
        }
    }

    /// The manager's configuration.
    #[must_use]
    pub fn config(&self) -> &FleetConfig {
        &self.config
    }

    /// Check that the daemon is reachable.
    pub fn ping(&self) -> FleetResult<()> {
        Ok(self.client.ping()?)
    }

    /// Create and start a new instance.
    ///
    /// Mandatory steps: allocate a name, create, start. Best-effort steps:
    /// attach to the overlay network and run the post-create command; their
    /// failures are logged, recorded in the report, and do not fail the
    /// workflow.
    pub fn create_instance(&self, request: &InstanceRequest) -> FleetResult<CreateReport> {
        let spec = self.build_spec(request);
        let (name, id) = self.allocate_and_create(&spec)?;
        self.client.start_container(&id)?;

        let network_attach = self.attach_network(&id);
        let post_create = self.run_post_create(&id);

        info!(name, id = %id, degraded = network_attach.is_failed() || post_create.is_failed(),
            "instance created");
        Ok(CreateReport {
            name,
            id,
            network_attach,
            post_create,
        })
    }

    /// Start a stopped instance.
    pub fn start_instance(&self, name: &str) -> FleetResult<()> {
        let summary = self.resolve(name)?;
        self.client.start_container(&summary.container_id())?;
        Ok(())
    }

    /// Stop a running instance.
    pub fn stop_instance(&self, name: &str) -> FleetResult<()> {
        let summary = self.resolve(name)?;
        self.client.stop_container(&summary.container_id())?;
        Ok(())
    }

    /// Restart an instance: stop, then start.
    ///
    /// A failed stop (beyond the daemon's already-stopped case, which is
    /// success) does not abort the start.
    pub fn restart_instance(&self, name: &str) -> FleetResult<()> {
        let summary = self.resolve(name)?;
        let id = summary.container_id();
        if let Err(e) = self.client.stop_container(&id) {
            warn!(name, error = %e, "stop before restart failed; starting anyway");
        }
        self.client.start_container(&id)?;
        Ok(())
    }

    /// Delete an instance: best-effort stop, then force remove.
    pub fn delete_instance(&self, name: &str) -> FleetResult<()> {
        let summary = self.resolve(name)?;
        let id = summary.container_id();
        if let Err(e) = self.client.stop_container(&id) {
            warn!(name, error = %e, "stop before removal failed; removing anyway");
        }
        self.client.remove_container(&id, true)?;
        info!(name, id = %id, "instance deleted");
        Ok(())
    }

    /// Update an instance's resource limits.
    ///
    /// The human strings are validated and converted before any daemon
    /// call; on success the returned canonical values are the source of
    /// truth.
    pub fn update_resources(
        &self,
        name: &str,
        memory: &str,
        cpus: &str,
    ) -> FleetResult<ResourceReport> {
        let memory_bytes = resources::parse_memory(memory)?;
        let nano_cpus = resources::parse_cpus(cpus)?;

        let summary = self.resolve(name)?;
        self.client
            .update_resources(&summary.container_id(), memory_bytes, nano_cpus)?;

        info!(name, memory_bytes, nano_cpus, "resources updated");
        Ok(ResourceReport {
            name: name.to_string(),
            memory: resources::format_memory(memory_bytes),
            cpus: resources::format_cpus(nano_cpus),
            memory_bytes,
            nano_cpus,
        })
    }

    /// Read an instance's current resource limits back from the daemon.
    pub fn instance_resources(&self, name: &str) -> FleetResult<ResourceReport> {
        let summary = self.resolve(name)?;
        let detail = self.client.inspect(&summary.container_id())?;
        Ok(ResourceReport {
            name: name.to_string(),
            memory: resources::format_memory(detail.host_config.memory),
            cpus: resources::format_cpus(detail.host_config.nano_cpus),
            memory_bytes: detail.host_config.memory,
            nano_cpus: detail.host_config.nano_cpus,
        })
    }

    /// Tail an instance's logs as text lines.
    pub fn instance_logs(&self, name: &str, tail: usize) -> FleetResult<Vec<String>> {
        let summary = self.resolve(name)?;
        let raw = self.client.logs(&summary.container_id(), tail)?;
        Ok(decode_lines(&raw))
    }

    /// List managed instances, enriched with their actual resource limits.
    pub fn list_instances(&self) -> FleetResult<Vec<Instance>> {
        let summaries = self.client.list_containers(true)?;
        let mut instances = Vec::new();
        for summary in summaries {
            let name = summary.name().to_string();
            if !name.starts_with(&self.config.prefix) {
                continue;
            }
            let (memory, cpus) = match self.client.inspect(&summary.container_id()) {
                Ok(detail) => (
                    resources::format_memory(detail.host_config.memory),
                    resources::format_cpus(detail.host_config.nano_cpus),
                ),
                Err(e) => {
                    warn!(name, error = %e, "resource lookup failed");
                    ("n/a".to_string(), "n/a".to_string())
                }
            };
            instances.push(Instance {
                id: summary.container_id().short().to_string(),
                name,
                state: summary.container_state(),
                image: summary.image.clone(),
                ports: summary.ports.iter().map(format_port).collect(),
                memory,
                cpus,
            });
        }
        Ok(instances)
    }

    /// Aggregate counts from one list call.
    pub fn fleet_stats(&self) -> FleetResult<FleetStats> {
        let summaries = self.client.list_containers(true)?;
        let total = summaries.len();
        let running = summaries
            .iter()
            .filter(|s| s.container_state() == ContainerState::Running)
            .count();
        let managed = summaries
            .iter()
            .filter(|s| s.name().starts_with(&self.config.prefix))
            .count();
        Ok(FleetStats {
            total,
            running,
            stopped: total - running,
            managed,
        })
    }

    /// Allocate the next free name and create the container under it,
    /// serialized through the in-process arbiter. A daemon-side name
    /// conflict (another issuer won the race) re-derives the name.
    fn allocate_and_create(&self, spec: &CreateSpec) -> FleetResult<(String, ContainerId)> {
        let _guard = self.name_arbiter.lock();
        for attempt in 0..NAME_RETRY_LIMIT {
            let names: Vec<String> = self
                .client
                .list_containers(true)?
                .iter()
                .map(|s| s.name().to_string())
                .collect();
            let name = naming::next_name(&self.config.prefix, &names);
            match self.client.create_container(&name, spec) {
                Ok(id) => return Ok((name, id)),
                Err(EngineError::NameConflict { .. }) => {
                    warn!(name, attempt, "name already taken; re-deriving");
                }
                Err(e) => return Err(e.into()),
            }
        }
        Err(FleetError::NameExhausted {
            prefix: self.config.prefix.clone(),
            attempts: NAME_RETRY_LIMIT,
        })
    }

    /// Assemble the create body from config defaults and the request.
    fn build_spec(&self, request: &InstanceRequest) -> CreateSpec {
        let mut spec = CreateSpec::new(self.config.image.clone())
            .with_bind(
                self.config.binary_volume.clone(),
                self.config.binary_mount.clone(),
            )
            .with_bind(
                self.config.shared_path.display().to_string(),
                self.config.shared_mount.clone(),
            )
            .with_memory_bytes(self.config.default_memory)
            .with_dns(self.config.dns.clone())
            .with_restart_policy(&self.config.restart_policy);
        for (key, value) in &request.env {
            spec = spec.with_env(key.clone(), value.clone());
        }
        for &(container_port, host_port) in &request.ports {
            spec = spec.with_port(container_port, host_port);
        }
        spec
    }

    fn attach_network(&self, id: &ContainerId) -> StepOutcome {
        let Some(network) = &self.config.network else {
            return StepOutcome::Skipped;
        };
        match self.client.connect_network(network, id) {
            Ok(()) => StepOutcome::Completed,
            Err(e) => {
                warn!(id = %id, network, error = %e, "network attach failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    fn run_post_create(&self, id: &ContainerId) -> StepOutcome {
        let Some(cmd) = &self.config.post_create_cmd else {
            return StepOutcome::Skipped;
        };
        let result = self
            .client
            .exec_create(id, cmd)
            .and_then(|exec_id| self.client.exec_start(&exec_id));
        match result {
            Ok(()) => StepOutcome::Completed,
            Err(e) => {
                warn!(id = %id, error = %e, "post-create command failed");
                StepOutcome::Failed(e.to_string())
            }
        }
    }

    /// Resolve an instance name to its summary via list-and-filter.
    fn resolve(&self, name: &str) -> FleetResult<ContainerSummary> {
        self.client
            .list_containers(true)?
            .into_iter()
            .find(|s| s.name() == name)
            .ok_or_else(|| FleetError::NotFound {
                name: name.to_string(),
            })
    }
}

/// Render a port summary as `host:container/proto` (or `container/proto`
/// when unpublished).
fn format_port(port: &dockhand_engine::PortSummary) -> String {
    match port.public_port {
        Some(public) => format!("{public}:{}/{}", port.private_port, port.protocol),
        None => format!("{}/{}", port.private_port, port.protocol),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dockhand_engine::PortSummary;

    #[test]
    fn test_step_outcome_failed() {
        assert!(StepOutcome::Failed("x".to_string()).is_failed());
        assert!(!StepOutcome::Completed.is_failed());
        assert!(!StepOutcome::Skipped.is_failed());
    }

    #[test]
    fn test_create_report_degraded() {
        let report = CreateReport {
            name: "desk1".to_string(),
            id: ContainerId::new("abc123").expect("id"),
            network_attach: StepOutcome::Completed,
            post_create: StepOutcome::Failed("no such file".to_string()),
        };
        assert!(report.degraded());
    }

    #[test]
    fn test_format_port() {
        let published = PortSummary {
            private_port: 5900,
            public_port: Some(5901),
            protocol: "tcp".to_string(),
        };
        assert_eq!(format_port(&published), "5901:5900/tcp");

        let unpublished = PortSummary {
            private_port: 5900,
            public_port: None,
            protocol: "tcp".to_string(),
        };
        assert_eq!(format_port(&unpublished), "5900/tcp");
    }

    #[test]
    fn test_instance_request_builder() {
        let request = InstanceRequest::new()
            .with_env("DISPLAY_GEOMETRY", "1280x800")
            .with_port(5900, 5901);
        assert_eq!(request.env.len(), 1);
        assert_eq!(request.ports, vec![(5900, 5901)]);
    }
}
