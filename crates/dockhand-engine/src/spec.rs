//! Container creation specification.
//!
//! [`CreateSpec`] serializes directly into the daemon's
//! `POST /containers/create` body. The container name is not part of the
//! body; the daemon takes it as a query parameter, so the client carries it
//! separately.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Restart policy for a created container.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum RestartPolicy {
    /// Never restart.
    #[default]
    No,

    /// Always restart.
    Always,

    /// Restart on failure with max retry count.
    OnFailure {
        /// Maximum retry count (0 = unlimited).
        max_retries: u32,
    },

    /// Restart unless manually stopped.
    UnlessStopped,
}

impl RestartPolicy {
    /// Create on-failure policy with retry limit.
    #[must_use]
    pub fn on_failure(max_retries: u32) -> Self {
        Self::OnFailure { max_retries }
    }

    /// Daemon name for the policy.
    #[must_use]
    pub fn as_daemon_name(&self) -> &'static str {
        match self {
            Self::No => "no",
            Self::Always => "always",
            Self::OnFailure { .. } => "on-failure",
            Self::UnlessStopped => "unless-stopped",
        }
    }
}

/// Empty JSON object used by the daemon for set-valued fields.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Empty {}

/// One host-side port binding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    /// Host interface to bind (all interfaces by default).
    #[serde(rename = "HostIp")]
    pub host_ip: String,

    /// Host port as a decimal string, per daemon convention.
    #[serde(rename = "HostPort")]
    pub host_port: String,
}

/// Wire form of the restart policy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestartPolicySpec {
    /// Policy name (`no`, `always`, `on-failure`, `unless-stopped`).
    #[serde(rename = "Name")]
    pub name: String,

    /// Retry limit, only meaningful for `on-failure`.
    #[serde(rename = "MaximumRetryCount", skip_serializing_if = "Option::is_none")]
    pub maximum_retry_count: Option<u32>,
}

/// Host-level configuration embedded in the create body.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HostConfigSpec {
    /// Restart policy.
    #[serde(rename = "RestartPolicy", skip_serializing_if = "Option::is_none")]
    pub restart_policy: Option<RestartPolicySpec>,

    /// Port bindings, keyed by `<container-port>/tcp`.
    #[serde(rename = "PortBindings")]
    pub port_bindings: BTreeMap<String, Vec<PortBinding>>,

    /// Memory limit in bytes (0 = unlimited).
    #[serde(rename = "Memory")]
    pub memory: u64,

    /// Swap limit in bytes; kept equal to the memory limit so the container
    /// cannot dodge its limit through swap.
    #[serde(rename = "MemorySwap")]
    pub memory_swap: u64,

    /// CPU limit in nanocpus (10^9 = one full core; 0 = unlimited).
    #[serde(rename = "NanoCpus", skip_serializing_if = "is_zero")]
    pub nano_cpus: u64,

    /// Volume binds, `source:target` form.
    #[serde(rename = "Binds")]
    pub binds: Vec<String>,

    /// DNS resolvers handed to the container.
    #[serde(rename = "Dns", skip_serializing_if = "Vec::is_empty")]
    pub dns: Vec<String>,
}

fn is_zero(value: &u64) -> bool {
    *value == 0
}

/// Full body of a `containers/create` call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateSpec {
    /// Image reference to run.
    #[serde(rename = "Image")]
    pub image: String,

    /// Environment in `KEY=value` form.
    #[serde(rename = "Env")]
    pub env: Vec<String>,

    /// Ports the container exposes, keyed by `<port>/tcp`.
    #[serde(rename = "ExposedPorts")]
    pub exposed_ports: BTreeMap<String, Empty>,

    /// Container paths that receive volumes.
    #[serde(rename = "Volumes")]
    pub volumes: BTreeMap<String, Empty>,

    /// Host-level configuration.
    #[serde(rename = "HostConfig")]
    pub host_config: HostConfigSpec,
}

impl CreateSpec {
    /// Create a spec for an image with everything else empty.
    #[must_use]
    pub fn new(image: impl Into<String>) -> Self {
        Self {
            image: image.into(),
            env: Vec::new(),
            exposed_ports: BTreeMap::new(),
            volumes: BTreeMap::new(),
            host_config: HostConfigSpec::default(),
        }
    }

    /// Add an environment variable.
    #[must_use]
    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.push(format!("{}={}", key.into(), value.into()));
        self
    }

    /// Map a container port to a host port on all interfaces.
    #[must_use]
    pub fn with_port(mut self, container_port: u16, host_port: u16) -> Self {
        let key = format!("{container_port}/tcp");
        self.exposed_ports.insert(key.clone(), Empty {});
        self.host_config.port_bindings.insert(
            key,
            vec![PortBinding {
                host_ip: "0.0.0.0".to_string(),
                host_port: host_port.to_string(),
            }],
        );
        self
    }

    /// Bind a host path or named volume into the container.
    #[must_use]
    pub fn with_bind(mut self, source: impl Into<String>, target: impl Into<String>) -> Self {
        let target = target.into();
        self.volumes.insert(target.clone(), Empty {});
        self.host_config
            .binds
            .push(format!("{}:{target}", source.into()));
        self
    }

    /// Set the memory limit in bytes. Swap is pinned to the same value.
    #[must_use]
    pub fn with_memory_bytes(mut self, bytes: u64) -> Self {
        self.host_config.memory = bytes;
        self.host_config.memory_swap = bytes;
        self
    }

    /// Set the CPU limit in nanocpus.
    #[must_use]
    pub fn with_nano_cpus(mut self, nano_cpus: u64) -> Self {
        self.host_config.nano_cpus = nano_cpus;
        self
    }

    /// Override the container's DNS resolvers.
    #[must_use]
    pub fn with_dns(mut self, resolvers: Vec<String>) -> Self {
        self.host_config.dns = resolvers;
        self
    }

    /// Set the restart policy.
    #[must_use]
    pub fn with_restart_policy(mut self, policy: &RestartPolicy) -> Self {
        let maximum_retry_count = match policy {
            RestartPolicy::OnFailure { max_retries } => Some(*max_retries),
            _ => None,
        };
        self.host_config.restart_policy = Some(RestartPolicySpec {
            name: policy.as_daemon_name().to_string(),
            maximum_retry_count,
        });
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_restart_policy_names() {
        assert_eq!(RestartPolicy::No.as_daemon_name(), "no");
        assert_eq!(RestartPolicy::Always.as_daemon_name(), "always");
        assert_eq!(RestartPolicy::on_failure(3).as_daemon_name(), "on-failure");
        assert_eq!(
            RestartPolicy::UnlessStopped.as_daemon_name(),
            "unless-stopped"
        );
    }

    #[test]
    fn test_create_spec_builder() {
        let spec = CreateSpec::new("desk-image:latest")
            .with_env("DISPLAY_GEOMETRY", "1280x800")
            .with_port(5900, 5901)
            .with_bind("app_opt", "/opt/app")
            .with_memory_bytes(512 * 1024 * 1024)
            .with_nano_cpus(1_500_000_000)
            .with_dns(vec!["127.0.0.1".to_string()])
            .with_restart_policy(&RestartPolicy::UnlessStopped);

        assert_eq!(spec.env, vec!["DISPLAY_GEOMETRY=1280x800".to_string()]);
        assert!(spec.exposed_ports.contains_key("5900/tcp"));
        assert_eq!(spec.host_config.memory, 512 * 1024 * 1024);
        assert_eq!(spec.host_config.memory_swap, spec.host_config.memory);
        assert_eq!(spec.host_config.binds, vec!["app_opt:/opt/app".to_string()]);
    }

    #[test]
    fn test_create_spec_wire_shape() {
        let spec = CreateSpec::new("alpine")
            .with_port(5900, 5900)
            .with_bind("/srv/shared", "/shared")
            .with_memory_bytes(1024)
            .with_dns(vec!["127.0.0.1".to_string()])
            .with_restart_policy(&RestartPolicy::UnlessStopped);

        let value = serde_json::to_value(&spec).expect("serialize");
        assert_eq!(value["Image"], json!("alpine"));
        assert_eq!(value["ExposedPorts"]["5900/tcp"], json!({}));
        assert_eq!(value["Volumes"]["/shared"], json!({}));
        assert_eq!(
            value["HostConfig"]["PortBindings"]["5900/tcp"][0]["HostPort"],
            json!("5900")
        );
        assert_eq!(value["HostConfig"]["Memory"], json!(1024));
        assert_eq!(value["HostConfig"]["MemorySwap"], json!(1024));
        assert_eq!(value["HostConfig"]["Dns"], json!(["127.0.0.1"]));
        assert_eq!(
            value["HostConfig"]["RestartPolicy"]["Name"],
            json!("unless-stopped")
        );
    }

    #[test]
    fn test_create_spec_omits_zero_nano_cpus() {
        let spec = CreateSpec::new("alpine");
        let value = serde_json::to_value(&spec).expect("serialize");
        assert!(value["HostConfig"].get("NanoCpus").is_none());
    }
}
