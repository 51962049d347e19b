//! Typed views of the daemon's list and inspect payloads.
//!
//! The daemon owns all container state; these types are re-derived from
//! every query and never cached.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ContainerId;

/// Lifecycle state of a container as the manager models it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContainerState {
    /// Created but never started.
    Created,
    /// Currently running.
    Running,
    /// Stopped (exited or dead).
    Stopped,
    /// Being removed by the daemon.
    Removing,
    /// State string the daemon emitted was not recognized.
    Unknown,
}

impl ContainerState {
    /// Map a daemon state string onto the manager's model.
    #[must_use]
    pub fn from_daemon(state: &str) -> Self {
        match state {
            "created" => Self::Created,
            "running" | "restarting" => Self::Running,
            "exited" | "dead" | "paused" => Self::Stopped,
            "removing" => Self::Removing,
            _ => Self::Unknown,
        }
    }

    /// Lowercase display name.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Running => "running",
            Self::Stopped => "stopped",
            Self::Removing => "removing",
            Self::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ContainerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Published port entry from the list payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortSummary {
    /// Port inside the container.
    #[serde(rename = "PrivatePort")]
    pub private_port: u16,

    /// Port on the host, absent when not published.
    #[serde(rename = "PublicPort", default)]
    pub public_port: Option<u16>,

    /// Protocol (`tcp` or `udp`).
    #[serde(rename = "Type", default)]
    pub protocol: String,
}

/// One entry of the `containers/json` list payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContainerSummary {
    /// Daemon-assigned identifier.
    #[serde(rename = "Id")]
    pub id: String,

    /// All names the daemon knows for the container, each with a leading
    /// slash (`/desk1` or `/linked/desk1`).
    #[serde(rename = "Names", default)]
    pub names: Vec<String>,

    /// Image reference.
    #[serde(rename = "Image", default)]
    pub image: String,

    /// Raw daemon state string (`running`, `exited`, ...).
    #[serde(rename = "State", default)]
    pub state: String,

    /// Human status line (`Up 2 hours`, `Exited (0) ...`).
    #[serde(rename = "Status", default)]
    pub status: String,

    /// Published ports.
    #[serde(rename = "Ports", default)]
    pub ports: Vec<PortSummary>,
}

impl ContainerSummary {
    /// Primary name with link prefixes stripped: the last path segment of
    /// the first daemon name.
    #[must_use]
    pub fn name(&self) -> &str {
        self.names
            .first()
            .map(|n| {
                let trimmed = n.trim_start_matches('/');
                trimmed.rsplit('/').next().unwrap_or(trimmed)
            })
            .unwrap_or_default()
    }

    /// Lifecycle state in the manager's model.
    #[must_use]
    pub fn container_state(&self) -> ContainerState {
        ContainerState::from_daemon(&self.state)
    }

    /// Typed container ID.
    #[must_use]
    pub fn container_id(&self) -> ContainerId {
        ContainerId::new_unchecked(self.id.clone())
    }
}

/// `State` block of the inspect payload.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailState {
    /// Raw daemon status string.
    #[serde(rename = "Status", default)]
    pub status: String,
}

/// `Config` block of the inspect payload (subset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailConfig {
    /// Image reference.
    #[serde(rename = "Image", default)]
    pub image: String,
}

/// `HostConfig` block of the inspect payload (resource limits).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailHostConfig {
    /// Memory limit in bytes (0 = unlimited).
    #[serde(rename = "Memory", default)]
    pub memory: u64,

    /// CPU limit in nanocpus (0 = unlimited).
    #[serde(rename = "NanoCpus", default)]
    pub nano_cpus: u64,
}

/// Host binding entry in the inspect network settings.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailPortBinding {
    /// Host port as a decimal string.
    #[serde(rename = "HostPort", default)]
    pub host_port: String,
}

/// `NetworkSettings` block of the inspect payload (subset).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DetailNetworkSettings {
    /// Port map keyed by `<port>/<proto>`; unpublished ports map to null.
    #[serde(rename = "Ports", default)]
    pub ports: BTreeMap<String, Option<Vec<DetailPortBinding>>>,
}

/// Full inspect payload (`containers/{id}/json`), reduced to the fields the
/// lifecycle manager verifies against.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContainerDetail {
    /// Daemon-assigned identifier.
    #[serde(rename = "Id", default)]
    pub id: String,

    /// Container name with leading slash.
    #[serde(rename = "Name", default)]
    pub name: String,

    /// State block.
    #[serde(rename = "State", default)]
    pub state: DetailState,

    /// Config block.
    #[serde(rename = "Config", default)]
    pub config: DetailConfig,

    /// Resource limits.
    #[serde(rename = "HostConfig", default)]
    pub host_config: DetailHostConfig,

    /// Network settings.
    #[serde(rename = "NetworkSettings", default)]
    pub network_settings: DetailNetworkSettings,
}

impl ContainerDetail {
    /// Name without the leading slash.
    #[must_use]
    pub fn name(&self) -> &str {
        self.name.trim_start_matches('/')
    }

    /// Lifecycle state in the manager's model.
    #[must_use]
    pub fn container_state(&self) -> ContainerState {
        ContainerState::from_daemon(&self.state.status)
    }

    /// Published ports as `host:container/proto` strings.
    #[must_use]
    pub fn published_ports(&self) -> Vec<String> {
        let mut published = Vec::new();
        for (spec, bindings) in &self.network_settings.ports {
            let Some(bindings) = bindings else { continue };
            for binding in bindings {
                published.push(format!("{}:{spec}", binding.host_port));
            }
        }
        published
    }
}
