//! Fleet manager configuration.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use dockhand_engine::{DEFAULT_SOCKET_PATH, RestartPolicy, Timeouts};

/// Environment variable overriding the daemon socket path.
pub const ENV_SOCKET: &str = "DOCKHAND_SOCKET";
/// Environment variable overriding the host path bound at the shared mount.
///
/// The daemon resolves bind sources from the host's perspective, so this
/// must be a host path even when the manager itself runs in a container.
pub const ENV_SHARED_PATH: &str = "DOCKHAND_SHARED_PATH";
/// Environment variable overriding the managed-instance prefix.
pub const ENV_PREFIX: &str = "DOCKHAND_PREFIX";
/// Environment variable overriding the instance image.
pub const ENV_IMAGE: &str = "DOCKHAND_IMAGE";
/// Environment variable overriding the overlay network name.
pub const ENV_NETWORK: &str = "DOCKHAND_NETWORK";

/// Configuration for the fleet lifecycle manager.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FleetConfig {
    /// Path of the daemon's domain socket.
    pub socket_path: PathBuf,

    /// Naming prefix that marks a container as managed by this fleet.
    pub prefix: String,

    /// Image every instance runs.
    pub image: String,

    /// Overlay network instances are attached to after start (best-effort).
    pub network: Option<String>,

    /// Named volume holding the shared application binary.
    pub binary_volume: String,

    /// Mount point of the binary volume inside the instance.
    pub binary_mount: String,

    /// Host path of the shared files directory.
    pub shared_path: PathBuf,

    /// Mount point of the shared files directory inside the instance.
    pub shared_mount: String,

    /// DNS resolvers handed to instances. The default of `127.0.0.1`
    /// blackholes external lookups so instances cannot reach out.
    pub dns: Vec<String>,

    /// Default memory limit in bytes for new instances.
    pub default_memory: u64,

    /// Restart policy for new instances.
    pub restart_policy: RestartPolicy,

    /// Command run inside each instance right after start (best-effort),
    /// e.g. a convenience symlink into the binary mount. None skips the
    /// step.
    pub post_create_cmd: Option<Vec<String>>,

    /// Daemon call deadlines.
    pub timeouts: Timeouts,
}

impl Default for FleetConfig {
    fn default() -> Self {
        Self {
            socket_path: PathBuf::from(DEFAULT_SOCKET_PATH),
            prefix: "desk".to_string(),
            image: "dockhand/desk:latest".to_string(),
            network: Some("desk-net".to_string()),
            binary_volume: "desk_opt".to_string(),
            binary_mount: "/opt/desk".to_string(),
            shared_path: PathBuf::from("/srv/dockhand/shared"),
            shared_mount: "/shared".to_string(),
            dns: vec!["127.0.0.1".to_string()],
            default_memory: 512 * 1024 * 1024,
            restart_policy: RestartPolicy::UnlessStopped,
            post_create_cmd: None,
            timeouts: Timeouts::default(),
        }
    }
}

impl FleetConfig {
    /// Defaults with environment overrides applied.
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(socket) = std::env::var(ENV_SOCKET) {
            config.socket_path = PathBuf::from(socket);
        }
        if let Ok(shared) = std::env::var(ENV_SHARED_PATH) {
            config.shared_path = PathBuf::from(shared);
        }
        if let Ok(prefix) = std::env::var(ENV_PREFIX) {
            config.prefix = prefix;
        }
        if let Ok(image) = std::env::var(ENV_IMAGE) {
            config.image = image;
        }
        if let Ok(network) = std::env::var(ENV_NETWORK) {
            config.network = (!network.is_empty()).then_some(network);
        }
        config
    }

    /// Set the managed-instance prefix.
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    /// Set the instance image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Set or clear the overlay network.
    #[must_use]
    pub fn with_network(mut self, network: Option<String>) -> Self {
        self.network = network;
        self
    }

    /// Set the post-create command.
    #[must_use]
    pub fn with_post_create_cmd(mut self, cmd: Vec<String>) -> Self {
        self.post_create_cmd = Some(cmd);
        self
    }
}
