//! Command-line argument parsing with clap.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

/// Dockhand - desktop instance fleet management.
#[derive(Parser, Debug, Clone)]
#[command(name = "dockhand")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Daemon socket path (overrides DOCKHAND_SOCKET).
    #[arg(short, long)]
    pub socket: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t = Format::Table)]
    pub format: Format,

    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum Format {
    /// Human-readable table format.
    #[default]
    Table,
    /// JSON output for scripting.
    Json,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List managed instances.
    Ps,

    /// Create and start a new instance.
    Create(CreateArgs),

    /// Start a stopped instance.
    Start {
        /// Instance name.
        name: String,
    },

    /// Stop a running instance.
    Stop {
        /// Instance name.
        name: String,
    },

    /// Restart an instance.
    Restart {
        /// Instance name.
        name: String,
    },

    /// Delete an instance (force-removes a running one).
    Rm {
        /// Instance name.
        name: String,
    },

    /// Update an instance's resource limits.
    Update {
        /// Instance name.
        name: String,

        /// Memory limit (e.g. 512M, 1G, 1.5G).
        #[arg(short, long)]
        memory: String,

        /// CPU limit in cores (e.g. 1, 0.5, 1.5).
        #[arg(short, long)]
        cpus: String,
    },

    /// Show an instance's current resource limits.
    Resources {
        /// Instance name.
        name: String,
    },

    /// Show the tail of an instance's logs.
    Logs {
        /// Instance name.
        name: String,

        /// Number of lines from the end.
        #[arg(short, long, default_value_t = 100)]
        tail: usize,
    },

    /// Show fleet-wide statistics.
    Stats,

    /// Check that the daemon is reachable.
    Ping,
}

/// Arguments for the create command.
#[derive(Parser, Debug, Clone)]
pub struct CreateArgs {
    /// Environment variables (KEY=VALUE).
    #[arg(short, long, value_name = "KEY=VALUE")]
    pub env: Vec<String>,

    /// Port mappings (CONTAINER:HOST).
    #[arg(short, long, value_name = "CONTAINER:HOST")]
    pub port: Vec<String>,
}
