//! # dockhand-cli
//!
//! Dockhand command-line interface.
//!
//! Provides commands for:
//! - Instance lifecycle (create, start, stop, restart, rm)
//! - Resource limits (update, resources)
//! - Diagnostics (ps, logs, stats, ping)
//!
//! The CLI talks straight to the container daemon's domain socket through
//! [`dockhand_fleet::FleetManager`]; there is no intermediate service.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod cli;
pub mod commands;
pub mod error;
pub mod output;

pub use cli::{Cli, Commands, CreateArgs, Format};
pub use error::CliError;
pub use output::OutputFormat;
