//! CLI error type.

use thiserror::Error;

/// Errors surfaced to the operator.
#[derive(Debug, Error)]
pub enum CliError {
    /// A fleet operation failed.
    #[error(transparent)]
    Fleet(#[from] dockhand_fleet::FleetError),

    /// Writing output failed.
    #[error("output error: {0}")]
    Io(#[from] std::io::Error),

    /// Serializing output failed.
    #[error("format error: {0}")]
    Format(String),

    /// A command argument was malformed.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
