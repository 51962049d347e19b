//! Engine client error types.

use std::fmt;
use std::io;

use thiserror::Error;

/// Errors produced by the socket transport and the engine client.
///
/// Transport failures (the daemon was unreachable or its response could not
/// be framed) are deliberately distinct from daemon failures (the daemon
/// answered with a non-2xx status and an error payload).
#[derive(Debug, Error)]
pub enum EngineError {
    /// Socket-level failure: connect, write or read on the domain socket.
    #[error("transport failure during {op}: {source}")]
    Transport {
        /// Operation that failed (connect, write, read).
        op: &'static str,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The response could not be split into status line, headers and body.
    #[error("malformed daemon response: {0}")]
    MalformedResponse(String),

    /// The daemon answered with an error status.
    #[error("daemon returned {status}: {message}")]
    Daemon {
        /// HTTP status code reported by the daemon.
        status: u16,
        /// Error message from the daemon body, if any.
        message: String,
    },

    /// Container not found by the daemon (404 on an id-addressed call).
    #[error("container not found: {id}")]
    NotFound {
        /// Container ID or name used in the request.
        id: String,
    },

    /// Image not found when creating a container.
    #[error("image not found: {image}")]
    ImageNotFound {
        /// Image reference.
        image: String,
    },

    /// A container with the requested name already exists (409 on create).
    #[error("container name already in use: {name}")]
    NameConflict {
        /// The conflicting name.
        name: String,
    },

    /// Invalid container name or ID rejected before any daemon call.
    #[error("invalid container name: {0}")]
    InvalidName(String),

    /// The daemon answered 2xx but the body did not have the expected shape.
    #[error("unexpected daemon payload: {0}")]
    UnexpectedBody(String),
}

/// Result type for engine operations.
pub type EngineResult<T> = std::result::Result<T, EngineError>;

/// Container ID wrapper for type safety.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ContainerId(String);

impl ContainerId {
    /// Create a new container ID from a string.
    ///
    /// # Errors
    ///
    /// Returns error if the ID is empty or contains characters the daemon
    /// would never emit or accept.
    pub fn new(id: impl Into<String>) -> EngineResult<Self> {
        let id = id.into();
        if id.is_empty() {
            return Err(EngineError::InvalidName(
                "container ID cannot be empty".to_string(),
            ));
        }
        // Daemon IDs are hex strings; names allow a few more characters.
        if !id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.')
        {
            return Err(EngineError::InvalidName(id));
        }
        Ok(Self(id))
    }

    /// Create a container ID without validation (for daemon-assigned IDs).
    #[must_use]
    pub(crate) fn new_unchecked(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the ID as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Get the short form (first 12 chars) of the container ID.
    #[must_use]
    pub fn short(&self) -> &str {
        if self.0.len() >= 12 {
            &self.0[..12]
        } else {
            &self.0
        }
    }
}

impl fmt::Display for ContainerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.short())
    }
}

impl AsRef<str> for ContainerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<ContainerId> for String {
    fn from(id: ContainerId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_id_valid_hex() {
        let id = ContainerId::new("abc123def456").expect("valid hex ID");
        assert_eq!(id.as_str(), "abc123def456");
        assert_eq!(id.short(), "abc123def456");
    }

    #[test]
    fn test_container_id_long_hex() {
        let id = ContainerId::new("abc123def456789012345678").expect("valid long hex ID");
        assert_eq!(id.short(), "abc123def456");
    }

    #[test]
    fn test_container_id_valid_name() {
        let id = ContainerId::new("desk-1_a.0").expect("valid name");
        assert_eq!(id.as_str(), "desk-1_a.0");
    }

    #[test]
    fn test_container_id_empty() {
        assert!(ContainerId::new("").is_err());
    }

    #[test]
    fn test_container_id_invalid_chars() {
        assert!(ContainerId::new("desk instance!").is_err());
    }

    #[test]
    fn test_container_id_display() {
        let id = ContainerId::new_unchecked("abc123def456789012345678");
        assert_eq!(format!("{id}"), "abc123def456");
    }

    #[test]
    fn test_engine_error_display() {
        let err = EngineError::Daemon {
            status: 500,
            message: "server error".to_string(),
        };
        assert!(err.to_string().contains("500"));

        let err = EngineError::NameConflict {
            name: "desk3".to_string(),
        };
        assert!(err.to_string().contains("desk3"));
    }

    #[test]
    fn test_transport_error_is_distinct_from_daemon_error() {
        let err = EngineError::Transport {
            op: "connect",
            source: io::Error::new(io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(matches!(err, EngineError::Transport { .. }));
        assert!(err.to_string().contains("connect"));
    }
}
