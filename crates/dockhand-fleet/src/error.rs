//! Fleet manager error types.

use thiserror::Error;

use dockhand_engine::EngineError;

/// Errors produced by the fleet lifecycle manager.
#[derive(Debug, Error)]
pub enum FleetError {
    /// Failure reported by the engine client (transport or daemon).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// No container with the given name in the current daemon list.
    ///
    /// Detected client-side by scanning the list, which is distinct from
    /// the daemon's own 404.
    #[error("no managed container named {name}")]
    NotFound {
        /// The name that was looked up.
        name: String,
    },

    /// Memory string did not end in a recognized unit or did not parse.
    #[error("invalid memory limit {0:?} (expected e.g. \"512M\", \"1G\")")]
    InvalidMemory(String),

    /// CPU value did not parse as a positive number.
    #[error("invalid cpu limit {0:?} (expected a positive number of cores)")]
    InvalidCpus(String),

    /// Name allocation kept colliding after re-derivation.
    #[error("could not allocate a free name under prefix {prefix:?} after {attempts} attempts")]
    NameExhausted {
        /// Managed-instance prefix.
        prefix: String,
        /// Number of allocation attempts made.
        attempts: u32,
    },
}

/// Result type for fleet operations.
pub type FleetResult<T> = std::result::Result<T, FleetError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_engine_error_converts() {
        let engine = EngineError::MalformedResponse("no boundary".to_string());
        let fleet: FleetError = engine.into();
        assert!(matches!(fleet, FleetError::Engine(_)));
    }

    #[test]
    fn test_not_found_display() {
        let err = FleetError::NotFound {
            name: "desk9".to_string(),
        };
        assert!(err.to_string().contains("desk9"));
    }

    #[test]
    fn test_invalid_memory_display() {
        let err = FleetError::InvalidMemory("12Q".to_string());
        assert!(err.to_string().contains("12Q"));
    }
}
