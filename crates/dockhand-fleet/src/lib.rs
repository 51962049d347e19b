//! Fleet lifecycle management on top of the engine client.
//!
//! This crate turns raw daemon operations into instance workflows: sequence
//! naming under a managed prefix, create/start/stop/restart/delete, resource
//! limit updates with human-unit conversion, and fleet-wide statistics. The
//! daemon is the only source of truth; the manager re-derives everything it
//! reports from live queries.
//!
//! # Example
//!
//! ```no_run
//! use dockhand_fleet::{FleetConfig, FleetManager, InstanceRequest};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let manager = FleetManager::connect(FleetConfig::from_env());
//! let report = manager.create_instance(&InstanceRequest::new().with_port(5900, 5901))?;
//! println!("created {} ({})", report.name, report.id.short());
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod manager;
pub mod naming;
pub mod resources;

pub use config::FleetConfig;
pub use error::{FleetError, FleetResult};
pub use manager::{
    CreateReport, FleetManager, FleetStats, Instance, InstanceRequest, ResourceReport, StepOutcome,
};
pub use resources::{format_cpus, format_memory, parse_cpus, parse_memory};
