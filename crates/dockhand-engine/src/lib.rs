//! Client for the container runtime daemon's administrative API.
//!
//! The daemon is reached over its local domain socket with hand-rolled
//! HTTP/1.0 framing; there is no client library in between. This crate
//! provides:
//!
//! - [`SocketTransport`]: one connection per call, bounded deadlines,
//!   deterministic response framing.
//! - [`EngineClient`]: typed operations (list, create, start, stop, remove,
//!   update resources, exec, logs, inspect, network attach) over any
//!   [`Transport`].
//! - [`LogLines`]: decoder for the daemon's multiplexed stdout/stderr log
//!   stream.
//!
//! ## Example
//!
//! ```rust,ignore
//! use dockhand_engine::{CreateSpec, EngineClient, RestartPolicy};
//!
//! let client = EngineClient::connect();
//! let spec = CreateSpec::new("desk-image:latest")
//!     .with_memory_bytes(512 * 1024 * 1024)
//!     .with_restart_policy(&RestartPolicy::UnlessStopped);
//! let id = client.create_container("desk1", &spec)?;
//! client.start_container(&id)?;
//! # Ok::<(), dockhand_engine::EngineError>(())
//! ```

pub mod client;
pub mod error;
pub mod logs;
pub mod spec;
pub mod transport;
pub mod types;

// Re-exports
pub use client::EngineClient;
pub use error::{ContainerId, EngineError, EngineResult};
pub use logs::{Frames, LogFrame, LogLines, StreamKind, decode_lines};
pub use spec::{CreateSpec, RestartPolicy};
pub use transport::{
    Body, DEFAULT_SOCKET_PATH, Method, Request, Response, SocketTransport, Timeouts, Transport,
};
pub use types::{ContainerDetail, ContainerState, ContainerSummary, PortSummary};
