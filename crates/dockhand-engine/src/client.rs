//! Typed operations over the daemon transport.

use serde_json::{Value, json};
use tracing::{debug, info};

use crate::error::{ContainerId, EngineError, EngineResult};
use crate::spec::CreateSpec;
use crate::transport::{Body, Method, Request, Response, SocketTransport, Timeouts, Transport};
use crate::types::{ContainerDetail, ContainerSummary};

/// Daemon API version every path is prefixed with.
const API_VERSION: &str = "v1.41";

/// Typed client for the daemon API, one method per capability the
/// lifecycle manager needs. Constructed once and passed to every caller;
/// holds no daemon-side state.
#[derive(Debug, Clone)]
pub struct EngineClient<T: Transport = SocketTransport> {
    transport: T,
    timeouts: Timeouts,
}

impl EngineClient {
    /// Client over the default daemon socket.
    #[must_use]
    pub fn connect() -> Self {
        Self::new(SocketTransport::new(), Timeouts::default())
    }

    /// Client over a specific daemon socket path.
    #[must_use]
    pub fn connect_path(path: impl AsRef<std::path::Path>) -> Self {
        Self::new(SocketTransport::with_path(path), Timeouts::default())
    }
}

impl<T: Transport> EngineClient<T> {
    /// Client over an arbitrary transport (fakes in tests).
    #[must_use]
    pub fn new(transport: T, timeouts: Timeouts) -> Self {
        Self {
            transport,
            timeouts,
        }
    }

    /// Replace the timeout policy.
    #[must_use]
    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Check that the daemon is reachable and answering.
    pub fn ping(&self) -> EngineResult<()> {
        let request = Request::new(Method::Get, "/_ping", self.timeouts.quick);
        let response = self.transport.send(&request)?;
        if response.accepted() {
            Ok(())
        } else {
            Err(daemon_error(&response))
        }
    }

    /// List containers, optionally including stopped ones.
    pub fn list_containers(&self, all: bool) -> EngineResult<Vec<ContainerSummary>> {
        let path = if all {
            format!("/{API_VERSION}/containers/json?all=true")
        } else {
            format!("/{API_VERSION}/containers/json")
        };
        let request = Request::new(Method::Get, path, self.timeouts.quick);
        let response = self.transport.send(&request)?;
        if response.status != 200 {
            return Err(daemon_error(&response));
        }
        match response.decode() {
            Body::Json(value) => serde_json::from_value(value)
                .map_err(|e| EngineError::UnexpectedBody(e.to_string())),
            Body::Text(text) => Err(EngineError::UnexpectedBody(text)),
        }
    }

    /// Create a container under the given name.
    ///
    /// The name travels as a query parameter, not a body field. It is
    /// validated client-side first so a malformed name never reaches the
    /// daemon inside a request line.
    pub fn create_container(&self, name: &str, spec: &CreateSpec) -> EngineResult<ContainerId> {
        validate_name(name)?;
        debug!(name, image = %spec.image, "creating container");

        let body =
            serde_json::to_value(spec).map_err(|e| EngineError::UnexpectedBody(e.to_string()))?;
        let request = Request::new(
            Method::Post,
            format!("/{API_VERSION}/containers/create?name={name}"),
            self.timeouts.create,
        )
        .with_body(body);

        let response = self.transport.send(&request)?;
        match response.status {
            200 | 201 => {
                let id = extract_id(&response)?;
                info!(id = %id, name, "container created");
                Ok(id)
            }
            404 => Err(EngineError::ImageNotFound {
                image: spec.image.clone(),
            }),
            409 => Err(EngineError::NameConflict {
                name: name.to_string(),
            }),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Start a created or stopped container.
    pub fn start_container(&self, id: &ContainerId) -> EngineResult<()> {
        debug!(id = %id, "starting container");
        let response = self.control(Method::Post, &format!("containers/{}/start", id.as_str()))?;
        match response.status {
            // 304: already running.
            200 | 204 | 304 => {
                info!(id = %id, "container started");
                Ok(())
            }
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Stop a running container.
    pub fn stop_container(&self, id: &ContainerId) -> EngineResult<()> {
        debug!(id = %id, "stopping container");
        let response = self.control(Method::Post, &format!("containers/{}/stop", id.as_str()))?;
        match response.status {
            // 304: already stopped, not an error.
            200 | 204 | 304 => {
                info!(id = %id, "container stopped");
                Ok(())
            }
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Remove a container, optionally force-removing a running one.
    pub fn remove_container(&self, id: &ContainerId, force: bool) -> EngineResult<()> {
        debug!(id = %id, force, "removing container");
        let path = if force {
            format!("containers/{}?force=true", id.as_str())
        } else {
            format!("containers/{}", id.as_str())
        };
        let response = self.control(Method::Delete, &path)?;
        match response.status {
            200 | 204 => {
                info!(id = %id, "container removed");
                Ok(())
            }
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Update resource limits in place. Does not restart the container.
    pub fn update_resources(
        &self,
        id: &ContainerId,
        memory_bytes: u64,
        nano_cpus: u64,
    ) -> EngineResult<()> {
        debug!(id = %id, memory_bytes, nano_cpus, "updating resources");
        let request = Request::new(
            Method::Post,
            format!("/{API_VERSION}/containers/{}/update", id.as_str()),
            self.timeouts.quick,
        )
        .with_body(json!({
            // MemorySwap tracks Memory so the limit cannot be dodged via swap.
            "Memory": memory_bytes,
            "MemorySwap": memory_bytes,
            "NanoCpus": nano_cpus,
        }));
        let response = self.transport.send(&request)?;
        match response.status {
            200 | 204 => {
                info!(id = %id, "resources updated");
                Ok(())
            }
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Create an exec instance inside a running container.
    pub fn exec_create(&self, id: &ContainerId, cmd: &[String]) -> EngineResult<String> {
        let request = Request::new(
            Method::Post,
            format!("/{API_VERSION}/containers/{}/exec", id.as_str()),
            self.timeouts.quick,
        )
        .with_body(json!({
            "Cmd": cmd,
            "AttachStdout": true,
            "AttachStderr": true,
        }));
        let response = self.transport.send(&request)?;
        match response.status {
            200 | 201 => Ok(extract_id(&response)?.into()),
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Start an exec instance. Fire-and-forget: whatever the daemon streams
    /// back is discarded.
    pub fn exec_start(&self, exec_id: &str) -> EngineResult<()> {
        let request = Request::new(
            Method::Post,
            format!("/{API_VERSION}/exec/{exec_id}/start"),
            self.timeouts.quick,
        )
        .with_body(json!({
            "Detach": false,
            "Tty": false,
        }));
        let response = self.transport.send(&request)?;
        if response.accepted() {
            Ok(())
        } else {
            Err(daemon_error(&response))
        }
    }

    /// Fetch the tail of a container's logs as the raw multiplexed stream.
    ///
    /// Callers feed the bytes through [`crate::logs::LogLines`] to get text.
    pub fn logs(&self, id: &ContainerId, tail: usize) -> EngineResult<Vec<u8>> {
        let request = Request::new(
            Method::Get,
            format!(
                "/{API_VERSION}/containers/{}/logs?stdout=1&stderr=1&tail={tail}",
                id.as_str()
            ),
            self.timeouts.logs,
        );
        let response = self.transport.send(&request)?;
        match response.status {
            200 => Ok(response.into_bytes()),
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Inspect a container, including its actual resource limits and port
    /// bindings.
    pub fn inspect(&self, id: &ContainerId) -> EngineResult<ContainerDetail> {
        let request = Request::new(
            Method::Get,
            format!("/{API_VERSION}/containers/{}/json", id.as_str()),
            self.timeouts.quick,
        );
        let response = self.transport.send(&request)?;
        match response.status {
            200 => match response.decode() {
                Body::Json(value) => serde_json::from_value(value)
                    .map_err(|e| EngineError::UnexpectedBody(e.to_string())),
                Body::Text(text) => Err(EngineError::UnexpectedBody(text)),
            },
            404 => Err(not_found(id)),
            _ => Err(daemon_error(&response)),
        }
    }

    /// Attach a container to a named network.
    pub fn connect_network(&self, network: &str, id: &ContainerId) -> EngineResult<()> {
        debug!(id = %id, network, "connecting container to network");
        let request = Request::new(
            Method::Post,
            format!("/{API_VERSION}/networks/{network}/connect"),
            self.timeouts.quick,
        )
        .with_body(json!({ "Container": id.as_str() }));
        let response = self.transport.send(&request)?;
        if response.accepted() {
            Ok(())
        } else {
            Err(daemon_error(&response))
        }
    }

    /// Issue a bodyless control request with the quick deadline.
    fn control(&self, method: Method, suffix: &str) -> EngineResult<Response> {
        let request = Request::new(
            method,
            format!("/{API_VERSION}/{suffix}"),
            self.timeouts.quick,
        );
        self.transport.send(&request)
    }
}

/// Turn a non-2xx response into a daemon error with its message attached.
fn daemon_error(response: &Response) -> EngineError {
    EngineError::Daemon {
        status: response.status,
        message: response.error_message(),
    }
}

fn not_found(id: &ContainerId) -> EngineError {
    EngineError::NotFound {
        id: id.as_str().to_string(),
    }
}

/// Pull `{"Id": ...}` out of a creation response.
fn extract_id(response: &Response) -> EngineResult<ContainerId> {
    match response.decode() {
        Body::Json(Value::Object(map)) => map
            .get("Id")
            .and_then(Value::as_str)
            .map(ContainerId::new_unchecked)
            .ok_or_else(|| EngineError::UnexpectedBody("missing Id field".to_string())),
        other => Err(EngineError::UnexpectedBody(format!("{other:?}"))),
    }
}

/// Reject names the daemon would refuse (and that would corrupt the
/// request line) before any socket traffic.
fn validate_name(name: &str) -> EngineResult<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(EngineError::InvalidName(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    /// Scripted transport: hands out canned responses and records the
    /// requests it saw.
    struct ScriptedTransport {
        responses: RefCell<Vec<Response>>,
        seen: RefCell<Vec<(Method, String)>>,
    }

    impl ScriptedTransport {
        fn replying(responses: Vec<Response>) -> Self {
            Self {
                responses: RefCell::new(responses),
                seen: RefCell::new(Vec::new()),
            }
        }

        fn last_path(&self) -> String {
            self.seen.borrow().last().map(|(_, p)| p.clone()).unwrap_or_default()
        }
    }

    impl Transport for ScriptedTransport {
        fn send(&self, request: &Request) -> EngineResult<Response> {
            self.seen
                .borrow_mut()
                .push((request.method, request.path.clone()));
            let mut responses = self.responses.borrow_mut();
            if responses.is_empty() {
                return Err(EngineError::Transport {
                    op: "connect",
                    source: std::io::Error::new(
                        std::io::ErrorKind::ConnectionRefused,
                        "script exhausted",
                    ),
                });
            }
            Ok(responses.remove(0))
        }
    }

    fn client(responses: Vec<Response>) -> EngineClient<ScriptedTransport> {
        EngineClient::new(ScriptedTransport::replying(responses), Timeouts::default())
    }

    #[test]
    fn test_list_containers_decodes_summaries() {
        let body = br#"[{"Id":"aaa111","Names":["/desk1"],"State":"running"}]"#.to_vec();
        let client = client(vec![Response::new(200, body)]);
        let list = client.list_containers(true).expect("list");
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].name(), "desk1");
        assert_eq!(
            client.transport.last_path(),
            "/v1.41/containers/json?all=true"
        );
    }

    #[test]
    fn test_list_containers_daemon_error() {
        let client = client(vec![Response::new(
            500,
            br#"{"message":"boom"}"#.to_vec(),
        )]);
        let err = client.list_containers(false).expect_err("must fail");
        assert!(matches!(err, EngineError::Daemon { status: 500, .. }));
    }

    #[test]
    fn test_create_container_returns_id_and_uses_query_name() {
        let client = client(vec![Response::new(201, br#"{"Id":"abc123"}"#.to_vec())]);
        let id = client
            .create_container("desk7", &CreateSpec::new("img"))
            .expect("create");
        assert_eq!(id.as_str(), "abc123");
        assert_eq!(
            client.transport.last_path(),
            "/v1.41/containers/create?name=desk7"
        );
    }

    #[test]
    fn test_create_container_conflict() {
        let client = client(vec![Response::new(
            409,
            br#"{"message":"Conflict. The container name \"/desk7\" is already in use"}"#.to_vec(),
        )]);
        let err = client
            .create_container("desk7", &CreateSpec::new("img"))
            .expect_err("must conflict");
        assert!(matches!(err, EngineError::NameConflict { name } if name == "desk7"));
    }

    #[test]
    fn test_create_container_image_missing() {
        let client = client(vec![Response::new(
            404,
            br#"{"message":"No such image"}"#.to_vec(),
        )]);
        let err = client
            .create_container("desk7", &CreateSpec::new("ghost:latest"))
            .expect_err("must fail");
        assert!(matches!(err, EngineError::ImageNotFound { image } if image == "ghost:latest"));
    }

    #[test]
    fn test_create_container_rejects_bad_name_before_send() {
        let client = client(vec![]);
        let err = client
            .create_container("bad name", &CreateSpec::new("img"))
            .expect_err("must reject");
        assert!(matches!(err, EngineError::InvalidName(_)));
        assert!(client.transport.seen.borrow().is_empty());
    }

    #[test]
    fn test_start_not_found() {
        let client = client(vec![Response::new(404, Vec::new())]);
        let id = ContainerId::new("abc123").expect("id");
        let err = client.start_container(&id).expect_err("must fail");
        assert!(matches!(err, EngineError::NotFound { .. }));
    }

    #[test]
    fn test_stop_already_stopped_is_success() {
        let client = client(vec![Response::new(304, Vec::new())]);
        let id = ContainerId::new("abc123").expect("id");
        client.stop_container(&id).expect("304 is success");
    }

    #[test]
    fn test_remove_forced_path() {
        let client = client(vec![Response::new(204, Vec::new())]);
        let id = ContainerId::new("abc123").expect("id");
        client.remove_container(&id, true).expect("remove");
        assert_eq!(
            client.transport.last_path(),
            "/v1.41/containers/abc123?force=true"
        );
    }

    #[test]
    fn test_update_resources_accepts_204() {
        let client = client(vec![Response::new(204, Vec::new())]);
        let id = ContainerId::new("abc123").expect("id");
        client
            .update_resources(&id, 536_870_912, 1_500_000_000)
            .expect("update");
        assert_eq!(
            client.transport.last_path(),
            "/v1.41/containers/abc123/update"
        );
    }

    #[test]
    fn test_exec_two_step() {
        let client = client(vec![
            Response::new(201, br#"{"Id":"exec42"}"#.to_vec()),
            Response::new(200, Vec::new()),
        ]);
        let id = ContainerId::new("abc123").expect("id");
        let exec_id = client
            .exec_create(&id, &["ln".to_string(), "-s".to_string()])
            .expect("exec create");
        assert_eq!(exec_id, "exec42");
        client.exec_start(&exec_id).expect("exec start");
        assert_eq!(client.transport.last_path(), "/v1.41/exec/exec42/start");
    }

    #[test]
    fn test_logs_returns_raw_bytes() {
        let raw = vec![0x01, 0, 0, 0, 0, 0, 0, 2, b'h', b'i'];
        let client = client(vec![Response::new(200, raw.clone())]);
        let id = ContainerId::new("abc123").expect("id");
        let bytes = client.logs(&id, 50).expect("logs");
        assert_eq!(bytes, raw);
        assert!(client.transport.last_path().ends_with("tail=50"));
    }

    #[test]
    fn test_inspect_decodes_detail() {
        let body = br#"{"Id":"abc123","Name":"/desk1","HostConfig":{"Memory":1024}}"#.to_vec();
        let client = client(vec![Response::new(200, body)]);
        let id = ContainerId::new("abc123").expect("id");
        let detail = client.inspect(&id).expect("inspect");
        assert_eq!(detail.name(), "desk1");
        assert_eq!(detail.host_config.memory, 1024);
    }

    #[test]
    fn test_connect_network_path() {
        let client = client(vec![Response::new(200, Vec::new())]);
        let id = ContainerId::new("abc123").expect("id");
        client.connect_network("desk-net", &id).expect("connect");
        assert_eq!(
            client.transport.last_path(),
            "/v1.41/networks/desk-net/connect"
        );
    }

    #[test]
    fn test_ping() {
        let client = client(vec![Response::new(200, b"OK".to_vec())]);
        client.ping().expect("ping");
        assert_eq!(client.transport.last_path(), "/_ping");
    }
}
