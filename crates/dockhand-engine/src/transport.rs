//! Raw HTTP-over-Unix-socket transport to the container runtime daemon.
//!
//! The daemon speaks plain HTTP over a local domain socket. Each call opens
//! a fresh connection, writes a minimal HTTP/1.0 request, reads until the
//! daemon closes the stream, and splits the bytes into status line, header
//! block and body at the first blank-line boundary. There is no pooling and
//! no keep-alive.

use std::io::{Read, Write};
use std::os::unix::net::UnixStream;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, trace};

use crate::error::{EngineError, EngineResult};

/// Default path of the daemon's administrative socket.
pub const DEFAULT_SOCKET_PATH: &str = "/var/run/docker.sock";

/// HTTP method for a daemon request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET request.
    Get,
    /// POST request.
    Post,
    /// DELETE request.
    Delete,
}

impl Method {
    /// Wire representation of the method.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

/// Read deadlines per operation class.
///
/// A hung daemon must never hang a caller indefinitely, so every request
/// carries a bounded deadline: quick for list/inspect/control calls, slow
/// for container creation, and a generous one for log retrieval.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeouts {
    /// Deadline for simple calls (list, inspect, start, stop, remove).
    pub quick: Duration,
    /// Deadline for container creation.
    pub create: Duration,
    /// Deadline for log retrieval.
    pub logs: Duration,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            quick: Duration::from_secs(5),
            create: Duration::from_secs(30),
            logs: Duration::from_secs(60),
        }
    }
}

/// A single request to the daemon. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct Request {
    /// HTTP method.
    pub method: Method,
    /// Request path including query string (e.g. `/v1.41/containers/json`).
    pub path: String,
    /// Optional JSON body.
    pub body: Option<Value>,
    /// Read deadline for this call.
    pub timeout: Duration,
}

impl Request {
    /// Build a request with no body.
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>, timeout: Duration) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            timeout,
        }
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Decoded response body: the daemon answers with JSON for most endpoints
/// and plain text for a few (ping, some error paths). Call sites
/// pattern-match instead of re-probing the payload.
#[derive(Debug, Clone, PartialEq)]
pub enum Body {
    /// Body parsed as a JSON value.
    Json(Value),
    /// Body kept as text (lossy UTF-8 when the bytes were not valid).
    Text(String),
}

/// A single response from the daemon. Ephemeral; never persisted.
#[derive(Debug, Clone)]
pub struct Response {
    /// HTTP status code from the status line.
    pub status: u16,
    bytes: Vec<u8>,
}

impl Response {
    /// Build a response from a status code and raw body bytes.
    #[must_use]
    pub fn new(status: u16, bytes: Vec<u8>) -> Self {
        Self { status, bytes }
    }

    /// Raw body bytes. Log streams are binary and must not go through the
    /// text decoding path.
    #[must_use]
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the response, returning the raw body bytes.
    #[must_use]
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Decode the body as JSON where possible, text otherwise.
    #[must_use]
    pub fn decode(&self) -> Body {
        match serde_json::from_slice::<Value>(&self.bytes) {
            Ok(value) => Body::Json(value),
            Err(_) => Body::Text(String::from_utf8_lossy(&self.bytes).into_owned()),
        }
    }

    /// Whether the daemon accepted the request (200 or 204, plus 201 for
    /// resource creation).
    #[must_use]
    pub fn accepted(&self) -> bool {
        matches!(self.status, 200 | 201 | 204)
    }

    /// Best-effort error message from a daemon error body.
    #[must_use]
    pub fn error_message(&self) -> String {
        match self.decode() {
            Body::Json(value) => value
                .get("message")
                .and_then(Value::as_str)
                .map_or_else(|| value.to_string(), ToOwned::to_owned),
            Body::Text(text) => text.trim().to_string(),
        }
    }
}

/// Seam between the typed client and the wire. Production code uses
/// [`SocketTransport`]; tests substitute an in-memory fake.
pub trait Transport {
    /// Send one request and read the full response.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Transport`] when the socket cannot be reached
    /// or the stream fails mid-call, and [`EngineError::MalformedResponse`]
    /// when the response cannot be framed.
    fn send(&self, request: &Request) -> EngineResult<Response>;
}

/// One-connection-per-call transport over the daemon's domain socket.
#[derive(Debug, Clone)]
pub struct SocketTransport {
    socket_path: PathBuf,
}

impl SocketTransport {
    /// Create a transport for the default socket path.
    #[must_use]
    pub fn new() -> Self {
        Self::with_path(DEFAULT_SOCKET_PATH)
    }

    /// Create a transport for a specific socket path.
    #[must_use]
    pub fn with_path(path: impl AsRef<Path>) -> Self {
        Self {
            socket_path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the daemon socket this transport connects to.
    #[must_use]
    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }
}

impl Default for SocketTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl Transport for SocketTransport {
    fn send(&self, request: &Request) -> EngineResult<Response> {
        debug!(
            method = request.method.as_str(),
            path = %request.path,
            "daemon request"
        );

        let mut stream =
            UnixStream::connect(&self.socket_path).map_err(|source| EngineError::Transport {
                op: "connect",
                source,
            })?;
        stream
            .set_read_timeout(Some(request.timeout))
            .map_err(|source| EngineError::Transport {
                op: "connect",
                source,
            })?;
        stream
            .set_write_timeout(Some(request.timeout))
            .map_err(|source| EngineError::Transport {
                op: "connect",
                source,
            })?;

        let wire = encode_request(request)?;
        stream
            .write_all(&wire)
            .map_err(|source| EngineError::Transport {
                op: "write",
                source,
            })?;

        // HTTP/1.0 without keep-alive: the daemon closes the stream after
        // the response, so read to EOF is the framing.
        let mut raw = Vec::new();
        stream
            .read_to_end(&mut raw)
            .map_err(|source| EngineError::Transport { op: "read", source })?;

        let response = parse_response(&raw)?;
        trace!(status = response.status, len = response.bytes().len(), "daemon response");
        Ok(response)
    }
}

/// Serialize a request into wire bytes.
fn encode_request(request: &Request) -> EngineResult<Vec<u8>> {
    let mut wire = format!(
        "{} {} HTTP/1.0\r\nHost: localhost\r\n",
        request.method.as_str(),
        request.path
    )
    .into_bytes();

    match &request.body {
        Some(body) => {
            let payload = serde_json::to_vec(body)
                .map_err(|e| EngineError::UnexpectedBody(e.to_string()))?;
            wire.extend_from_slice(
                format!(
                    "Content-Type: application/json\r\nContent-Length: {}\r\n\r\n",
                    payload.len()
                )
                .as_bytes(),
            );
            wire.extend_from_slice(&payload);
        }
        None => wire.extend_from_slice(b"\r\n"),
    }

    Ok(wire)
}

/// Split raw response bytes into status code and body.
///
/// Explicit stages (status line, header block, body) keep malformed-response
/// handling deterministic: a response without the blank-line boundary or
/// without a numeric status code is a [`EngineError::MalformedResponse`],
/// never a partial success.
fn parse_response(raw: &[u8]) -> EngineResult<Response> {
    let boundary = find_blank_line(raw).ok_or_else(|| {
        EngineError::MalformedResponse("missing header/body boundary".to_string())
    })?;

    let head = String::from_utf8_lossy(&raw[..boundary]);
    let status_line = head.lines().next().unwrap_or_default();
    let status = parse_status_line(status_line)?;

    let body = raw[boundary + 4..].to_vec();
    Ok(Response::new(status, body))
}

/// Extract the numeric status code from an HTTP status line.
fn parse_status_line(line: &str) -> EngineResult<u16> {
    let mut parts = line.split_whitespace();
    let _version = parts.next();
    parts
        .next()
        .and_then(|code| code.parse::<u16>().ok())
        .ok_or_else(|| {
            EngineError::MalformedResponse(format!("unparseable status line: {line:?}"))
        })
}

/// Offset of the first `\r\n\r\n` in the buffer.
fn find_blank_line(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|w| w == b"\r\n\r\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test]
    fn test_encode_request_without_body() {
        let request = Request::new(Method::Get, "/v1.41/containers/json", Duration::from_secs(5));
        let wire = encode_request(&request).expect("encode");
        let text = String::from_utf8(wire).expect("ascii request");
        assert!(text.starts_with("GET /v1.41/containers/json HTTP/1.0\r\n"));
        assert!(text.contains("Host: localhost\r\n"));
        assert!(text.ends_with("\r\n\r\n"));
    }

    #[test]
    fn test_encode_request_with_body() {
        let request = Request::new(Method::Post, "/v1.41/containers/create", Duration::from_secs(30))
            .with_body(json!({"Image": "alpine"}));
        let wire = encode_request(&request).expect("encode");
        let text = String::from_utf8(wire).expect("ascii request");
        assert!(text.contains("Content-Type: application/json\r\n"));
        assert!(text.contains("Content-Length: 18\r\n"));
        assert!(text.ends_with("{\"Image\":\"alpine\"}"));
    }

    #[test]
    fn test_parse_response_json_body() {
        let raw = b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\n\r\n{\"Id\":\"abc\"}";
        let response = parse_response(raw).expect("parse");
        assert_eq!(response.status, 200);
        assert_eq!(response.decode(), Body::Json(json!({"Id": "abc"})));
    }

    #[test]
    fn test_parse_response_text_body() {
        let raw = b"HTTP/1.1 500 Internal Server Error\r\n\r\nsomething broke";
        let response = parse_response(raw).expect("parse");
        assert_eq!(response.status, 500);
        assert_eq!(response.decode(), Body::Text("something broke".to_string()));
    }

    #[test]
    fn test_parse_response_empty_body() {
        let raw = b"HTTP/1.1 204 No Content\r\n\r\n";
        let response = parse_response(raw).expect("parse");
        assert_eq!(response.status, 204);
        assert!(response.accepted());
        assert!(response.bytes().is_empty());
    }

    #[test_case(b"HTTP/1.1 200 OK\r\nContent-Type: text/plain\r\n"; "missing boundary")]
    #[test_case(b"HTTP/1.1 abc OK\r\n\r\nbody"; "non numeric status")]
    #[test_case(b"\r\n\r\nbody"; "empty status line")]
    #[test_case(b""; "empty input")]
    fn test_parse_response_malformed(raw: &[u8]) {
        let err = parse_response(raw).expect_err("must fail");
        assert!(matches!(err, EngineError::MalformedResponse(_)));
    }

    #[test]
    fn test_error_message_from_json_body() {
        let response = Response::new(409, br#"{"message":"name already in use"}"#.to_vec());
        assert_eq!(response.error_message(), "name already in use");
    }

    #[test]
    fn test_error_message_from_text_body() {
        let response = Response::new(500, b"plain failure\n".to_vec());
        assert_eq!(response.error_message(), "plain failure");
    }

    #[test]
    fn test_accepted_statuses() {
        assert!(Response::new(200, Vec::new()).accepted());
        assert!(Response::new(201, Vec::new()).accepted());
        assert!(Response::new(204, Vec::new()).accepted());
        assert!(!Response::new(304, Vec::new()).accepted());
        assert!(!Response::new(404, Vec::new()).accepted());
    }

    #[test]
    fn test_timeouts_default() {
        let timeouts = Timeouts::default();
        assert_eq!(timeouts.quick, Duration::from_secs(5));
        assert!(timeouts.create > timeouts.quick);
        assert!(timeouts.logs > timeouts.create);
    }
}
