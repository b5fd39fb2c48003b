//! HTTP client for the REST surface.

use std::fmt;
use std::time::Duration;

use bridge_config::ClientConfig;
use bridge_kernel::{ErrorBody, ResourceListing, ToolListing};
use bridge_primitives::RESOURCE_SCHEME;
use bridge_telemetry::HealthReport;
use bytes::Bytes;
use hyper::body::to_bytes;
use hyper::header::{ACCEPT, CONTENT_TYPE};
use hyper::{Body, Method, Request, Uri};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::time::timeout;
use tracing::debug;

use crate::error::{ClientError, ClientResult, TransportError};
use crate::http_client::{HyperClient, build_client};

/// Calls tools and reads resources on a remote server.
///
/// Holds one pooled connection set for its lifetime. Every failure is
/// reported as a [`ClientError`] naming the operation. Calls are not retried.
pub struct BridgeClient {
    client: HyperClient,
    base_url: String,
    timeout: Duration,
}

impl fmt::Debug for BridgeClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

impl BridgeClient {
    /// Creates a client for the configured server.
    #[must_use]
    pub fn new(config: &ClientConfig) -> Self {
        Self {
            client: build_client(),
            base_url: config.base_url().to_owned(),
            timeout: config.timeout(),
        }
    }

    /// Returns the server base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Invokes `name` with `params` (a JSON object) and returns its result.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, timeout, non-2xx status
    /// or an undecodable body.
    pub async fn call_tool(&self, name: &str, params: Value) -> ClientResult<Value> {
        let path = format!("/api/tools/{name}/execute");
        let bytes = self.exchange(name, Method::POST, &path, Some(params)).await?;
        decode(name, &bytes)
    }

    /// Reads the resource at `uri` (`data://...` or a bare path).
    ///
    /// Bodies that are not JSON are returned as `{"content": text}`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on transport failure, timeout or non-2xx status.
    pub async fn read_resource(&self, uri: &str) -> ClientResult<Value> {
        let path = uri.strip_prefix(RESOURCE_SCHEME).unwrap_or(uri);
        let bytes = self
            .exchange(uri, Method::GET, &format!("/api/resources/{path}"), None)
            .await?;
        Ok(resource_value(&bytes))
    }

    /// Checks server liveness.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] if the server is unreachable or unhealthy.
    pub async fn health(&self) -> ClientResult<HealthReport> {
        let bytes = self.exchange("health", Method::GET, "/health", None).await?;
        decode("health", &bytes)
    }

    /// Lists the server's tools.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on any failure.
    pub async fn list_tools(&self) -> ClientResult<ToolListing> {
        let bytes = self.exchange("list_tools", Method::GET, "/api/tools", None).await?;
        decode("list_tools", &bytes)
    }

    /// Lists the server's resources.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError`] on any failure.
    pub async fn list_resources(&self) -> ClientResult<ResourceListing> {
        let bytes = self
            .exchange("list_resources", Method::GET, "/api/resources", None)
            .await?;
        decode("list_resources", &bytes)
    }

    /// Calls `add_numbers`.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn add_numbers(&self, a: impl Into<Value>, b: impl Into<Value>) -> ClientResult<Value> {
        self.call_tool("add_numbers", json!({ "a": a.into(), "b": b.into() }))
            .await
    }

    /// Calls `multiply_numbers`.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn multiply_numbers(
        &self,
        a: impl Into<Value>,
        b: impl Into<Value>,
    ) -> ClientResult<Value> {
        self.call_tool("multiply_numbers", json!({ "a": a.into(), "b": b.into() }))
            .await
    }

    /// Calls `calculate_statistics`.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn calculate_statistics<I>(&self, numbers: I) -> ClientResult<Value>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let numbers: Vec<Value> = numbers.into_iter().map(Into::into).collect();
        self.call_tool("calculate_statistics", json!({ "numbers": numbers }))
            .await
    }

    /// Calls `get_user`.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn get_user(&self, user_id: i64) -> ClientResult<Value> {
        self.call_tool("get_user", json!({ "user_id": user_id })).await
    }

    /// Calls `list_users`.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn list_users(&self) -> ClientResult<Value> {
        self.call_tool("list_users", json!({})).await
    }

    /// Calls `get_tasks`, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn get_tasks(&self, filter_status: Option<&str>) -> ClientResult<Value> {
        let params = match filter_status {
            Some(status) => json!({ "filter_status": status }),
            None => json!({}),
        };
        self.call_tool("get_tasks", params).await
    }

    /// Calls `create_task`.
    ///
    /// # Errors
    ///
    /// See [`Self::call_tool`].
    pub async fn create_task(&self, title: &str, assigned_to: i64) -> ClientResult<Value> {
        self.call_tool(
            "create_task",
            json!({ "title": title, "assigned_to": assigned_to }),
        )
        .await
    }

    /// Reads `data://users/list`.
    ///
    /// # Errors
    ///
    /// See [`Self::read_resource`].
    pub async fn read_users_resource(&self) -> ClientResult<Value> {
        self.read_resource("data://users/list").await
    }

    /// Reads `data://config`.
    ///
    /// # Errors
    ///
    /// See [`Self::read_resource`].
    pub async fn read_config_resource(&self) -> ClientResult<Value> {
        self.read_resource("data://config").await
    }

    /// Reads `data://summary`.
    ///
    /// # Errors
    ///
    /// See [`Self::read_resource`].
    pub async fn read_summary_resource(&self) -> ClientResult<Value> {
        self.read_resource("data://summary").await
    }

    /// Releases pooled connections. Dropping the client has the same effect.
    pub fn close(self) {
        debug!(base_url = %self.base_url, "client closed");
    }

    async fn exchange(
        &self,
        operation: &str,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> ClientResult<Bytes> {
        let fail = |cause| ClientError::new(operation, cause);

        let uri: Uri = format!("{}{path}", self.base_url)
            .parse()
            .map_err(|err| fail(TransportError::invalid_request(format!("invalid uri: {err}"))))?;

        let mut builder = Request::builder()
            .method(method)
            .uri(uri)
            .header(ACCEPT, "application/json");
        let body = match body {
            Some(value) => {
                builder = builder.header(CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };
        let request = builder
            .body(body)
            .map_err(|err| fail(TransportError::invalid_request(err.to_string())))?;

        debug!(operation, path, "sending request");
        let exchange = async {
            let response = self
                .client
                .request(request)
                .await
                .map_err(|err| TransportError::connection(err.to_string()))?;
            let status = response.status();
            let bytes = to_bytes(response.into_body())
                .await
                .map_err(|err| TransportError::connection(format!("failed to read body: {err}")))?;
            Ok::<_, TransportError>((status, bytes))
        };

        let (status, bytes) = timeout(self.timeout, exchange)
            .await
            .map_err(|_| fail(TransportError::Timeout(self.timeout)))?
            .map_err(fail)?;

        if !status.is_success() {
            return Err(fail(TransportError::Status {
                status,
                message: error_message(&bytes),
            }));
        }
        Ok(bytes)
    }
}

fn decode<T: DeserializeOwned>(operation: &str, bytes: &[u8]) -> ClientResult<T> {
    serde_json::from_slice(bytes)
        .map_err(|err| ClientError::new(operation, TransportError::decode(err.to_string())))
}

fn resource_value(bytes: &[u8]) -> Value {
    serde_json::from_slice(bytes)
        .unwrap_or_else(|_| json!({ "content": String::from_utf8_lossy(bytes) }))
}

fn error_message(bytes: &[u8]) -> String {
    serde_json::from_slice::<ErrorBody>(bytes)
        .map_or_else(|_| String::from_utf8_lossy(bytes).into_owned(), |body| body.error)
}

#[cfg(test)]
mod tests {
    use std::net::SocketAddr;

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    use super::*;

    fn client_for(addr: SocketAddr, timeout: Duration) -> BridgeClient {
        let config = ClientConfig::default()
            .with_base_url(format!("http://{addr}"))
            .unwrap()
            .with_timeout(timeout);
        BridgeClient::new(&config)
    }

    /// Reads one request (headers plus `content-length` body) and answers
    /// 200 with `body`.
    async fn answer_once(mut socket: TcpStream, body: &'static str) {
        let mut request = Vec::new();
        let mut chunk = [0_u8; 1024];
        loop {
            let read = socket.read(&mut chunk).await.unwrap();
            if read == 0 {
                break;
            }
            request.extend_from_slice(&chunk[..read]);
            let text = String::from_utf8_lossy(&request).to_ascii_lowercase();
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .find_map(|line| line.strip_prefix("content-length:"))
                    .and_then(|value| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if request.len() >= end + 4 + length {
                    break;
                }
            }
        }
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
            body.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.shutdown().await.unwrap();
    }

    #[test]
    fn resource_bodies_fall_back_to_content() {
        assert_eq!(resource_value(br#"{"a":1}"#), json!({ "a": 1 }));
        assert_eq!(resource_value(b"plain text"), json!({ "content": "plain text" }));
    }

    #[test]
    fn error_messages_prefer_server_error_field() {
        assert_eq!(error_message(br#"{"error":"Tool 'x' not found"}"#), "Tool 'x' not found");
        assert_eq!(error_message(b"Bad Gateway"), "Bad Gateway");
    }

    #[tokio::test]
    async fn refused_connection_is_reported() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = client_for(addr, Duration::from_secs(5));
        let err = client.health().await.unwrap_err();
        assert_eq!(err.operation(), "health");
        assert!(matches!(err.cause(), TransportError::Connection { .. }));
        assert!(err.status().is_none());
    }

    #[tokio::test]
    async fn silent_server_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let _accepting = tokio::spawn(async move {
            let mut held = Vec::new();
            while let Ok((socket, _)) = listener.accept().await {
                held.push(socket);
            }
        });

        let client = client_for(addr, Duration::from_millis(100));
        let err = client.add_numbers(1, 2).await.unwrap_err();
        assert_eq!(err.operation(), "add_numbers");
        assert!(matches!(err.cause(), TransportError::Timeout(_)));
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_decode_error() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (socket, _) = listener.accept().await.unwrap();
            answer_once(socket, "<html>not json</html>").await;
        });

        let client = client_for(addr, Duration::from_secs(5));
        let err = client
            .call_tool("add_numbers", json!({ "a": 1, "b": 2 }))
            .await
            .unwrap_err();
        assert_eq!(err.operation(), "add_numbers");
        assert!(matches!(err.cause(), TransportError::Decode { .. }));
        assert!(err.status().is_none());
        server.await.unwrap();
    }
}
