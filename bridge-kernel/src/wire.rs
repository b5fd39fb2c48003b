//! HTTP translation layer between hyper and the [`Dispatcher`].
//!
//! | Route | Method |
//! |---|---|
//! | `/health` | GET |
//! | `/api/tools` | GET |
//! | `/api/tools/{name}/execute` | POST |
//! | `/api/resources` | GET |
//! | `/api/resources/{path}` | GET |
//! | `/mcp` | POST |

use std::borrow::Cow;
use std::sync::Arc;

use bridge_config::ServerConfig;
use bridge_config::schema::{DEFAULT_MAX_BODY_BYTES, DEFAULT_SERVER_NAME};
use bridge_primitives::{RESOURCE_SCHEME, RequestId};
use bridge_registry::{HandlerRegistry, ParameterBag};
use bridge_telemetry::HealthReport;
use bytes::{Bytes, BytesMut};
use hyper::body::HttpBody;
use hyper::header::{ALLOW, CONTENT_LENGTH, CONTENT_TYPE, HeaderName, HeaderValue};
use hyper::{Body, Method, Request, Response, StatusCode};
use serde::Serialize;
use serde_json::Value;
use tracing::{Instrument, debug, info, info_span, warn};

use crate::dispatch::{Dispatcher, FailureKind, Outcome};
use crate::payload::{ErrorBody, ResourceListing, ToolListing};
use crate::rpc;

/// Header carrying the per-request correlation id.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Health,
    ListTools,
    ExecuteTool(String),
    ListResources,
    ReadResource(String),
    Rpc,
    NotFound,
}

impl Route {
    fn parse(path: &str) -> Self {
        match path {
            "/health" => return Self::Health,
            "/api/tools" => return Self::ListTools,
            "/api/resources" => return Self::ListResources,
            "/mcp" => return Self::Rpc,
            _ => {}
        }

        if let Some(rest) = path.strip_prefix("/api/resources/") {
            return Self::ReadResource(percent_decoded(rest));
        }

        path.strip_prefix("/api/tools/")
            .and_then(|rest| rest.strip_suffix("/execute"))
            .filter(|name| !name.contains('/'))
            .map_or(Self::NotFound, |name| Self::ExecuteTool(percent_decoded(name)))
    }

    fn allowed(&self) -> Option<Method> {
        match self {
            Self::Health | Self::ListTools | Self::ListResources | Self::ReadResource(_) => {
                Some(Method::GET)
            }
            Self::ExecuteTool(_) | Self::Rpc => Some(Method::POST),
            Self::NotFound => None,
        }
    }
}

/// Decodes `%XX` escapes in a matched path segment. Segments that do not
/// decode to UTF-8 are kept verbatim.
fn percent_decoded(segment: &str) -> String {
    urlencoding::decode(segment).map_or_else(|_| segment.to_owned(), Cow::into_owned)
}

enum BodyError {
    TooLarge,
    Read(hyper::Error),
}

/// Translates HTTP requests into dispatcher calls and outcomes into responses.
#[derive(Debug)]
pub struct WireBridge {
    dispatcher: Dispatcher,
    server_name: String,
    max_body_bytes: usize,
}

impl WireBridge {
    /// Creates a bridge with the default name and body ceiling.
    #[must_use]
    pub fn new(dispatcher: Dispatcher) -> Self {
        Self {
            dispatcher,
            server_name: DEFAULT_SERVER_NAME.to_owned(),
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }

    /// Creates a bridge over `registry` using the server settings.
    #[must_use]
    pub fn from_config(registry: Arc<HandlerRegistry>, config: &ServerConfig) -> Self {
        Self::new(Dispatcher::new(registry))
            .with_server_name(config.name())
            .with_max_body_bytes(config.max_body_bytes())
    }

    /// Overrides the name reported by `/health`.
    #[must_use]
    pub fn with_server_name(mut self, name: impl Into<String>) -> Self {
        self.server_name = name.into();
        self
    }

    /// Overrides the request body ceiling.
    #[must_use]
    pub fn with_max_body_bytes(mut self, limit: usize) -> Self {
        self.max_body_bytes = limit;
        self
    }

    /// Returns the dispatcher.
    #[must_use]
    pub fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Returns the server name.
    #[must_use]
    pub fn server_name(&self) -> &str {
        &self.server_name
    }

    /// Handles one request. Never fails: every problem becomes a JSON error
    /// response.
    pub async fn handle(&self, request: Request<Body>) -> Response<Body> {
        let request_id = RequestId::random();
        let span = info_span!(
            "request",
            method = %request.method(),
            path = %request.uri().path(),
            request_id = %request_id,
        );

        async move {
            let mut response = self.route(request).await;
            if let Ok(value) = HeaderValue::from_str(&request_id.to_string()) {
                response
                    .headers_mut()
                    .insert(HeaderName::from_static(REQUEST_ID_HEADER), value);
            }
            info!(status = response.status().as_u16(), "request completed");
            response
        }
        .instrument(span)
        .await
    }

    async fn route(&self, request: Request<Body>) -> Response<Body> {
        let route = Route::parse(request.uri().path());
        let Some(allowed) = route.allowed() else {
            return error_response(StatusCode::NOT_FOUND, "Not found");
        };
        if *request.method() != allowed {
            let mut response = error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed");
            if let Ok(value) = HeaderValue::from_str(allowed.as_str()) {
                response.headers_mut().insert(ALLOW, value);
            }
            return response;
        }

        match route {
            Route::Health => json_response(StatusCode::OK, &HealthReport::healthy(&self.server_name)),
            Route::ListTools => json_response(
                StatusCode::OK,
                &ToolListing::from_registry(self.dispatcher.registry()),
            ),
            Route::ListResources => json_response(
                StatusCode::OK,
                &ResourceListing::from_registry(self.dispatcher.registry()),
            ),
            Route::ExecuteTool(name) => self.execute_tool(&name, request).await,
            Route::ReadResource(path) => self.read_resource(&path).await,
            Route::Rpc => self.rpc(request).await,
            Route::NotFound => error_response(StatusCode::NOT_FOUND, "Not found"),
        }
    }

    async fn execute_tool(&self, name: &str, request: Request<Body>) -> Response<Body> {
        if name.is_empty() {
            return error_response(StatusCode::BAD_REQUEST, "Tool name required");
        }

        let payload = match self.read_body(request).await {
            Ok(payload) => payload,
            Err(response) => return response,
        };

        let bag: ParameterBag = match serde_json::from_slice::<Value>(&payload) {
            Ok(Value::Object(bag)) => bag,
            Ok(_) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    "Invalid request body: expected a JSON object",
                );
            }
            Err(err) => {
                return error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request body: {err}"),
                );
            }
        };

        outcome_response(self.dispatcher.call_tool(name, bag).await)
    }

    async fn read_resource(&self, path: &str) -> Response<Body> {
        if path.is_empty() {
            return error_response(StatusCode::BAD_REQUEST, "Resource path required");
        }
        let uri = resource_uri(path);
        outcome_response(self.dispatcher.read_resource(&uri).await)
    }

    async fn rpc(&self, request: Request<Body>) -> Response<Body> {
        let payload = match self.read_body(request).await {
            Ok(payload) => payload,
            Err(response) => return response,
        };

        match rpc::handle_payload(&self.dispatcher, &self.server_name, &payload).await {
            Some(reply) => json_response(StatusCode::OK, &reply),
            None => {
                let mut response = Response::new(Body::empty());
                *response.status_mut() = StatusCode::ACCEPTED;
                response
            }
        }
    }

    async fn read_body(&self, request: Request<Body>) -> Result<Bytes, Response<Body>> {
        let declared = request
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse::<usize>().ok());
        if declared.is_some_and(|length| length > self.max_body_bytes) {
            return Err(too_large());
        }

        match collect_limited(request.into_body(), self.max_body_bytes).await {
            Ok(bytes) => Ok(bytes),
            Err(BodyError::TooLarge) => Err(too_large()),
            Err(BodyError::Read(err)) => {
                warn!(error = %err, "failed to read request body");
                Err(error_response(
                    StatusCode::BAD_REQUEST,
                    format!("Invalid request body: {err}"),
                ))
            }
        }
    }
}

async fn collect_limited(mut body: Body, limit: usize) -> Result<Bytes, BodyError> {
    let mut buffer = BytesMut::new();
    while let Some(chunk) = body.data().await {
        let chunk = chunk.map_err(BodyError::Read)?;
        if buffer.len() + chunk.len() > limit {
            return Err(BodyError::TooLarge);
        }
        buffer.extend_from_slice(&chunk);
    }
    Ok(buffer.freeze())
}

/// Maps the path segment after `/api/resources/` to a resource URI.
///
/// Paths that already carry the scheme (including the `data:/` form produced
/// by path normalization) are used as is.
fn resource_uri(path: &str) -> String {
    if path.starts_with(RESOURCE_SCHEME) {
        return path.to_owned();
    }
    match path.strip_prefix("data:/") {
        Some(rest) => format!("{RESOURCE_SCHEME}{rest}"),
        None => format!("{RESOURCE_SCHEME}{path}"),
    }
}

/// HTTP status for a failure category.
#[must_use]
pub const fn status_for(kind: FailureKind) -> StatusCode {
    match kind {
        FailureKind::ToolNotFound | FailureKind::ResourceNotFound => StatusCode::NOT_FOUND,
        FailureKind::InvalidParameters => StatusCode::BAD_REQUEST,
        FailureKind::HandlerError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn outcome_response(outcome: Outcome) -> Response<Body> {
    match outcome {
        Outcome::Success(value) => json_response(StatusCode::OK, &value),
        Outcome::Failure(failure) => {
            debug!(kind = failure.kind().as_str(), "dispatch failed");
            error_response(status_for(failure.kind()), failure.message())
        }
    }
}

fn too_large() -> Response<Body> {
    error_response(StatusCode::PAYLOAD_TOO_LARGE, "Request body too large")
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response<Body> {
    json_response(status, &ErrorBody::new(message))
}

fn json_response<T: Serialize>(status: StatusCode, body: &T) -> Response<Body> {
    let (status, encoded) = match serde_json::to_vec(body) {
        Ok(encoded) => (status, encoded),
        Err(err) => {
            warn!(error = %err, "failed to encode response body");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                br#"{"error":"Failed to encode response"}"#.to_vec(),
            )
        }
    };

    let mut response = Response::new(Body::from(encoded));
    *response.status_mut() = status;
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    response
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bridge_registry::{
        ParamKind, ParamSpec, ResourceContent, ResourceDescriptor, ResourceMetadata,
        ToolDescriptor, ToolError, ToolMetadata,
    };
    use serde_json::json;

    use super::*;

    fn bridge(calls: &Arc<AtomicUsize>) -> WireBridge {
        let mut registry = HandlerRegistry::new();
        let counter = Arc::clone(calls);
        registry
            .register_tool(ToolDescriptor::new(
                ToolMetadata::new("add")
                    .unwrap()
                    .with_parameter(ParamSpec::required("a", ParamKind::Integer))
                    .with_parameter(ParamSpec::required("b", ParamKind::Integer)),
                move |input: ParameterBag| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        let a = input["a"].as_i64().unwrap_or_default();
                        let b = input["b"].as_i64().unwrap_or_default();
                        Ok(json!({ "result": a + b }))
                    }
                },
            ))
            .unwrap();
        registry
            .register_tool(ToolDescriptor::new(
                ToolMetadata::new("fail").unwrap(),
                |_: ParameterBag| async { Err(ToolError::execution("boom")) },
            ))
            .unwrap();
        registry
            .register_resource(ResourceDescriptor::new(
                ResourceMetadata::new("data://users/list").unwrap(),
                || async { Ok(ResourceContent::from("{\"count\": 0}")) },
            ))
            .unwrap();
        registry
            .register_resource(ResourceDescriptor::new(
                ResourceMetadata::new("data://broken").unwrap(),
                || async { Err(ToolError::execution("disk gone")) },
            ))
            .unwrap();

        WireBridge::new(Dispatcher::new(Arc::new(registry)))
            .with_server_name("unit")
            .with_max_body_bytes(256)
    }

    fn post(path: &str, body: &str) -> Request<Body> {
        Request::post(path)
            .header(CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_owned()))
            .unwrap()
    }

    fn get(path: &str) -> Request<Body> {
        Request::get(path).body(Body::empty()).unwrap()
    }

    async fn send(bridge: &WireBridge, request: Request<Body>) -> (StatusCode, Value) {
        let response = bridge.handle(request).await;
        assert!(response.headers().contains_key(REQUEST_ID_HEADER));
        let status = response.status();
        let bytes = hyper::body::to_bytes(response.into_body()).await.unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[test]
    fn routes_parse() {
        assert_eq!(Route::parse("/health"), Route::Health);
        assert_eq!(
            Route::parse("/api/tools/add/execute"),
            Route::ExecuteTool("add".into())
        );
        assert_eq!(Route::parse("/api/tools//execute"), Route::ExecuteTool(String::new()));
        assert_eq!(Route::parse("/api/tools/a/b/execute"), Route::NotFound);
        assert_eq!(
            Route::parse("/api/resources/users/list"),
            Route::ReadResource("users/list".into())
        );
        assert_eq!(Route::parse("/elsewhere"), Route::NotFound);
    }

    #[test]
    fn matched_segments_are_percent_decoded() {
        assert_eq!(
            Route::parse("/api/resources/users%2Flist"),
            Route::ReadResource("users/list".into())
        );
        assert_eq!(
            Route::parse("/api/resources/data%3A%2F%2Fconfig"),
            Route::ReadResource("data://config".into())
        );
        assert_eq!(
            Route::parse("/api/tools/a%64d/execute"),
            Route::ExecuteTool("add".into())
        );
        assert_eq!(
            Route::parse("/api/resources/bad%FF"),
            Route::ReadResource("bad%FF".into())
        );
    }

    #[test]
    fn resource_paths_map_to_uris() {
        assert_eq!(resource_uri("users/list"), "data://users/list");
        assert_eq!(resource_uri("data://summary"), "data://summary");
        assert_eq!(resource_uri("data:/summary"), "data://summary");
    }

    #[test]
    fn failure_statuses() {
        assert_eq!(status_for(FailureKind::ToolNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(FailureKind::ResourceNotFound), StatusCode::NOT_FOUND);
        assert_eq!(status_for(FailureKind::InvalidParameters), StatusCode::BAD_REQUEST);
        assert_eq!(
            status_for(FailureKind::HandlerError),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[tokio::test]
    async fn executes_tools() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bridge = bridge(&calls);
        let (status, body) = send(&bridge, post("/api/tools/add/execute", r#"{"a":5,"b":3}"#)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "result": 8 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn maps_failures_to_statuses() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bridge = bridge(&calls);

        let (status, body) = send(&bridge, post("/api/tools/nope/execute", "{}")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Tool 'nope' not found" }));

        let (status, body) = send(&bridge, post("/api/tools/add/execute", r#"{"a":5}"#)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(
            body,
            json!({ "error": "Invalid parameters: missing required parameter 'b'" })
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);

        let (status, body) = send(&bridge, post("/api/tools/fail/execute", "{}")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Error executing tool: boom" }));
    }

    #[tokio::test]
    async fn rejects_bad_bodies() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bridge = bridge(&calls);

        let (status, body) = send(&bridge, post("/api/tools/add/execute", "")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request body"));

        let (status, _) = send(&bridge, post("/api/tools/add/execute", "[1, 2]")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(&bridge, post("/api/tools//execute", "{}")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Tool name required" }));

        let oversized = format!(r#"{{"a":1,"b":2,"pad":"{}"}}"#, "x".repeat(512));
        let (status, body) = send(&bridge, post("/api/tools/add/execute", &oversized)).await;
        assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(body, json!({ "error": "Request body too large" }));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn reads_resources() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bridge = bridge(&calls);

        let (status, body) = send(&bridge, get("/api/resources/users/list")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 0 }));

        let (status, body) = send(&bridge, get("/api/resources/data://users/list")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 0 }));

        let (status, body) = send(&bridge, get("/api/resources/unknown/path")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(
            body,
            json!({ "error": "Resource 'data://unknown/path' not found" })
        );

        let (status, body) = send(&bridge, get("/api/resources/data%3A%2F%2Fusers%2Flist")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "count": 0 }));

        let (status, body) = send(&bridge, get("/api/resources/broken")).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body, json!({ "error": "Error reading resource: disk gone" }));

        let (status, body) = send(&bridge, get("/api/resources/")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body, json!({ "error": "Resource path required" }));
    }

    #[tokio::test]
    async fn health_listing_and_routing() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bridge = bridge(&calls);

        let (status, body) = send(&bridge, get("/health")).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({ "status": "healthy", "server": "unit" }));

        let (_, body) = send(&bridge, get("/api/tools")).await;
        assert_eq!(body["tools"][0]["name"], "add");
        assert_eq!(body["tools"][0]["input_schema"]["required"], json!(["a", "b"]));

        let (_, body) = send(&bridge, get("/api/resources")).await;
        assert_eq!(body["resources"][1]["uri"], "data://users/list");

        let (status, _) = send(&bridge, get("/api/tools/add/execute")).await;
        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);

        let (status, body) = send(&bridge, get("/missing")).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({ "error": "Not found" }));
    }

    #[tokio::test]
    async fn rpc_shares_the_dispatcher() {
        let calls = Arc::new(AtomicUsize::new(0));
        let bridge = bridge(&calls);
        let payload = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "tools/call",
            "params": { "name": "add", "arguments": { "a": 2, "b": 2 } },
        });
        let (status, body) = send(&bridge, post("/mcp", &payload.to_string())).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["result"]["structuredContent"], json!({ "result": 4 }));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        let (status, body) = send(&bridge, post("/mcp", r#"{"jsonrpc":"2.0","method":"ping"}"#)).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body, Value::Null);
    }
}
