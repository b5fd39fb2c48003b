//! JSON-RPC 2.0 surface served at `POST /mcp`.
//!
//! Shares the [`Dispatcher`] with the REST routes, so both surfaces see the
//! same registry and the same validation rules. Supported methods are
//! `initialize`, `ping`, `tools/list`, `tools/call`, `resources/list` and
//! `resources/read`. Batches are answered element by element; notifications
//! are executed but produce no response.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::dispatch::{Dispatcher, FailureKind, Outcome};

/// Protocol revision advertised by `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const JSONRPC_VERSION: &str = "2.0";

/// A decoded request or notification. Notifications carry no `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Request {
    /// Protocol version, must be `"2.0"`.
    pub jsonrpc: String,
    /// Method name.
    pub method: String,
    /// Optional parameters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Value>,
    /// Request id; absent for notifications.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
}

/// A response to a single request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Response {
    /// Protocol version, always `"2.0"`.
    pub jsonrpc: String,
    /// Successful result.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    /// Error object.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<Error>,
    /// Id of the request being answered, `null` when it could not be read.
    pub id: Value,
}

impl Response {
    /// Successful response.
    #[must_use]
    pub fn new(result: Value, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Error response.
    #[must_use]
    pub fn err(error: Error, id: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_owned(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC error object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Error {
    /// Numeric error code.
    pub code: i32,
    /// Short description.
    pub message: String,
    /// Optional structured detail.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl Error {
    fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Invalid JSON was received (-32700).
    #[must_use]
    pub fn parse_error() -> Self {
        Self::new(-32700, "Parse error")
    }

    /// The payload is not a valid request object (-32600).
    #[must_use]
    pub fn invalid_request() -> Self {
        Self::new(-32600, "Invalid Request")
    }

    /// The method does not exist (-32601).
    #[must_use]
    pub fn method_not_found(method: &str) -> Self {
        Self::new(-32601, format!("Method not found: {method}"))
    }

    /// Parameters were missing or malformed (-32602).
    #[must_use]
    pub fn invalid_params(detail: impl Into<String>) -> Self {
        Self::new(-32602, detail)
    }

    /// The named tool is not registered (-32602).
    #[must_use]
    pub fn unknown_tool(name: &str) -> Self {
        Self::new(-32602, format!("Unknown tool: {name}"))
    }

    /// The named resource is not registered (-32002).
    #[must_use]
    pub fn resource_not_found(uri: &str) -> Self {
        let mut error = Self::new(-32002, "Resource not found");
        error.data = Some(json!({ "uri": uri }));
        error
    }

    /// The handler failed (-32603).
    #[must_use]
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new(-32603, message)
    }
}

#[derive(Deserialize)]
struct CallParams {
    name: String,
    #[serde(default)]
    arguments: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
struct ReadParams {
    uri: String,
}

/// Answers one HTTP payload.
///
/// Returns `None` when nothing should be sent back: a lone notification or a
/// batch made only of notifications.
pub async fn handle_payload(dispatcher: &Dispatcher, server_name: &str, payload: &[u8]) -> Option<Value> {
    let message: Value = match serde_json::from_slice(payload) {
        Ok(message) => message,
        Err(err) => {
            debug!(error = %err, "unparsable rpc payload");
            return Some(encode(Response::err(Error::parse_error(), Value::Null)));
        }
    };

    match message {
        Value::Array(batch) if batch.is_empty() => {
            Some(encode(Response::err(Error::invalid_request(), Value::Null)))
        }
        Value::Array(batch) => {
            let mut responses = Vec::with_capacity(batch.len());
            for message in batch {
                if let Some(response) = handle_message(dispatcher, server_name, message).await {
                    responses.push(encode(response));
                }
            }
            (!responses.is_empty()).then_some(Value::Array(responses))
        }
        message => handle_message(dispatcher, server_name, message)
            .await
            .map(encode),
    }
}

async fn handle_message(dispatcher: &Dispatcher, server_name: &str, message: Value) -> Option<Response> {
    let id_hint = message.get("id").cloned().unwrap_or(Value::Null);
    let request: Request = match serde_json::from_value::<Request>(message) {
        Ok(request) if request.jsonrpc == JSONRPC_VERSION => request,
        _ => return Some(Response::err(Error::invalid_request(), id_hint)),
    };

    debug!(method = %request.method, notification = request.id.is_none(), "rpc call");
    let result = invoke(dispatcher, server_name, &request.method, request.params).await;
    let id = request.id?;
    Some(match result {
        Ok(value) => Response::new(value, id),
        Err(error) => Response::err(error, id),
    })
}

async fn invoke(
    dispatcher: &Dispatcher,
    server_name: &str,
    method: &str,
    params: Option<Value>,
) -> Result<Value, Error> {
    match method {
        "initialize" => Ok(json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": { "name": server_name, "version": env!("CARGO_PKG_VERSION") },
            "capabilities": { "tools": {}, "resources": {} },
        })),
        "ping" => Ok(json!({})),
        "tools/list" => {
            let tools: Vec<Value> = dispatcher
                .registry()
                .tools()
                .into_iter()
                .map(|tool| {
                    json!({
                        "name": tool.name().as_str(),
                        "description": tool.description(),
                        "inputSchema": tool.input_schema(),
                    })
                })
                .collect();
            Ok(json!({ "tools": tools }))
        }
        "tools/call" => {
            let CallParams { name, arguments } = decode(params)?;
            match dispatcher.call_tool(&name, arguments.unwrap_or_default()).await {
                Outcome::Success(value) => Ok(json!({
                    "content": [{ "type": "text", "text": value.to_string() }],
                    "structuredContent": value,
                    "isError": false,
                })),
                Outcome::Failure(failure) => match failure.kind() {
                    FailureKind::ToolNotFound => Err(Error::unknown_tool(&name)),
                    FailureKind::InvalidParameters => Err(Error::invalid_params(failure.message())),
                    FailureKind::HandlerError | FailureKind::ResourceNotFound => Ok(json!({
                        "content": [{ "type": "text", "text": failure.message() }],
                        "isError": true,
                    })),
                },
            }
        }
        "resources/list" => {
            let resources: Vec<Value> = dispatcher
                .registry()
                .resources()
                .into_iter()
                .map(|resource| {
                    json!({
                        "uri": resource.uri().as_str(),
                        "name": resource.uri().path(),
                        "description": resource.description(),
                        "mimeType": "application/json",
                    })
                })
                .collect();
            Ok(json!({ "resources": resources }))
        }
        "resources/read" => {
            let ReadParams { uri } = decode(params)?;
            match dispatcher.read_resource(&uri).await {
                Outcome::Success(value) => Ok(json!({
                    "contents": [{
                        "uri": uri,
                        "mimeType": "application/json",
                        "text": value.to_string(),
                    }],
                })),
                Outcome::Failure(failure) => match failure.kind() {
                    FailureKind::ResourceNotFound => Err(Error::resource_not_found(&uri)),
                    _ => Err(Error::internal_error(failure.message())),
                },
            }
        }
        other => Err(Error::method_not_found(other)),
    }
}

fn decode<T: for<'de> Deserialize<'de>>(params: Option<Value>) -> Result<T, Error> {
    let params = params.ok_or_else(|| Error::invalid_params("missing params"))?;
    serde_json::from_value(params).map_err(|err| Error::invalid_params(err.to_string()))
}

fn encode(response: Response) -> Value {
    serde_json::to_value(response).unwrap_or_else(|err| {
        json!({
            "jsonrpc": JSONRPC_VERSION,
            "error": { "code": -32603, "message": err.to_string() },
            "id": Value::Null,
        })
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use bridge_registry::{
        HandlerRegistry, ParamKind, ParamSpec, ParameterBag, ResourceContent, ResourceDescriptor,
        ResourceMetadata, ToolDescriptor, ToolError, ToolMetadata,
    };

    use super::*;

    fn dispatcher() -> Dispatcher {
        let mut registry = HandlerRegistry::new();
        registry
            .register_tool(ToolDescriptor::new(
                ToolMetadata::new("echo")
                    .unwrap()
                    .with_description("Echo the message")
                    .with_parameter(ParamSpec::required("message", ParamKind::String)),
                |input: ParameterBag| async move { Ok(Value::Object(input)) },
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
                ResourceMetadata::new("data://config").unwrap(),
                || async { Ok(ResourceContent::from(json!({ "debug": true }))) },
            ))
            .unwrap();
        Dispatcher::new(Arc::new(registry))
    }

    async fn call(payload: Value) -> Option<Value> {
        handle_payload(&dispatcher(), "test", payload.to_string().as_bytes()).await
    }

    #[tokio::test]
    async fn initialize_reports_server_name() {
        let response = call(json!({ "jsonrpc": "2.0", "id": 1, "method": "initialize" }))
            .await
            .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["serverInfo"]["name"], "test");
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
    }

    #[tokio::test]
    async fn tools_call_returns_structured_content() {
        let response = call(json!({
            "jsonrpc": "2.0",
            "id": "a",
            "method": "tools/call",
            "params": { "name": "echo", "arguments": { "message": "hi" } },
        }))
        .await
        .unwrap();
        assert_eq!(response["result"]["structuredContent"], json!({ "message": "hi" }));
        assert_eq!(response["result"]["isError"], false);
    }

    #[tokio::test]
    async fn tool_failures_map_to_codes() {
        let unknown = call(json!({
            "jsonrpc": "2.0", "id": 1, "method": "tools/call", "params": { "name": "nope" },
        }))
        .await
        .unwrap();
        assert_eq!(unknown["error"]["code"], -32602);

        let invalid = call(json!({
            "jsonrpc": "2.0", "id": 2, "method": "tools/call",
            "params": { "name": "echo", "arguments": {} },
        }))
        .await
        .unwrap();
        assert_eq!(invalid["error"]["code"], -32602);

        let failed = call(json!({
            "jsonrpc": "2.0", "id": 3, "method": "tools/call", "params": { "name": "fail" },
        }))
        .await
        .unwrap();
        assert_eq!(failed["result"]["isError"], true);
        assert_eq!(
            failed["result"]["content"][0]["text"],
            "Error executing tool: boom"
        );
    }

    #[tokio::test]
    async fn resources_read_and_missing_resource() {
        let read = call(json!({
            "jsonrpc": "2.0", "id": 1, "method": "resources/read",
            "params": { "uri": "data://config" },
        }))
        .await
        .unwrap();
        let text = read["result"]["contents"][0]["text"].as_str().unwrap();
        assert_eq!(serde_json::from_str::<Value>(text).unwrap(), json!({ "debug": true }));

        let missing = call(json!({
            "jsonrpc": "2.0", "id": 2, "method": "resources/read",
            "params": { "uri": "data://nope" },
        }))
        .await
        .unwrap();
        assert_eq!(missing["error"]["code"], -32002);
    }

    #[tokio::test]
    async fn protocol_errors() {
        let parse = handle_payload(&dispatcher(), "test", b"{not json").await.unwrap();
        assert_eq!(parse["error"]["code"], -32700);
        assert_eq!(parse["id"], Value::Null);

        let invalid = call(json!({ "jsonrpc": "1.0", "id": 7, "method": "ping" }))
            .await
            .unwrap();
        assert_eq!(invalid["error"]["code"], -32600);
        assert_eq!(invalid["id"], 7);

        let unknown = call(json!({ "jsonrpc": "2.0", "id": 8, "method": "prompts/list" }))
            .await
            .unwrap();
        assert_eq!(unknown["error"]["code"], -32601);

        let empty = call(json!([])).await.unwrap();
        assert_eq!(empty["error"]["code"], -32600);
    }

    #[tokio::test]
    async fn batches_skip_notifications() {
        let response = call(json!([
            { "jsonrpc": "2.0", "id": 1, "method": "ping" },
            { "jsonrpc": "2.0", "method": "notifications/initialized" },
            { "jsonrpc": "2.0", "id": 2, "method": "tools/list" },
        ]))
        .await
        .unwrap();
        let responses = response.as_array().unwrap();
        assert_eq!(responses.len(), 2);
        assert_eq!(responses[1]["result"]["tools"][0]["name"], "echo");

        let silent = call(json!({ "jsonrpc": "2.0", "method": "ping" })).await;
        assert!(silent.is_none());
    }
}
