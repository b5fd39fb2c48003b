//! Resolution, validation and invocation of registered handlers.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use bridge_registry::params::validate;
use bridge_registry::{HandlerRegistry, ParameterBag, ResourceContent};
use futures::FutureExt;
use serde_json::{Value, json};
use thiserror::Error;
use tracing::{debug, warn};

/// Category of a failed dispatch.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No tool is registered under the requested name.
    ToolNotFound,
    /// No resource is registered under the requested URI.
    ResourceNotFound,
    /// The parameter bag did not satisfy the tool's declared parameters.
    InvalidParameters,
    /// The handler returned an error or panicked.
    HandlerError,
}

impl FailureKind {
    /// Stable snake-case label, used in logs.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ToolNotFound => "tool_not_found",
            Self::ResourceNotFound => "resource_not_found",
            Self::InvalidParameters => "invalid_parameters",
            Self::HandlerError => "handler_error",
        }
    }
}

/// A classified dispatch failure with its caller-facing message.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct Failure {
    kind: FailureKind,
    message: String,
}

impl Failure {
    /// Creates a failure of the given kind.
    #[must_use]
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> FailureKind {
        self.kind
    }

    /// Returns the caller-facing message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Result of exactly one dispatch.
#[derive(Clone, Debug, PartialEq)]
pub enum Outcome {
    /// The handler produced a value.
    Success(Value),
    /// The dispatch failed.
    Failure(Failure),
}

impl Outcome {
    fn failure(kind: FailureKind, message: impl Into<String>) -> Self {
        Self::Failure(Failure::new(kind, message))
    }

    /// Returns `true` for [`Outcome::Success`].
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Returns the failure kind, if any.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Self::Success(_) => None,
            Self::Failure(failure) => Some(failure.kind()),
        }
    }

    /// Converts into a standard `Result`.
    ///
    /// # Errors
    ///
    /// Returns the contained [`Failure`] for [`Outcome::Failure`].
    pub fn into_result(self) -> Result<Value, Failure> {
        match self {
            Self::Success(value) => Ok(value),
            Self::Failure(failure) => Err(failure),
        }
    }
}

/// Routes calls to handlers held in a shared, read-only registry.
///
/// Every call yields exactly one [`Outcome`]: handler errors and panics are
/// caught here and never reach the caller as anything else.
#[derive(Clone, Debug)]
pub struct Dispatcher {
    registry: Arc<HandlerRegistry>,
}

impl Dispatcher {
    /// Wraps the shared registry.
    #[must_use]
    pub fn new(registry: Arc<HandlerRegistry>) -> Self {
        Self { registry }
    }

    /// Returns the underlying registry.
    #[must_use]
    pub fn registry(&self) -> &HandlerRegistry {
        &self.registry
    }

    /// Validates `bag` against the tool's parameters and invokes it.
    pub async fn call_tool(&self, name: &str, bag: ParameterBag) -> Outcome {
        let Some(tool) = self.registry.lookup_tool(name) else {
            debug!(tool = name, "unknown tool");
            return Outcome::failure(FailureKind::ToolNotFound, format!("Tool '{name}' not found"));
        };

        let input = match validate(tool.metadata().parameters(), bag) {
            Ok(input) => input,
            Err(err) => {
                debug!(tool = name, error = %err, "rejected parameters");
                return Outcome::failure(
                    FailureKind::InvalidParameters,
                    format!("Invalid parameters: {err}"),
                );
            }
        };

        match AssertUnwindSafe(tool.invoke(input)).catch_unwind().await {
            Ok(Ok(value)) => {
                debug!(tool = name, "tool completed");
                Outcome::Success(value)
            }
            Ok(Err(err)) => {
                warn!(tool = name, error = %err, "tool failed");
                Outcome::failure(
                    FailureKind::HandlerError,
                    format!("Error executing tool: {err}"),
                )
            }
            Err(payload) => {
                warn!(tool = name, panic = panic_message(payload.as_ref()), "tool panicked");
                Outcome::failure(
                    FailureKind::HandlerError,
                    "Error executing tool: handler panicked",
                )
            }
        }
    }

    /// Produces the resource registered under `uri`.
    ///
    /// Text content is parsed as JSON; text that is not JSON is wrapped as
    /// `{"content": text}`.
    pub async fn read_resource(&self, uri: &str) -> Outcome {
        let Some(resource) = self.registry.lookup_resource(uri) else {
            debug!(uri, "unknown resource");
            return Outcome::failure(
                FailureKind::ResourceNotFound,
                format!("Resource '{uri}' not found"),
            );
        };

        match AssertUnwindSafe(resource.produce()).catch_unwind().await {
            Ok(Ok(ResourceContent::Json(value))) => Outcome::Success(value),
            Ok(Ok(ResourceContent::Text(text))) => Outcome::Success(text_to_json(text)),
            Ok(Err(err)) => {
                warn!(uri, error = %err, "resource failed");
                Outcome::failure(
                    FailureKind::HandlerError,
                    format!("Error reading resource: {err}"),
                )
            }
            Err(payload) => {
                warn!(uri, panic = panic_message(payload.as_ref()), "resource panicked");
                Outcome::failure(
                    FailureKind::HandlerError,
                    "Error reading resource: handler panicked",
                )
            }
        }
    }
}

fn text_to_json(text: String) -> Value {
    match serde_json::from_str::<Value>(&text) {
        Ok(value) => value,
        Err(_) => json!({ "content": text }),
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use bridge_registry::{
        ParamKind, ParamSpec, ResourceDescriptor, ResourceMetadata, ToolDescriptor, ToolError,
        ToolMetadata, ToolResult,
    };

    use super::*;

    fn bag(value: Value) -> ParameterBag {
        match value {
            Value::Object(map) => map,
            other => panic!("expected object, got {other}"),
        }
    }

    fn explode() -> ToolResult<Value> {
        panic!("secret detail")
    }

    fn collapse() -> ToolResult<ResourceContent> {
        panic!("secret resource detail")
    }

    fn dispatcher_with_counter() -> (Dispatcher, Arc<AtomicUsize>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let mut registry = HandlerRegistry::new();

        let counter = Arc::clone(&calls);
        registry
            .register_tool(ToolDescriptor::new(
                ToolMetadata::new("double")
                    .unwrap()
                    .with_parameter(ParamSpec::required("value", ParamKind::Integer)),
                move |input: ParameterBag| {
                    counter.fetch_add(1, Ordering::SeqCst);
                    async move {
                        let value = input["value"].as_i64().unwrap_or_default();
                        Ok(json!({ "result": value * 2 }))
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
            .register_tool(ToolDescriptor::new(
                ToolMetadata::new("explode").unwrap(),
                |_: ParameterBag| async { explode() },
            ))
            .unwrap();

        registry
            .register_resource(ResourceDescriptor::new(
                ResourceMetadata::new("data://plain").unwrap(),
                || async { Ok(ResourceContent::from("not json")) },
            ))
            .unwrap();

        registry
            .register_resource(ResourceDescriptor::new(
                ResourceMetadata::new("data://doc").unwrap(),
                || async { Ok(ResourceContent::from("{\"answer\": 42}")) },
            ))
            .unwrap();

        registry
            .register_resource(ResourceDescriptor::new(
                ResourceMetadata::new("data://broken").unwrap(),
                || async { Err(ToolError::execution("disk gone")) },
            ))
            .unwrap();

        registry
            .register_resource(ResourceDescriptor::new(
                ResourceMetadata::new("data://collapse").unwrap(),
                || async { collapse() },
            ))
            .unwrap();

        (Dispatcher::new(Arc::new(registry)), calls)
    }

    #[tokio::test]
    async fn coerced_input_reaches_handler() {
        let (dispatcher, calls) = dispatcher_with_counter();
        let outcome = dispatcher.call_tool("double", bag(json!({ "value": "21" }))).await;
        assert_eq!(outcome, Outcome::Success(json!({ "result": 42 })));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_parameter_never_invokes_handler() {
        let (dispatcher, calls) = dispatcher_with_counter();
        let outcome = dispatcher.call_tool("double", ParameterBag::new()).await;
        let failure = outcome.into_result().unwrap_err();
        assert_eq!(failure.kind(), FailureKind::InvalidParameters);
        assert_eq!(
            failure.message(),
            "Invalid parameters: missing required parameter 'value'"
        );
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unexpected_parameter_is_rejected() {
        let (dispatcher, calls) = dispatcher_with_counter();
        let outcome = dispatcher
            .call_tool("double", bag(json!({ "value": 1, "extra": true })))
            .await;
        assert_eq!(outcome.failure_kind(), Some(FailureKind::InvalidParameters));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unknown_tool_is_classified() {
        let (dispatcher, _) = dispatcher_with_counter();
        let failure = dispatcher
            .call_tool("nope", ParameterBag::new())
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::ToolNotFound);
        assert_eq!(failure.to_string(), "Tool 'nope' not found");
    }

    #[tokio::test]
    async fn handler_errors_and_panics_become_outcomes() {
        let (dispatcher, _) = dispatcher_with_counter();
        let failure = dispatcher
            .call_tool("fail", ParameterBag::new())
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::HandlerError);
        assert_eq!(failure.message(), "Error executing tool: boom");

        let failure = dispatcher
            .call_tool("explode", ParameterBag::new())
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::HandlerError);
        assert!(!failure.message().contains("secret detail"));
    }

    #[tokio::test]
    async fn resource_text_is_parsed_or_wrapped() {
        let (dispatcher, _) = dispatcher_with_counter();
        assert_eq!(
            dispatcher.read_resource("data://doc").await,
            Outcome::Success(json!({ "answer": 42 }))
        );
        assert_eq!(
            dispatcher.read_resource("data://plain").await,
            Outcome::Success(json!({ "content": "not json" }))
        );
    }

    #[tokio::test]
    async fn unknown_resource_is_classified() {
        let (dispatcher, _) = dispatcher_with_counter();
        let failure = dispatcher
            .read_resource("data://unknown/path")
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::ResourceNotFound);
        assert_eq!(failure.message(), "Resource 'data://unknown/path' not found");
    }

    #[tokio::test]
    async fn resource_errors_and_panics_become_outcomes() {
        let (dispatcher, _) = dispatcher_with_counter();
        let failure = dispatcher
            .read_resource("data://broken")
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::HandlerError);
        assert_eq!(failure.message(), "Error reading resource: disk gone");

        let failure = dispatcher
            .read_resource("data://collapse")
            .await
            .into_result()
            .unwrap_err();
        assert_eq!(failure.kind(), FailureKind::HandlerError);
        assert_eq!(failure.message(), "Error reading resource: handler panicked");
    }
}
