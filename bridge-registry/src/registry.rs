//! Registry of tool and resource handlers.

use std::collections::HashMap;
use std::fmt;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use bridge_primitives::{ResourceUri, ToolName};
use serde_json::Value;
use thiserror::Error;

use crate::params::{ParamSpec, ParameterBag, input_schema};

/// Result alias for tool and resource operations.
pub type ToolResult<T> = Result<T, ToolError>;

/// Metadata describing a registered tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolMetadata {
    name: ToolName,
    description: Option<String>,
    parameters: Vec<ParamSpec>,
}

impl ToolMetadata {
    /// Creates metadata for the supplied tool name.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if the name is not a valid
    /// [`ToolName`].
    pub fn new(name: impl Into<String>) -> ToolResult<Self> {
        let name = ToolName::new(name).map_err(|err| ToolError::InvalidMetadata {
            reason: err.to_string(),
        })?;

        Ok(Self {
            name,
            description: None,
            parameters: Vec::new(),
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Appends a declared parameter; declaration order is preserved.
    #[must_use]
    pub fn with_parameter(mut self, parameter: ParamSpec) -> Self {
        self.parameters.push(parameter);
        self
    }

    /// Returns the tool name.
    #[must_use]
    pub fn name(&self) -> &ToolName {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns the declared parameters in order.
    #[must_use]
    pub fn parameters(&self) -> &[ParamSpec] {
        &self.parameters
    }

    /// Returns a JSON-Schema object describing the accepted parameters.
    #[must_use]
    pub fn input_schema(&self) -> Value {
        input_schema(&self.parameters)
    }
}

/// Trait implemented by tool executors.
///
/// Executors receive the bag only after it has been validated against the
/// tool's declared parameters.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Invokes the tool with the validated parameters, returning JSON output.
    async fn invoke(&self, input: ParameterBag) -> ToolResult<Value>;
}

#[async_trait]
impl<F, Fut> Tool for F
where
    F: Send + Sync + Fn(ParameterBag) -> Fut,
    Fut: Future<Output = ToolResult<Value>> + Send,
{
    async fn invoke(&self, input: ParameterBag) -> ToolResult<Value> {
        (self)(input).await
    }
}

/// Registered tool: metadata plus its executor.
#[derive(Clone)]
pub struct ToolDescriptor {
    metadata: ToolMetadata,
    executor: Arc<dyn Tool>,
}

impl ToolDescriptor {
    /// Pairs metadata with an executor.
    #[must_use]
    pub fn new<T>(metadata: ToolMetadata, tool: T) -> Self
    where
        T: Tool + 'static,
    {
        Self {
            metadata,
            executor: Arc::new(tool),
        }
    }

    /// Returns the associated metadata.
    #[must_use]
    pub fn metadata(&self) -> &ToolMetadata {
        &self.metadata
    }

    /// Executes the underlying tool implementation.
    ///
    /// Callers are expected to validate `input` first; see
    /// [`crate::params::validate`].
    ///
    /// # Errors
    ///
    /// Propagates any [`ToolError::Execution`] returned by the implementation.
    pub async fn invoke(&self, input: ParameterBag) -> ToolResult<Value> {
        self.executor.invoke(input).await
    }

    /// Returns `true` when both descriptors share the same executor instance.
    #[must_use]
    pub fn same_executor(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.executor, &other.executor)
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Content produced by a resource.
#[derive(Clone, Debug, PartialEq)]
pub enum ResourceContent {
    /// Already structured JSON.
    Json(Value),
    /// Raw text; parsed as JSON by the dispatcher when possible.
    Text(String),
}

impl From<Value> for ResourceContent {
    fn from(value: Value) -> Self {
        Self::Json(value)
    }
}

impl From<String> for ResourceContent {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

impl From<&str> for ResourceContent {
    fn from(value: &str) -> Self {
        Self::Text(value.to_owned())
    }
}

/// Trait implemented by resource producers.
#[async_trait]
pub trait Resource: Send + Sync {
    /// Produces the current content of the resource.
    async fn produce(&self) -> ToolResult<ResourceContent>;
}

#[async_trait]
impl<F, Fut> Resource for F
where
    F: Send + Sync + Fn() -> Fut,
    Fut: Future<Output = ToolResult<ResourceContent>> + Send,
{
    async fn produce(&self) -> ToolResult<ResourceContent> {
        (self)().await
    }
}

/// Metadata describing a registered resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceMetadata {
    uri: ResourceUri,
    description: Option<String>,
}

impl ResourceMetadata {
    /// Creates metadata for a full `data://` URI.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::InvalidMetadata`] if the URI is malformed.
    pub fn new(uri: impl Into<String>) -> ToolResult<Self> {
        let uri = ResourceUri::new(uri).map_err(|err| ToolError::InvalidMetadata {
            reason: err.to_string(),
        })?;

        Ok(Self {
            uri,
            description: None,
        })
    }

    /// Sets the human-readable description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Returns the resource URI.
    #[must_use]
    pub fn uri(&self) -> &ResourceUri {
        &self.uri
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }
}

/// Registered resource: metadata plus its producer.
#[derive(Clone)]
pub struct ResourceDescriptor {
    metadata: ResourceMetadata,
    producer: Arc<dyn Resource>,
}

impl ResourceDescriptor {
    /// Pairs metadata with a producer.
    #[must_use]
    pub fn new<R>(metadata: ResourceMetadata, producer: R) -> Self
    where
        R: Resource + 'static,
    {
        Self {
            metadata,
            producer: Arc::new(producer),
        }
    }

    /// Returns the associated metadata.
    #[must_use]
    pub fn metadata(&self) -> &ResourceMetadata {
        &self.metadata
    }

    /// Runs the producer.
    ///
    /// # Errors
    ///
    /// Propagates any error returned by the producer.
    pub async fn produce(&self) -> ToolResult<ResourceContent> {
        self.producer.produce().await
    }
}

impl fmt::Debug for ResourceDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceDescriptor")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}

/// Registry that stores tools keyed by name and resources keyed by URI.
///
/// Registration requires `&mut self`; once the registry is shared behind an
/// `Arc` it can no longer change, so lookups never lock.
#[derive(Default)]
pub struct HandlerRegistry {
    tools: HashMap<ToolName, ToolDescriptor>,
    resources: HashMap<ResourceUri, ResourceDescriptor>,
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tools: Vec<_> = self.tools().iter().map(|meta| meta.name().as_str()).collect();
        let resources: Vec<_> = self
            .resources()
            .iter()
            .map(|meta| meta.uri().as_str())
            .collect();
        f.debug_struct("HandlerRegistry")
            .field("tools", &tools)
            .field("resources", &resources)
            .finish()
    }
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a tool.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateTool`] if the name is already present.
    pub fn register_tool(&mut self, descriptor: ToolDescriptor) -> ToolResult<()> {
        let name = descriptor.metadata().name().clone();
        if self.tools.contains_key(&name) {
            return Err(ToolError::DuplicateTool {
                name: name.into(),
            });
        }

        self.tools.insert(name, descriptor);
        Ok(())
    }

    /// Registers a resource.
    ///
    /// # Errors
    ///
    /// Returns [`ToolError::DuplicateResource`] if the URI is already present.
    pub fn register_resource(&mut self, descriptor: ResourceDescriptor) -> ToolResult<()> {
        let uri = descriptor.metadata().uri().clone();
        if self.resources.contains_key(&uri) {
            return Err(ToolError::DuplicateResource { uri: uri.into() });
        }

        self.resources.insert(uri, descriptor);
        Ok(())
    }

    /// Returns the tool registered under `name`.
    #[must_use]
    pub fn lookup_tool(&self, name: &str) -> Option<&ToolDescriptor> {
        self.tools.get(name)
    }

    /// Returns the resource registered under `uri`.
    #[must_use]
    pub fn lookup_resource(&self, uri: &str) -> Option<&ResourceDescriptor> {
        self.resources.get(uri)
    }

    /// Lists tool metadata sorted by name.
    #[must_use]
    pub fn tools(&self) -> Vec<&ToolMetadata> {
        let mut tools: Vec<_> = self.tools.values().map(ToolDescriptor::metadata).collect();
        tools.sort_by(|a, b| a.name().cmp(b.name()));
        tools
    }

    /// Lists resource metadata sorted by URI.
    #[must_use]
    pub fn resources(&self) -> Vec<&ResourceMetadata> {
        let mut resources: Vec<_> = self
            .resources
            .values()
            .map(ResourceDescriptor::metadata)
            .collect();
        resources.sort_by(|a, b| a.uri().cmp(b.uri()));
        resources
    }
}

/// Errors produced by registration and handler execution.
#[derive(Debug, Error)]
pub enum ToolError {
    /// Tool or resource metadata failed validation.
    #[error("invalid handler metadata: {reason}")]
    InvalidMetadata {
        /// Human-readable reason for rejection.
        reason: String,
    },

    /// Tool name collided with an existing registration.
    #[error("tool `{name}` is already registered")]
    DuplicateTool {
        /// Name of the offending tool.
        name: String,
    },

    /// Resource URI collided with an existing registration.
    #[error("resource `{uri}` is already registered")]
    DuplicateResource {
        /// URI of the offending resource.
        uri: String,
    },

    /// Handler execution failed.
    #[error("{reason}")]
    Execution {
        /// Human-readable error returned by the implementation.
        reason: String,
    },
}

impl ToolError {
    /// Creates an execution error from the supplied reason.
    #[must_use]
    pub fn execution(reason: impl Into<String>) -> Self {
        Self::Execution {
            reason: reason.into(),
        }
    }
}
