//! Wire-level structures exchanged over the REST surface.

use bridge_registry::{HandlerRegistry, ResourceMetadata, ToolMetadata};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Body of every non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    /// Human readable error message.
    pub error: String,
}

impl ErrorBody {
    /// Wraps a message.
    #[must_use]
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Entry of `GET /api/tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    /// Registered tool name.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// JSON-Schema object describing accepted parameters.
    pub input_schema: Value,
}

impl From<&ToolMetadata> for ToolSummary {
    fn from(metadata: &ToolMetadata) -> Self {
        Self {
            name: metadata.name().to_string(),
            description: metadata.description().map(str::to_owned),
            input_schema: metadata.input_schema(),
        }
    }
}

/// Body of `GET /api/tools`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolListing {
    /// Tools sorted by name.
    pub tools: Vec<ToolSummary>,
}

/// Entry of `GET /api/resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceSummary {
    /// Full `data://` URI.
    pub uri: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl From<&ResourceMetadata> for ResourceSummary {
    fn from(metadata: &ResourceMetadata) -> Self {
        Self {
            uri: metadata.uri().to_string(),
            description: metadata.description().map(str::to_owned),
        }
    }
}

/// Body of `GET /api/resources`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceListing {
    /// Resources sorted by URI.
    pub resources: Vec<ResourceSummary>,
}

impl ToolListing {
    /// Snapshot of the registry's tools.
    #[must_use]
    pub fn from_registry(registry: &HandlerRegistry) -> Self {
        Self {
            tools: registry.tools().into_iter().map(ToolSummary::from).collect(),
        }
    }
}

impl ResourceListing {
    /// Snapshot of the registry's resources.
    #[must_use]
    pub fn from_registry(registry: &HandlerRegistry) -> Self {
        Self {
            resources: registry
                .resources()
                .into_iter()
                .map(ResourceSummary::from)
                .collect(),
        }
    }
}
