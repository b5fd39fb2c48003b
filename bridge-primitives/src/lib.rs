//! Core shared types for the toolbridge dispatch runtime.

#![warn(missing_docs, clippy::pedantic)]

mod error;
mod ids;
mod names;

/// Error type and result alias shared across the workspace.
pub use error::{Error, Result};
/// Identifier attached to each inbound request for log correlation.
pub use ids::RequestId;
/// Validated tool names and resource URIs.
pub use names::{RESOURCE_SCHEME, ResourceUri, ToolName};
