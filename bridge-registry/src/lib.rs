//! Tool and resource registration for the dispatch runtime.
//!
//! Handlers are registered explicitly at startup against a [`HandlerRegistry`];
//! each tool carries an ordered parameter specification that the dispatcher
//! checks with [`params::validate`] before any handler runs.

#![warn(missing_docs, clippy::pedantic)]

pub mod params;
pub mod registry;

pub use params::{ParamError, ParamKind, ParamSpec, ParameterBag};
pub use registry::{
    HandlerRegistry, Resource, ResourceContent, ResourceDescriptor, ResourceMetadata, Tool,
    ToolDescriptor, ToolError, ToolMetadata, ToolResult,
};
