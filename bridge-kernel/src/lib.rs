//! Request dispatch and HTTP hosting for registered tools and resources.
//!
//! [`Dispatcher`] turns a name plus an untyped parameter bag into exactly one
//! [`Outcome`]. [`WireBridge`] maps HTTP requests onto the dispatcher and
//! outcomes back onto status codes, and [`BridgeServer`] hosts the bridge on a
//! hyper listener.

#![warn(missing_docs, clippy::pedantic)]

pub mod dispatch;
pub mod payload;
pub mod rpc;
mod server;
pub mod wire;

pub use dispatch::{Dispatcher, Failure, FailureKind, Outcome};
pub use payload::{ErrorBody, ResourceListing, ResourceSummary, ToolListing, ToolSummary};
pub use server::{BridgeServer, ServerError, ServerHandle};
pub use wire::{REQUEST_ID_HEADER, WireBridge, status_for};
