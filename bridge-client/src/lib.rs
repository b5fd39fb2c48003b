//! Client for toolbridge servers.
//!
//! [`BridgeClient`] wraps a pooled hyper client, encodes calls as REST
//! requests and raises every failure as one [`ClientError`].

#![warn(missing_docs, clippy::pedantic)]

mod client;
mod error;
mod http_client;

pub use client::BridgeClient;
pub use error::{ClientError, ClientResult, TransportError};
