//! Business data consumed by the sample tools and resources.
//!
//! [`DataStore`] owns users, tasks and application settings behind a single
//! lock; [`catalog`] registers the tools and resources that read it.

#![warn(missing_docs, clippy::pedantic)]

pub mod catalog;
mod error;
mod numeric;
mod record;
mod store;

pub use catalog::{register_catalog, sample_registry};
pub use error::{StoreError, StoreResult};
pub use record::{AppSettings, Summary, Task, TaskStatus, User};
pub use store::{DataStore, StoreSeed};
