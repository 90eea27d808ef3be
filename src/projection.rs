// Copyright (c) 2025 - Cowboy AI, Inc.

//! Projection Adapter - Functor F: Events → ReadModel
//!
//! This module turns the event log into queryable read models.
//!
//! # Category Theory Foundation
//!
//! A projection is a **Functor** F: EventStream → ReadModelState where:
//!
//! - **Identity**: F(id) = id. An empty event stream changes nothing
//! - **Composition**: F(g ∘ f) = F(g) ∘ F(f). Projecting events one by one
//!   equals projecting the sequence
//!
//! # Architecture
//!
//! ```text
//! EventStore ──notify──> Projector ──> ProjectionAdapter ──> ProjectionStore
//!     │                     │                 │
//!     │ read_all (catch-up) │ watermark       │ pure projection + executor
//!     ▼                     ▼                 ▼
//! [e1, e2, e3]       "caught up to N"   Insert / Update effects
//! ```
//!
//! # Modules
//!
//! - [`store`] - keyed record collections ([`ProjectionStore`](store::ProjectionStore))
//! - [`pure`] - pure projection functions returning side effects as data
//! - [`executor`] - executors that perform those effects
//! - [`customer_list`] - the customer list read model
//! - [`projector`] - catch-up and live delivery, with the watermark signal

pub mod customer_list;
pub mod executor;
pub mod projector;
pub mod pure;
pub mod store;

pub use customer_list::{CustomerListProjection, CustomerRecord, CUSTOMERS};
pub use projector::{start_projector, ProjectionWatermark, ProjectorHandle};
pub use store::{MemoryProjectionStore, ProjectionStore};

use async_trait::async_trait;

/// Projection Adapter trait - The Functor
///
/// Implementations must preserve:
/// - **Event order**: Events of one entity are applied in version order
/// - **Idempotency**: Re-applying an already projected event changes nothing
/// - **Consistency**: The read model reflects the event history
#[async_trait]
pub trait ProjectionAdapter: Send + Sync {
    /// The event type this projection handles
    type Event: Send + Sync;

    /// Error type for projection operations
    type Error: std::error::Error + Send + Sync;

    /// Project an event into the read model
    async fn project(&mut self, event: Self::Event) -> Result<(), Self::Error>;

    /// Prepare the read model; safe to call more than once
    async fn initialize(&mut self) -> Result<(), Self::Error>;

    /// Verify the read model is usable
    async fn health_check(&self) -> Result<(), Self::Error>;

    /// Clear all projected state so the projection can be rebuilt
    ///
    /// WARNING: This is destructive!
    async fn reset(&mut self) -> Result<(), Self::Error>;

    /// Get the name of this projection adapter
    fn name(&self) -> &str;
}

/// Errors that can occur during projection
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProjectionError {
    /// Insert of a key that already exists
    #[error("Record {collection}/{key} already exists")]
    DuplicateKey { collection: String, key: String },

    /// Update or removal of a key that does not exist
    #[error("Record {collection}/{key} does not exist")]
    MissingKey { collection: String, key: String },

    /// Records must be JSON objects
    #[error("Invalid record: {0}")]
    InvalidRecord(String),

    /// The read model no longer matches the event log
    #[error("Projection out of sync with the event log: {0}")]
    OutOfSync(String),

    /// The projector is no longer running
    #[error("Projector stopped: {0}")]
    Stopped(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for ProjectionError {
    fn from(err: serde_json::Error) -> Self {
        ProjectionError::Serialization(err.to_string())
    }
}
