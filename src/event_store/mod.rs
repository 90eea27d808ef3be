// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event Store Abstraction
//!
//! The append-only, per-entity event log with optimistic concurrency.
//!
//! # Architecture
//!
//! ```text
//! Command → Aggregate → Events → EventStore ──notify──> Projector, Saga
//! ```
//!
//! # Event Store Requirements
//!
//! 1. **Append-Only**: Events are never updated or deleted
//! 2. **Ordered**: Versions within a stream are exactly 1..=n with no gaps
//! 3. **Atomic**: A batch is appended in full or not at all
//! 4. **Optimistic**: An append names the version it was decided against
//! 5. **Replay**: Streams and the global log can be read back in order
//!
//! Every stored event also carries a global `position`, a dense 1-based
//! sequence over the whole log. Positions order events across entities and let
//! readers say "everything up to position N".

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::CustomerId;
use crate::errors::CustomerResult;
use crate::events::CustomerEvent;

pub mod memory;

pub use memory::InMemoryEventStore;

/// The expected version did not match the stream's last committed version
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Expected version was {expected} but last committed version was {actual} for {entity_id}")]
pub struct ConcurrencyConflict {
    pub entity_id: CustomerId,
    pub expected: u64,
    pub actual: u64,
}

/// Persisted envelope of one event
///
/// `payload` is the tagged JSON form of the event. It is decoded lazily, so a
/// log written by a newer build stays loadable and an unknown kind is only
/// reported when the event is read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredEvent {
    pub entity_id: CustomerId,
    pub version: u64,
    pub position: u64,
    pub recorded_at: DateTime<Utc>,
    pub kind: String,
    pub payload: serde_json::Value,
}

impl StoredEvent {
    pub fn decode(&self) -> CustomerResult<RecordedEvent> {
        Ok(RecordedEvent {
            entity_id: self.entity_id.clone(),
            version: self.version,
            position: self.position,
            recorded_at: self.recorded_at,
            event: CustomerEvent::from_json(&self.payload)?,
        })
    }
}

/// A decoded event together with where it sits in the log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedEvent {
    pub entity_id: CustomerId,

    /// 1-based version within the entity's stream
    pub version: u64,

    /// 1-based position within the whole log
    pub position: u64,

    pub recorded_at: DateTime<Utc>,
    pub event: CustomerEvent,
}

/// Result of a successful append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Appended {
    /// Stream version after the append
    pub version: u64,

    /// Global position of the last event in the stream after the append
    pub last_position: u64,
}

/// Event Store trait for persisting and retrieving customer events
#[async_trait]
pub trait EventStore: Send + Sync {
    /// All events of one entity in version order; empty for an unknown entity
    async fn read_events(&self, entity_id: &CustomerId) -> CustomerResult<Vec<RecordedEvent>>;

    /// Events of one entity with `version >= from_version`
    async fn read_events_from(
        &self,
        entity_id: &CustomerId,
        from_version: u64,
    ) -> CustomerResult<Vec<RecordedEvent>>;

    /// Last committed version of the stream, 0 if it has no events
    async fn current_version(&self, entity_id: &CustomerId) -> CustomerResult<u64>;

    /// Append `events` to the stream
    ///
    /// Succeeds only when the stream's last committed version equals
    /// `expected_version`; the events then receive versions
    /// `expected_version + 1 ..= expected_version + events.len()` and every
    /// subscriber of the notification channel is told about each one, in order.
    ///
    /// # Errors
    ///
    /// - `Concurrency` if the stream moved on; nothing is appended
    /// - `StreamMismatch` if an event belongs to another entity; nothing is appended
    async fn store_events(
        &self,
        entity_id: &CustomerId,
        events: Vec<CustomerEvent>,
        expected_version: u64,
    ) -> CustomerResult<Appended>;

    /// The whole log in global position order
    async fn read_all(&self) -> CustomerResult<Vec<RecordedEvent>>;

    /// Every event sharing a correlation id, in global position order
    async fn read_by_correlation(&self, correlation_id: Uuid) -> CustomerResult<Vec<RecordedEvent>> {
        Ok(self
            .read_all()
            .await?
            .into_iter()
            .filter(|recorded| recorded.event.correlation_id() == correlation_id)
            .collect())
    }
}
