// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer Domain Events
//!
//! Every state change of a customer is one of five immutable facts. On the wire
//! each event is a JSON object tagged by `kind`:
//!
//! ```json
//! { "kind": "CUSTOMER_REGISTERED", "entityId": "C1", "name": "Test",
//!   "email": "test@test.com", "passwordHash": "...", ... }
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::CustomerId;
use crate::errors::CustomerResult;

/// Schema version written into every new customer event
pub const EVENT_SCHEMA_VERSION: u32 = 1;

/// Customer Domain Events
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerEvent {
    /// A customer registration was accepted
    CustomerRegistered(CustomerRegistered),

    /// The customer was created after the uniqueness check
    CustomerCreated(CustomerCreated),

    /// The customer's name changed
    CustomerUpdated(CustomerUpdated),

    /// The customer was deactivated
    CustomerDeactivated(CustomerDeactivated),

    /// The customer was reactivated
    CustomerReactivated(CustomerReactivated),
}

/// Customer registration was accepted
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRegistered {
    /// Event version for schema evolution
    pub event_version: u32,

    /// Unique event identifier (UUID v7 for time ordering)
    pub event_id: Uuid,

    /// Customer the event belongs to
    pub entity_id: CustomerId,

    /// When this event occurred
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for request tracing
    pub correlation_id: Uuid,

    /// Causation ID (event that caused this event)
    pub causation_id: Option<Uuid>,

    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Customer was created and becomes active
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreated {
    pub event_version: u32,
    pub event_id: Uuid,
    pub entity_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,

    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// Customer name was changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerUpdated {
    pub event_version: u32,
    pub event_id: Uuid,
    pub entity_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,

    pub name: String,
}

/// Customer was deactivated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDeactivated {
    pub event_version: u32,
    pub event_id: Uuid,
    pub entity_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

/// Customer was reactivated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerReactivated {
    pub event_version: u32,
    pub event_id: Uuid,
    pub entity_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
}

macro_rules! on_every_event {
    ($event:expr, $inner:ident => $body:expr) => {
        match $event {
            CustomerEvent::CustomerRegistered($inner) => $body,
            CustomerEvent::CustomerCreated($inner) => $body,
            CustomerEvent::CustomerUpdated($inner) => $body,
            CustomerEvent::CustomerDeactivated($inner) => $body,
            CustomerEvent::CustomerReactivated($inner) => $body,
        }
    };
}

impl CustomerEvent {
    /// Every `kind` tag this build understands
    pub const KINDS: [&'static str; 5] = [
        "CUSTOMER_REGISTERED",
        "CUSTOMER_CREATED",
        "CUSTOMER_UPDATED",
        "CUSTOMER_DEACTIVATED",
        "CUSTOMER_REACTIVATED",
    ];

    /// Entity (stream) this event belongs to
    pub fn entity_id(&self) -> &CustomerId {
        on_every_event!(self, e => &e.entity_id)
    }

    pub fn event_id(&self) -> Uuid {
        on_every_event!(self, e => e.event_id)
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        on_every_event!(self, e => e.timestamp)
    }

    pub fn correlation_id(&self) -> Uuid {
        on_every_event!(self, e => e.correlation_id)
    }

    pub fn causation_id(&self) -> Option<Uuid> {
        on_every_event!(self, e => e.causation_id)
    }

    pub fn event_version(&self) -> u32 {
        on_every_event!(self, e => e.event_version)
    }

    /// Wire `kind` tag of this event
    pub fn event_type_name(&self) -> &'static str {
        match self {
            CustomerEvent::CustomerRegistered(_) => Self::KINDS[0],
            CustomerEvent::CustomerCreated(_) => Self::KINDS[1],
            CustomerEvent::CustomerUpdated(_) => Self::KINDS[2],
            CustomerEvent::CustomerDeactivated(_) => Self::KINDS[3],
            CustomerEvent::CustomerReactivated(_) => Self::KINDS[4],
        }
    }

    /// Decode an event from its tagged JSON form
    ///
    /// An unknown `kind` is reported as
    /// [`CustomerError::UnrecognizedKind`](crate::errors::CustomerError::UnrecognizedKind).
    pub fn from_json(value: &serde_json::Value) -> CustomerResult<Self> {
        super::decode_tagged(value, &Self::KINDS)
    }
}
