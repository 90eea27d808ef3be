// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer Domain Events
//!
//! Events are immutable facts representing state changes that have occurred.
//!
//! # Event Sourcing Principles
//!
//! 1. **Events are immutable**: Once created, events never change
//! 2. **Events are past tense**: Named for what happened (Registered, not Register)
//! 3. **Events include metadata**: correlation_id, causation_id, timestamp
//! 4. **Events are versioned**: event_version field for schema evolution
//!
//! # Event Flow
//!
//! ```text
//! Command → Aggregate → Event → EventStore → Projector / Saga
//! ```
//!
//! # Correlation and Causation
//!
//! ```text
//! RegisterCustomer        correlation_id: req-123
//!   ↓
//! CustomerRegistered      correlation_id: req-123, causation_id: None, event_id: evt-1
//!   ↓ (saga)
//! CustomerCreated         correlation_id: req-123, causation_id: evt-1
//! ```
//!
//! # Module Organization
//!
//! - [`customer`] - the five customer stream events
//! - [`domain_error`] - saga outcomes published on the error channel

pub mod customer;
pub mod domain_error;

pub use customer::{
    CustomerCreated, CustomerDeactivated, CustomerEvent, CustomerReactivated, CustomerRegistered,
    CustomerUpdated, EVENT_SCHEMA_VERSION,
};
pub use domain_error::{CustomerCreateRejected, CustomerExistingEmailFound, DomainErrorEvent};

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::errors::{CustomerError, CustomerResult};

/// The `kind` tag of `value`, if it is one of `known`
pub(crate) fn known_kind<'a>(value: &'a Value, known: &[&str]) -> CustomerResult<&'a str> {
    let kind = value
        .get("kind")
        .and_then(Value::as_str)
        .ok_or_else(|| CustomerError::Serialization("missing \"kind\" tag".to_string()))?;

    if !known.contains(&kind) {
        return Err(CustomerError::UnrecognizedKind(kind.to_string()));
    }
    Ok(kind)
}

/// Decode a `kind`-tagged JSON object, rejecting kinds outside `known`
pub(crate) fn decode_tagged<T: DeserializeOwned>(value: &Value, known: &[&str]) -> CustomerResult<T> {
    known_kind(value, known)?;
    Ok(serde_json::from_value(value.clone())?)
}
