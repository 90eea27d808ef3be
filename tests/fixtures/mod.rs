// Copyright (c) 2025 - Cowboy AI, Inc.
//! Test Fixtures for cim-customer
//!
//! Deterministic commands and events shared by the integration tests.
//! All UUIDs and timestamps are fixed constants so tests are reproducible.
#![allow(dead_code)]

use chrono::{DateTime, Utc};
use uuid::Uuid;

use cim_customer::aggregate::commands::*;
use cim_customer::events::*;
use cim_customer::CustomerId;

// Fixed test UUIDs (UUID v7 format, but deterministic for testing)
pub const EVENT_ID_1: &str = "01934f4a-0001-7000-8000-000000000001";
pub const EVENT_ID_2: &str = "01934f4a-0002-7000-8000-000000000002";
pub const EVENT_ID_3: &str = "01934f4a-0003-7000-8000-000000000003";

pub const CORRELATION_ID_1: &str = "01934f4a-c001-7000-8000-00000000c001";

// Fixed test timestamp (2026-01-19T12:00:00Z)
pub const FIXED_TIMESTAMP: &str = "2026-01-19T12:00:00Z";

pub const EMAIL: &str = "t@mail.com";

/// Parse a fixed UUID from a constant string
pub fn parse_uuid(s: &str) -> Uuid {
    Uuid::parse_str(s).expect("Invalid UUID in test fixture")
}

/// Parse the fixed timestamp
pub fn fixed_timestamp() -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(FIXED_TIMESTAMP)
        .expect("Invalid timestamp in test fixture")
        .with_timezone(&Utc)
}

pub fn customer_id(raw: &str) -> CustomerId {
    CustomerId::new(raw).expect("Invalid customer id in test fixture")
}

pub fn register_command(entity: &str, email: &str) -> RegisterCustomerCommand {
    RegisterCustomerCommand {
        entity_id: customer_id(entity),
        name: "Test".to_string(),
        email: email.to_string(),
        password_hash: "x".to_string(),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
    }
}

pub fn create_command(entity: &str, email: &str) -> CreateCustomerCommand {
    CreateCustomerCommand {
        entity_id: customer_id(entity),
        name: "Test".to_string(),
        email: email.to_string(),
        password_hash: "x".to_string(),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: Some(parse_uuid(EVENT_ID_1)),
    }
}

pub fn update_command(entity: &str, name: &str) -> UpdateCustomerCommand {
    UpdateCustomerCommand {
        entity_id: customer_id(entity),
        name: name.to_string(),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
    }
}

pub fn deactivate_command(entity: &str) -> DeactivateCustomerCommand {
    DeactivateCustomerCommand {
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
    }
}

pub fn reactivate_command(entity: &str) -> ReactivateCustomerCommand {
    ReactivateCustomerCommand {
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
    }
}

pub fn registered_event(entity: &str, email: &str) -> CustomerEvent {
    CustomerEvent::CustomerRegistered(CustomerRegistered {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: parse_uuid(EVENT_ID_1),
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
        name: "Test".to_string(),
        email: email.to_string(),
        password_hash: "x".to_string(),
    })
}

pub fn created_event(entity: &str, email: &str) -> CustomerEvent {
    CustomerEvent::CustomerCreated(CustomerCreated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: parse_uuid(EVENT_ID_2),
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: Some(parse_uuid(EVENT_ID_1)),
        name: "Test".to_string(),
        email: email.to_string(),
        password_hash: "x".to_string(),
    })
}

pub fn updated_event(entity: &str, name: &str) -> CustomerEvent {
    CustomerEvent::CustomerUpdated(CustomerUpdated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: parse_uuid(EVENT_ID_3),
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
        name: name.to_string(),
    })
}

pub fn deactivated_event(entity: &str) -> CustomerEvent {
    CustomerEvent::CustomerDeactivated(CustomerDeactivated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: parse_uuid(EVENT_ID_3),
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
    })
}

pub fn reactivated_event(entity: &str) -> CustomerEvent {
    CustomerEvent::CustomerReactivated(CustomerReactivated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: parse_uuid(EVENT_ID_3),
        entity_id: customer_id(entity),
        timestamp: fixed_timestamp(),
        correlation_id: parse_uuid(CORRELATION_ID_1),
        causation_id: None,
    })
}
