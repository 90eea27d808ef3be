// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error-channel events
//!
//! Outcomes of the registration saga that are not facts about a customer
//! stream. They are published on the error channel of the
//! [`EventBus`](crate::bus::EventBus) and never stored in the event log.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::CustomerId;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DomainErrorEvent {
    /// Another customer already owns the registered email
    CustomerExistingEmailFound(CustomerExistingEmailFound),

    /// The saga could not complete the registration
    CustomerCreateRejected(CustomerCreateRejected),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerExistingEmailFound {
    pub event_id: Uuid,
    pub entity_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,

    /// The registration event that triggered the check
    pub causation_id: Option<Uuid>,

    pub email: String,

    /// Customer whose record already carries the email
    pub existing_entity_id: CustomerId,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerCreateRejected {
    pub event_id: Uuid,
    pub entity_id: CustomerId,
    pub timestamp: DateTime<Utc>,
    pub correlation_id: Uuid,
    pub causation_id: Option<Uuid>,
    pub reason: String,
}

impl DomainErrorEvent {
    pub fn entity_id(&self) -> &CustomerId {
        match self {
            DomainErrorEvent::CustomerExistingEmailFound(e) => &e.entity_id,
            DomainErrorEvent::CustomerCreateRejected(e) => &e.entity_id,
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        match self {
            DomainErrorEvent::CustomerExistingEmailFound(e) => e.correlation_id,
            DomainErrorEvent::CustomerCreateRejected(e) => e.correlation_id,
        }
    }

    pub fn event_type_name(&self) -> &'static str {
        match self {
            DomainErrorEvent::CustomerExistingEmailFound(_) => "CUSTOMER_EXISTING_EMAIL_FOUND",
            DomainErrorEvent::CustomerCreateRejected(_) => "CUSTOMER_CREATE_REJECTED",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_email_found_wire_shape() {
        let event = DomainErrorEvent::CustomerExistingEmailFound(CustomerExistingEmailFound {
            event_id: Uuid::now_v7(),
            entity_id: CustomerId::new("C2").unwrap(),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
            email: "test@test.com".to_string(),
            existing_entity_id: CustomerId::new("C1").unwrap(),
        });

        let value = serde_json::to_value(&event).unwrap();
        assert_eq!(value["kind"], json!(event.event_type_name()));
        assert_eq!(value["entityId"], json!("C2"));
        assert_eq!(value["existingEntityId"], json!("C1"));
        assert_eq!(event.entity_id().as_str(), "C2");
    }
}
