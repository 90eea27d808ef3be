// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer list read model
//!
//! One record per created customer in the [`CUSTOMERS`] collection, keyed by
//! entity id. Registered-only customers (for example a registration that lost
//! the email uniqueness check) never get a record, and later events for them
//! touch nothing.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{info, warn};

use super::executor::{SideEffectExecutor, StoreExecutor};
use super::pure::{LogLevel, ProjectionResult, SideEffect};
use super::store::{ProjectionStore, KEY_FIELD};
use super::{ProjectionAdapter, ProjectionError};
use crate::domain::CustomerId;
use crate::event_store::RecordedEvent;
use crate::events::CustomerEvent;

/// Collection holding [`CustomerRecord`]s
pub const CUSTOMERS: &str = "customers";

/// Read-model record of one customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerRecord {
    pub customer_id: CustomerId,
    pub name: String,
    pub email: String,
    pub password_hash: String,

    /// Created and not deactivated, matching the aggregate's flag
    pub active: bool,
}

impl CustomerRecord {
    pub fn from_value(value: Value) -> Result<Self, ProjectionError> {
        Ok(serde_json::from_value(value)?)
    }
}

/// What the projection remembers between events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerListState {
    /// Last projected version per entity
    pub versions: HashMap<CustomerId, u64>,

    /// Entities that have a record
    pub records: HashSet<CustomerId>,

    /// Entities currently deactivated, with or without a record
    pub deactivated: HashSet<CustomerId>,
}

impl CustomerListState {
    pub fn applied_version(&self, entity_id: &CustomerId) -> u64 {
        self.versions.get(entity_id).copied().unwrap_or(0)
    }
}

fn update(entity_id: &CustomerId, changes: Value) -> SideEffect {
    SideEffect::Update {
        collection: CUSTOMERS.to_string(),
        key: entity_id.to_string(),
        changes,
    }
}

fn skipped(entity_id: &CustomerId, event: &CustomerEvent) -> SideEffect {
    SideEffect::Log {
        level: LogLevel::Debug,
        message: format!(
            "{} for {} has no record to update",
            event.event_type_name(),
            entity_id
        ),
    }
}

/// Pure projection of one recorded event onto the customer list
///
/// Redelivered events (version already applied) produce no effects. A version
/// that skips ahead means an event was lost and fails with `OutOfSync`.
pub fn project_customer_event(
    mut state: CustomerListState,
    recorded: &RecordedEvent,
) -> ProjectionResult<CustomerListState> {
    let entity_id = &recorded.entity_id;
    let applied = state.applied_version(entity_id);

    if recorded.version <= applied {
        return Ok((state, Vec::new()));
    }
    if recorded.version != applied + 1 {
        return Err(ProjectionError::OutOfSync(format!(
            "{} jumped from version {} to {}",
            entity_id, applied, recorded.version
        )));
    }

    let has_record = state.records.contains(entity_id);
    let mut effects = Vec::new();

    match &recorded.event {
        CustomerEvent::CustomerRegistered(_) => {}
        CustomerEvent::CustomerCreated(e) => {
            let record = CustomerRecord {
                customer_id: entity_id.clone(),
                name: e.name.clone(),
                email: e.email.clone(),
                password_hash: e.password_hash.clone(),
                active: !state.deactivated.contains(entity_id),
            };
            effects.push(SideEffect::Insert {
                collection: CUSTOMERS.to_string(),
                key: entity_id.to_string(),
                record: serde_json::to_value(record)?,
            });
            state.records.insert(entity_id.clone());
        }
        CustomerEvent::CustomerUpdated(e) => {
            if has_record {
                effects.push(update(entity_id, json!({ "name": e.name })));
            } else {
                effects.push(skipped(entity_id, &recorded.event));
            }
        }
        CustomerEvent::CustomerDeactivated(_) => {
            state.deactivated.insert(entity_id.clone());
            if has_record {
                effects.push(update(entity_id, json!({ "active": false })));
            } else {
                effects.push(skipped(entity_id, &recorded.event));
            }
        }
        CustomerEvent::CustomerReactivated(_) => {
            state.deactivated.remove(entity_id);
            if has_record {
                effects.push(update(entity_id, json!({ "active": true })));
            } else {
                effects.push(skipped(entity_id, &recorded.event));
            }
        }
    }

    state.versions.insert(entity_id.clone(), recorded.version);
    Ok((state, effects))
}

/// Maintains the customer list in a [`ProjectionStore`]
pub struct CustomerListProjection {
    state: CustomerListState,
    executor: StoreExecutor,
}

impl CustomerListProjection {
    pub fn new(store: Arc<dyn ProjectionStore>) -> Self {
        Self {
            state: CustomerListState::default(),
            executor: StoreExecutor::new(store),
        }
    }

    pub fn state(&self) -> &CustomerListState {
        &self.state
    }
}

#[async_trait]
impl ProjectionAdapter for CustomerListProjection {
    type Event = RecordedEvent;
    type Error = ProjectionError;

    async fn project(&mut self, event: RecordedEvent) -> Result<(), ProjectionError> {
        let (state, effects) = project_customer_event(self.state.clone(), &event)?;
        self.executor.execute(effects).await?;
        self.state = state;
        Ok(())
    }

    async fn initialize(&mut self) -> Result<(), ProjectionError> {
        let existing = self.executor.store().list(CUSTOMERS).await?.len();
        if existing > 0 && self.state.records.is_empty() {
            warn!(
                projection = self.name(),
                records = existing,
                "Read model already holds records; replay will collide"
            );
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ProjectionError> {
        self.executor.store().list(CUSTOMERS).await.map(|_| ())
    }

    async fn reset(&mut self) -> Result<(), ProjectionError> {
        let store = self.executor.store();
        let records = store.list(CUSTOMERS).await?;
        for record in &records {
            if let Some(key) = record.get(KEY_FIELD).and_then(Value::as_str) {
                store.remove(CUSTOMERS, key).await?;
            }
        }
        self.state = CustomerListState::default();

        info!(projection = self.name(), removed = records.len(), "Read model reset");
        Ok(())
    }

    fn name(&self) -> &str {
        "customer-list"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::{
        CustomerCreated, CustomerDeactivated, CustomerReactivated, CustomerRegistered,
        CustomerUpdated, EVENT_SCHEMA_VERSION,
    };
    use crate::projection::pure::fold_projection;
    use crate::projection::store::MemoryProjectionStore;
    use chrono::Utc;
    use pretty_assertions::assert_eq;
    use uuid::Uuid;

    fn id(raw: &str) -> CustomerId {
        CustomerId::new(raw).unwrap()
    }

    fn recorded(entity: &str, version: u64, event: CustomerEvent) -> RecordedEvent {
        RecordedEvent {
            entity_id: id(entity),
            version,
            position: version,
            recorded_at: Utc::now(),
            event,
        }
    }

    fn registered(entity: &str) -> CustomerEvent {
        CustomerEvent::CustomerRegistered(CustomerRegistered {
            event_version: EVENT_SCHEMA_VERSION,
            event_id: Uuid::now_v7(),
            entity_id: id(entity),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
            name: "Test".into(),
            email: "t@mail.com".into(),
            password_hash: "x".into(),
        })
    }

    fn created(entity: &str) -> CustomerEvent {
        CustomerEvent::CustomerCreated(CustomerCreated {
            event_version: EVENT_SCHEMA_VERSION,
            event_id: Uuid::now_v7(),
            entity_id: id(entity),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
            name: "Test".into(),
            email: "t@mail.com".into(),
            password_hash: "x".into(),
        })
    }

    fn updated(entity: &str, name: &str) -> CustomerEvent {
        CustomerEvent::CustomerUpdated(CustomerUpdated {
            event_version: EVENT_SCHEMA_VERSION,
            event_id: Uuid::now_v7(),
            entity_id: id(entity),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
            name: name.into(),
        })
    }

    fn deactivated(entity: &str) -> CustomerEvent {
        CustomerEvent::CustomerDeactivated(CustomerDeactivated {
            event_version: EVENT_SCHEMA_VERSION,
            event_id: Uuid::now_v7(),
            entity_id: id(entity),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
        })
    }

    fn reactivated(entity: &str) -> CustomerEvent {
        CustomerEvent::CustomerReactivated(CustomerReactivated {
            event_version: EVENT_SCHEMA_VERSION,
            event_id: Uuid::now_v7(),
            entity_id: id(entity),
            timestamp: Utc::now(),
            correlation_id: Uuid::now_v7(),
            causation_id: None,
        })
    }

    #[test]
    fn test_registered_only_produces_nothing() {
        let (state, effects) = fold_projection(
            project_customer_event,
            CustomerListState::default(),
            &[
                recorded("C1", 1, registered("C1")),
                recorded("C1", 2, updated("C1", "Other")),
            ],
        )
        .unwrap();

        assert!(state.records.is_empty());
        assert_eq!(state.applied_version(&id("C1")), 2);
        assert!(effects
            .iter()
            .all(|effect| matches!(effect, SideEffect::Log { .. })));
    }

    #[test]
    fn test_redelivery_is_skipped() {
        let first = recorded("C1", 1, registered("C1"));
        let second = recorded("C1", 2, created("C1"));

        let (state, effects) = fold_projection(
            project_customer_event,
            CustomerListState::default(),
            &[first.clone(), second.clone(), second, first],
        )
        .unwrap();

        assert_eq!(state.applied_version(&id("C1")), 2);
        assert_eq!(effects.len(), 1);
    }

    #[test]
    fn test_version_gap_is_out_of_sync() {
        let result = fold_projection(
            project_customer_event,
            CustomerListState::default(),
            &[
                recorded("C1", 1, registered("C1")),
                recorded("C1", 3, updated("C1", "Late")),
            ],
        );

        assert!(matches!(result, Err(ProjectionError::OutOfSync(_))));
    }

    #[test]
    fn test_created_after_deactivation_is_inactive() {
        let (_, effects) = fold_projection(
            project_customer_event,
            CustomerListState::default(),
            &[
                recorded("C1", 1, registered("C1")),
                recorded("C1", 2, deactivated("C1")),
                recorded("C1", 3, created("C1")),
            ],
        )
        .unwrap();

        match effects.last() {
            Some(SideEffect::Insert { record, .. }) => assert_eq!(record["active"], json!(false)),
            other => panic!("expected insert, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_lifecycle_against_store() {
        let store = Arc::new(MemoryProjectionStore::new());
        let mut projection = CustomerListProjection::new(store.clone());
        projection.initialize().await.unwrap();

        for event in [
            recorded("C1", 1, registered("C1")),
            recorded("C1", 2, created("C1")),
            recorded("C1", 3, updated("C1", "Renamed")),
            recorded("C1", 4, deactivated("C1")),
        ] {
            projection.project(event).await.unwrap();
        }

        let record = CustomerRecord::from_value(store.get(CUSTOMERS, "C1").await.unwrap().unwrap())
            .unwrap();
        assert_eq!(
            record,
            CustomerRecord {
                customer_id: id("C1"),
                name: "Renamed".into(),
                email: "t@mail.com".into(),
                password_hash: "x".into(),
                active: false,
            }
        );

        projection.project(recorded("C1", 5, reactivated("C1"))).await.unwrap();
        let value = store.get(CUSTOMERS, "C1").await.unwrap().unwrap();
        assert_eq!(value["active"], json!(true));
    }

    #[tokio::test]
    async fn test_failed_store_keeps_state() {
        let store = Arc::new(MemoryProjectionStore::new());
        store.insert(CUSTOMERS, "C1", json!({})).await.unwrap();

        let mut projection = CustomerListProjection::new(store);
        projection.project(recorded("C1", 1, registered("C1"))).await.unwrap();

        let result = projection.project(recorded("C1", 2, created("C1"))).await;
        assert!(matches!(result, Err(ProjectionError::DuplicateKey { .. })));
        assert_eq!(projection.state().applied_version(&id("C1")), 1);
    }

    #[tokio::test]
    async fn test_reset_clears_read_model() {
        let store = Arc::new(MemoryProjectionStore::new());
        let mut projection = CustomerListProjection::new(store.clone());
        projection.project(recorded("C1", 1, registered("C1"))).await.unwrap();
        projection.project(recorded("C1", 2, created("C1"))).await.unwrap();

        projection.reset().await.unwrap();

        assert!(store.list(CUSTOMERS).await.unwrap().is_empty());
        assert_eq!(projection.state(), &CustomerListState::default());
        projection.health_check().await.unwrap();
    }
}
