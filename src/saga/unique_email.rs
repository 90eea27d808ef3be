// Copyright (c) 2025 - Cowboy AI, Inc.
//! Email uniqueness saga
//!
//! No single customer aggregate can know whether its email is taken, so the
//! check runs here, after registration, against the customer list read model.
//!
//! The read model lags the log. Under [`ConsistencyPolicy::AwaitProjection`]
//! the saga waits for the projector watermark to pass the registration before
//! looking, and after a successful create waits for the created event too, so
//! the next registration sees it. [`ConsistencyPolicy::FixedDelay`] only
//! sleeps and can miss a customer created moments earlier.

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::aggregate::commands::{CreateCustomerCommand, CustomerCommand};
use crate::aggregate::handlers::CommandError;
use crate::bus::{EventBus, MessageHandler, MessageProcessor};
use crate::config::{ConsistencyPolicy, SagaConfig};
use crate::errors::{CustomerError, CustomerResult};
use crate::event_store::RecordedEvent;
use crate::events::{
    CustomerCreateRejected, CustomerEvent, CustomerExistingEmailFound, CustomerRegistered,
    DomainErrorEvent,
};
use crate::projection::{CustomerRecord, ProjectionStore, ProjectionWatermark, CUSTOMERS};
use crate::router::CommandRouter;

pub struct UniqueEmailSaga {
    router: Arc<CommandRouter>,
    records: Arc<dyn ProjectionStore>,
    bus: EventBus,
    watermark: ProjectionWatermark,
    config: SagaConfig,
}

impl UniqueEmailSaga {
    pub fn new(
        router: Arc<CommandRouter>,
        records: Arc<dyn ProjectionStore>,
        bus: EventBus,
        watermark: ProjectionWatermark,
        config: SagaConfig,
    ) -> Self {
        Self {
            router,
            records,
            bus,
            watermark,
            config,
        }
    }

    /// Handle notifications one at a time on a background task
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        let subscription = self.bus.notifications().subscribe();
        MessageProcessor::run_handler(subscription, self)
    }

    /// Make the read model reflect at least `position` before it is queried
    async fn settle(&self, position: u64) -> CustomerResult<()> {
        match self.config.consistency {
            ConsistencyPolicy::AwaitProjection { timeout_ms } => {
                self.watermark
                    .wait_for(position, Duration::from_millis(timeout_ms))
                    .await
            }
            ConsistencyPolicy::FixedDelay { delay_ms } => {
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                Ok(())
            }
        }
    }

    /// Customers whose record already carries `email`
    async fn owners_of(&self, email: &str) -> CustomerResult<Vec<CustomerRecord>> {
        self.records
            .find(CUSTOMERS, "email", &Value::String(email.to_string()))
            .await?
            .into_iter()
            .map(|record| CustomerRecord::from_value(record).map_err(CustomerError::from))
            .collect()
    }

    fn reject(&self, registered: &CustomerRegistered, reason: String) {
        warn!(entity_id = %registered.entity_id, reason = %reason, "Customer create rejected");
        self.bus
            .publish_error(DomainErrorEvent::CustomerCreateRejected(CustomerCreateRejected {
                event_id: Uuid::now_v7(),
                entity_id: registered.entity_id.clone(),
                timestamp: Utc::now(),
                correlation_id: registered.correlation_id,
                causation_id: Some(registered.event_id),
                reason,
            }));
    }

    #[instrument(skip(self, registered), fields(entity_id = %registered.entity_id))]
    async fn on_registered(&self, registered: &CustomerRegistered, position: u64) {
        if let Err(e) = self.settle(position).await {
            self.reject(registered, format!("email uniqueness could not be verified: {e}"));
            return;
        }

        let owners = match self.owners_of(&registered.email).await {
            Ok(owners) => owners,
            Err(e) => {
                self.reject(registered, format!("email uniqueness could not be verified: {e}"));
                return;
            }
        };

        if owners
            .iter()
            .any(|owner| owner.customer_id == registered.entity_id)
        {
            debug!("Customer already created, redelivered registration ignored");
            return;
        }

        if let Some(existing) = owners.into_iter().next() {
            info!(existing = %existing.customer_id, "Email already taken");
            self.bus
                .publish_error(DomainErrorEvent::CustomerExistingEmailFound(
                    CustomerExistingEmailFound {
                        event_id: Uuid::now_v7(),
                        entity_id: registered.entity_id.clone(),
                        timestamp: Utc::now(),
                        correlation_id: registered.correlation_id,
                        causation_id: Some(registered.event_id),
                        email: registered.email.clone(),
                        existing_entity_id: existing.customer_id,
                    },
                ));
            return;
        }

        let create = CustomerCommand::CreateCustomer(CreateCustomerCommand {
            entity_id: registered.entity_id.clone(),
            name: registered.name.clone(),
            email: registered.email.clone(),
            password_hash: registered.password_hash.clone(),
            timestamp: Utc::now(),
            correlation_id: registered.correlation_id,
            causation_id: Some(registered.event_id),
        });

        match self.router.dispatch(create).await {
            Ok(outcome) => {
                debug!(version = outcome.version, "Customer create dispatched");
                // The next registration must see this customer in the read model.
                if let ConsistencyPolicy::AwaitProjection { .. } = self.config.consistency {
                    if let Err(e) = self.settle(outcome.last_position).await {
                        warn!(error = %e, "Created customer not yet visible in read model");
                    }
                }
            }
            Err(CustomerError::Command(CommandError::AlreadyCreated)) => {
                debug!("Customer already created");
            }
            Err(e) => self.reject(registered, e.to_string()),
        }
    }
}

#[async_trait]
impl MessageHandler<RecordedEvent> for UniqueEmailSaga {
    async fn handle(&self, recorded: RecordedEvent) -> CustomerResult<()> {
        if let CustomerEvent::CustomerRegistered(registered) = &recorded.event {
            self.on_registered(registered, recorded.position).await;
        }
        Ok(())
    }

    fn name(&self) -> &str {
        "unique-email-saga"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::commands::RegisterCustomerCommand;
    use crate::bus::Subscription;
    use crate::domain::CustomerId;
    use crate::event_store::{EventStore, InMemoryEventStore};
    use crate::projection::{
        start_projector, CustomerListProjection, MemoryProjectionStore, ProjectorHandle,
    };
    use crate::service::CustomerCommandHandler;

    struct Harness {
        store: Arc<InMemoryEventStore>,
        router: Arc<CommandRouter>,
        records: Arc<MemoryProjectionStore>,
        bus: EventBus,
        projector: ProjectorHandle,
    }

    async fn harness() -> Harness {
        let bus = EventBus::new();
        let store = Arc::new(InMemoryEventStore::new(bus.notifications().clone()));
        let router = Arc::new(CommandRouter::new());
        Arc::new(CustomerCommandHandler::new(store.clone()))
            .register_all(&router)
            .unwrap();

        let records = Arc::new(MemoryProjectionStore::new());
        let projector = start_projector(
            CustomerListProjection::new(records.clone()),
            store.clone(),
            bus.notifications(),
        )
        .await
        .unwrap();

        Harness {
            store,
            router,
            records,
            bus,
            projector,
        }
    }

    impl Harness {
        fn saga(&self, consistency: ConsistencyPolicy) -> UniqueEmailSaga {
            UniqueEmailSaga::new(
                self.router.clone(),
                self.records.clone(),
                self.bus.clone(),
                self.projector.watermark(),
                SagaConfig { consistency },
            )
        }

        async fn register(&self, entity: &str, email: &str) -> RecordedEvent {
            let command = CustomerCommand::RegisterCustomer(RegisterCustomerCommand {
                entity_id: CustomerId::new(entity).unwrap(),
                name: "Test".into(),
                email: email.into(),
                password_hash: "x".into(),
                timestamp: Utc::now(),
                correlation_id: Uuid::now_v7(),
            });
            let outcome = self.router.dispatch(command).await.unwrap();
            self.store
                .read_events(&outcome.entity_id)
                .await
                .unwrap()
                .pop()
                .unwrap()
        }
    }

    fn await_projection() -> ConsistencyPolicy {
        ConsistencyPolicy::AwaitProjection { timeout_ms: 1_000 }
    }

    fn next_error(errors: &mut Subscription<DomainErrorEvent>) -> Option<DomainErrorEvent> {
        errors.try_recv()
    }

    #[tokio::test]
    async fn test_unique_email_creates_customer() {
        let h = harness().await;
        let saga = h.saga(await_projection());

        let registered = h.register("C1", "t@mail.com").await;
        saga.handle(registered.clone()).await.unwrap();

        let created = h.store.read_events(&registered.entity_id).await.unwrap();
        assert_eq!(created.len(), 2);
        assert_eq!(created[1].event.causation_id(), Some(registered.event.event_id()));
        assert_eq!(created[1].event.correlation_id(), registered.event.correlation_id());
        assert!(h.records.get(CUSTOMERS, "C1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_duplicate_email_publishes_error() {
        let h = harness().await;
        let saga = h.saga(await_projection());
        let mut errors = h.bus.errors().subscribe();

        let first = h.register("C1", "t@mail.com").await;
        saga.handle(first).await.unwrap();
        let second = h.register("C2", "t@mail.com").await;
        saga.handle(second).await.unwrap();

        match next_error(&mut errors) {
            Some(DomainErrorEvent::CustomerExistingEmailFound(found)) => {
                assert_eq!(found.entity_id.as_str(), "C2");
                assert_eq!(found.existing_entity_id.as_str(), "C1");
            }
            other => panic!("expected existing email, got {:?}", other),
        }
        assert!(h.records.get(CUSTOMERS, "C2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_redelivered_registration_is_ignored() {
        let h = harness().await;
        let saga = h.saga(await_projection());
        let mut errors = h.bus.errors().subscribe();

        let registered = h.register("C1", "t@mail.com").await;
        saga.handle(registered.clone()).await.unwrap();
        saga.handle(registered.clone()).await.unwrap();

        assert_eq!(h.store.current_version(&registered.entity_id).await.unwrap(), 2);
        assert!(next_error(&mut errors).is_none());
    }

    #[tokio::test]
    async fn test_unverifiable_email_rejects_create() {
        let h = harness().await;
        let saga = h.saga(ConsistencyPolicy::AwaitProjection { timeout_ms: 10 });
        let mut errors = h.bus.errors().subscribe();

        let mut registered = h.register("C1", "t@mail.com").await;
        h.projector.stop().await.unwrap();

        // A position the stopped projector never reaches
        registered.position += 100;
        saga.handle(registered.clone()).await.unwrap();

        match next_error(&mut errors) {
            Some(DomainErrorEvent::CustomerCreateRejected(rejected)) => {
                assert_eq!(rejected.entity_id, registered.entity_id);
                assert_eq!(rejected.causation_id, Some(registered.event.event_id()));
            }
            other => panic!("expected create rejected, got {:?}", other),
        }
        assert_eq!(h.store.current_version(&registered.entity_id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_fixed_delay_mode() {
        let h = harness().await;
        let saga = h.saga(ConsistencyPolicy::FixedDelay { delay_ms: 5 });

        let registered = h.register("C1", "t@mail.com").await;
        saga.handle(registered.clone()).await.unwrap();

        assert_eq!(h.store.current_version(&registered.entity_id).await.unwrap(), 2);
    }
}
