// Copyright (c) 2025 - Cowboy AI, Inc.
//! Application composition root
//!
//! [`CustomerApplication`] builds every component and hands each one its
//! collaborators explicitly. Nothing is global, so several applications can
//! live side by side in one process (tests do exactly that).
//!
//! ```text
//!                  ┌──────────── EventBus ─────────────┐
//!                  │ notifications            errors   │
//!  submit ──> CommandRouter ──> CustomerCommandHandler │
//!                  ▲                 │ store_events    │
//!                  │                 ▼                 │
//!                  │          InMemoryEventStore ──────┤
//!                  │                                   ├──> Projector ──> customer list
//!                  └──── UniqueEmailSaga <─────────────┤
//!                                                      └──> RegistrationTracker
//! ```

use futures::future::join_all;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::aggregate::commands::{InboundCommand, RegisterCustomerCommand};
use crate::bus::EventBus;
use crate::completion::{RegistrationOutcome, RegistrationTracker};
use crate::config::CustomerConfig;
use crate::domain::CustomerId;
use crate::errors::{CustomerError, CustomerResult};
use crate::event_store::{EventStore, InMemoryEventStore, StoredEvent};
use crate::projection::{
    start_projector, CustomerListProjection, CustomerRecord, MemoryProjectionStore,
    ProjectionStore, ProjectionWatermark, ProjectorHandle, CUSTOMERS,
};
use crate::router::{CommandOutcome, CommandRouter};
use crate::saga::UniqueEmailSaga;
use crate::service::CustomerCommandHandler;

pub struct CustomerApplication {
    config: CustomerConfig,
    bus: EventBus,
    store: Arc<InMemoryEventStore>,
    router: Arc<CommandRouter>,
    records: Arc<dyn ProjectionStore>,
    projector: ProjectorHandle,
    tracker: RegistrationTracker,
    handlers: Vec<JoinHandle<()>>,
}

impl CustomerApplication {
    /// Start with an empty event log
    pub async fn start(config: CustomerConfig) -> CustomerResult<Self> {
        let bus = EventBus::new();
        let store = InMemoryEventStore::new(bus.notifications().clone());
        Self::assemble(config, bus, store).await
    }

    /// Start from a previously exported event log
    ///
    /// The read model is rebuilt from `history` before this returns.
    pub async fn restore(config: CustomerConfig, history: Vec<StoredEvent>) -> CustomerResult<Self> {
        let bus = EventBus::new();
        let store = InMemoryEventStore::from_stored(history, bus.notifications().clone())?;
        Self::assemble(config, bus, store).await
    }

    async fn assemble(
        config: CustomerConfig,
        bus: EventBus,
        store: InMemoryEventStore,
    ) -> CustomerResult<Self> {
        let store = Arc::new(store);

        let router = Arc::new(CommandRouter::new());
        Arc::new(CustomerCommandHandler::new(store.clone())).register_all(&router)?;

        let records: Arc<dyn ProjectionStore> = Arc::new(MemoryProjectionStore::new());
        let projector = start_projector(
            CustomerListProjection::new(records.clone()),
            store.clone(),
            bus.notifications(),
        )
        .await?;

        let saga = Arc::new(UniqueEmailSaga::new(
            router.clone(),
            records.clone(),
            bus.clone(),
            projector.watermark(),
            config.saga,
        ));
        let handlers = vec![saga.start()];

        let tracker = RegistrationTracker::start(&bus);

        info!(
            watermark = projector.watermark().position(),
            consistency = ?config.saga.consistency,
            "Customer application started"
        );

        Ok(Self {
            config,
            bus,
            store,
            router,
            records,
            projector,
            tracker,
            handlers,
        })
    }

    pub fn config(&self) -> &CustomerConfig {
        &self.config
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    pub fn event_store(&self) -> Arc<dyn EventStore> {
        self.store.clone()
    }

    pub fn router(&self) -> &Arc<CommandRouter> {
        &self.router
    }

    pub fn watermark(&self) -> ProjectionWatermark {
        self.projector.watermark()
    }

    /// Register a customer and wait for the saga to decide
    ///
    /// # Errors
    ///
    /// Errors of the register command itself (invalid argument, already
    /// registered, concurrency). What happens after registration is reported
    /// as a [`RegistrationOutcome`], including [`RegistrationOutcome::TimedOut`].
    pub async fn register_customer(
        &self,
        command: RegisterCustomerCommand,
    ) -> CustomerResult<RegistrationOutcome> {
        let pending = self.tracker.track(command.entity_id.clone());
        self.submit(InboundCommand::RegisterCustomer(command)).await?;

        let outcome = pending.wait(self.config.registration_timeout()).await;
        if outcome == RegistrationOutcome::TimedOut {
            warn!("Registration timed out");
        }
        Ok(outcome)
    }

    /// Dispatch a command from outside the domain
    pub async fn submit(&self, command: InboundCommand) -> CustomerResult<CommandOutcome> {
        self.router.dispatch(command.into()).await
    }

    /// Decode and dispatch a tagged JSON command from outside the domain
    pub async fn submit_json(&self, value: &serde_json::Value) -> CustomerResult<CommandOutcome> {
        self.submit(InboundCommand::from_json(value)?).await
    }

    /// Every customer in the read model, ordered by id
    pub async fn list_customers(&self) -> CustomerResult<Vec<CustomerRecord>> {
        self.records
            .list(CUSTOMERS)
            .await?
            .into_iter()
            .map(|record| CustomerRecord::from_value(record).map_err(CustomerError::from))
            .collect()
    }

    pub async fn customer(&self, entity_id: &CustomerId) -> CustomerResult<Option<CustomerRecord>> {
        match self.records.get(CUSTOMERS, entity_id.as_str()).await? {
            Some(record) => Ok(Some(CustomerRecord::from_value(record)?)),
            None => Ok(None),
        }
    }

    /// The event log in global position order
    pub async fn export(&self) -> Vec<StoredEvent> {
        self.store.export().await
    }

    /// Stop background work
    ///
    /// # Errors
    ///
    /// The projector's error if it had failed.
    pub async fn shutdown(self) -> CustomerResult<()> {
        self.tracker.stop();
        for handler in &self.handlers {
            handler.abort();
        }
        join_all(self.handlers).await;

        let result = self.projector.stop().await;
        info!("Customer application stopped");
        result
    }
}
