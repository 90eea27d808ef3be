// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer command handling
//!
//! # Transaction Semantics
//!
//! Each command is one optimistic transaction:
//! 1. Validate required fields (nothing read yet)
//! 2. Load the entity's events and fold them
//! 3. Decide the new event (pure function)
//! 4. Store it with the version the decision was made against
//!
//! A concurrent writer makes step 4 fail with a concurrency conflict and nothing
//! is stored; the caller may retry the whole command.

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{debug, instrument};

use crate::aggregate::commands::{CommandKind, CustomerCommand};
use crate::aggregate::customer::CustomerAggregate;
use crate::aggregate::handlers::execute;
use crate::domain::CustomerId;
use crate::errors::CustomerResult;
use crate::event_store::EventStore;
use crate::router::{CommandHandler, CommandOutcome, CommandRouter};

/// Standard handler for every customer command kind
pub struct CustomerCommandHandler {
    store: Arc<dyn EventStore>,
}

impl CustomerCommandHandler {
    pub fn new(store: Arc<dyn EventStore>) -> Self {
        Self { store }
    }

    /// Register one shared handler for all five command kinds
    pub fn register_all(self: Arc<Self>, router: &CommandRouter) -> CustomerResult<()> {
        for kind in CommandKind::ALL {
            router.register_handler(kind, self.clone())?;
        }
        Ok(())
    }

    /// Current aggregate of one entity, rebuilt from the log
    pub async fn load(&self, entity_id: &CustomerId) -> CustomerResult<CustomerAggregate> {
        let history = self.store.read_events(entity_id).await?;
        Ok(CustomerAggregate::load_from_history(
            history.iter().map(|recorded| &recorded.event),
        )?)
    }
}

#[async_trait]
impl CommandHandler for CustomerCommandHandler {
    #[instrument(
        skip(self, command),
        fields(kind = %command.kind(), entity_id = %command.entity_id())
    )]
    async fn handle(&self, command: CustomerCommand) -> CustomerResult<CommandOutcome> {
        command.validate()?;

        let entity_id = command.entity_id().clone();
        let aggregate = self.load(&entity_id).await?;
        let expected_version = aggregate.current_version();

        let events = execute(aggregate, command)?.into_uncommitted_changes();
        let appended = self
            .store
            .store_events(&entity_id, events.clone(), expected_version)
            .await?;

        debug!(version = appended.version, "Command handled");

        Ok(CommandOutcome {
            entity_id,
            version: appended.version,
            last_position: appended.last_position,
            events,
        })
    }
}
