// Copyright (c) 2025 - Cowboy AI, Inc.
//! Command Router
//!
//! Maps each [`CommandKind`] to exactly one handler and forwards commands to it.
//! Handler errors are returned to the caller unchanged.

use async_trait::async_trait;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, PoisonError, RwLock};
use tracing::{debug, info};

use crate::aggregate::commands::{CommandKind, CustomerCommand};
use crate::domain::CustomerId;
use crate::errors::{CustomerError, CustomerResult};
use crate::events::CustomerEvent;

/// What a successfully handled command did to its stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutcome {
    pub entity_id: CustomerId,

    /// Stream version after the append
    pub version: u64,

    /// Global position of the last appended event
    pub last_position: u64,

    pub events: Vec<CustomerEvent>,
}

/// Command handler trait
#[async_trait]
pub trait CommandHandler: Send + Sync {
    async fn handle(&self, command: CustomerCommand) -> CustomerResult<CommandOutcome>;
}

/// Function-based command handler
pub struct FnCommandHandler<F> {
    handler: F,
}

impl<F, Fut> FnCommandHandler<F>
where
    F: Fn(CustomerCommand) -> Fut + Send + Sync,
    Fut: Future<Output = CustomerResult<CommandOutcome>> + Send,
{
    pub fn new(handler: F) -> Self {
        Self { handler }
    }
}

#[async_trait]
impl<F, Fut> CommandHandler for FnCommandHandler<F>
where
    F: Fn(CustomerCommand) -> Fut + Send + Sync,
    Fut: Future<Output = CustomerResult<CommandOutcome>> + Send,
{
    async fn handle(&self, command: CustomerCommand) -> CustomerResult<CommandOutcome> {
        (self.handler)(command).await
    }
}

/// Registry of one handler per command kind
#[derive(Default)]
pub struct CommandRouter {
    handlers: RwLock<HashMap<CommandKind, Arc<dyn CommandHandler>>>,
}

impl CommandRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `handler` for `kind`
    ///
    /// # Errors
    ///
    /// `HandlerAlreadyRegistered` if `kind` already has a handler.
    pub fn register_handler(
        &self,
        kind: CommandKind,
        handler: Arc<dyn CommandHandler>,
    ) -> CustomerResult<()> {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        if handlers.contains_key(&kind) {
            return Err(CustomerError::HandlerAlreadyRegistered(kind));
        }
        handlers.insert(kind, handler);
        info!(kind = %kind, "Command handler registered");
        Ok(())
    }

    /// # Errors
    ///
    /// `HandlerNotRegistered` if `kind` has no handler.
    pub fn unregister_handler(&self, kind: CommandKind) -> CustomerResult<()> {
        let mut handlers = self.handlers.write().unwrap_or_else(PoisonError::into_inner);
        match handlers.remove(&kind) {
            Some(_) => {
                info!(kind = %kind, "Command handler unregistered");
                Ok(())
            }
            None => Err(CustomerError::HandlerNotRegistered(kind)),
        }
    }

    pub fn is_handler_registered(&self, kind: CommandKind) -> bool {
        self.handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(&kind)
    }

    /// Forward `command` to the handler registered for its kind
    pub async fn dispatch(&self, command: CustomerCommand) -> CustomerResult<CommandOutcome> {
        let kind = command.kind();
        let handler = self
            .handlers
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&kind)
            .cloned()
            .ok_or(CustomerError::HandlerNotRegistered(kind))?;

        debug!(kind = %kind, entity_id = %command.entity_id(), "Dispatching command");
        handler.handle(command).await
    }

    /// Decode a tagged JSON command and dispatch it
    pub async fn dispatch_json(&self, value: &serde_json::Value) -> CustomerResult<CommandOutcome> {
        self.dispatch(CustomerCommand::from_json(value)?).await
    }
}
