// Copyright (c) 2025 - Cowboy AI, Inc.
//! Side Effect Executor
//!
//! Executors interpret the side effects returned by pure projections and
//! perform the actual I/O.
//!
//! ```text
//! (State, Event) ── project() ──> Effects ── execute() ──> ProjectionStore
//!   pure function                               async I/O
//! ```

use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::pure::{LogLevel, SideEffect};
use super::store::ProjectionStore;
use super::ProjectionError;

/// Trait for executing side effects
#[async_trait]
pub trait SideEffectExecutor: Send + Sync {
    /// Execute a batch of side effects in order
    ///
    /// Stops at the first failing effect.
    async fn execute(&mut self, effects: Vec<SideEffect>) -> Result<(), ProjectionError>;
}

/// Performs effects against a [`ProjectionStore`]
pub struct StoreExecutor {
    store: Arc<dyn ProjectionStore>,
}

impl StoreExecutor {
    pub fn new(store: Arc<dyn ProjectionStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn ProjectionStore> {
        &self.store
    }

    async fn merge(&self, collection: &str, key: &str, changes: Value) -> Result<(), ProjectionError> {
        let Some(mut record) = self.store.get(collection, key).await? else {
            return Err(ProjectionError::MissingKey {
                collection: collection.to_string(),
                key: key.to_string(),
            });
        };

        match (&mut record, changes) {
            (Value::Object(fields), Value::Object(changes)) => fields.extend(changes),
            (_, changes) => {
                return Err(ProjectionError::InvalidRecord(format!(
                    "cannot merge {changes} into {collection}/{key}"
                )))
            }
        }

        self.store.update(collection, key, record).await
    }
}

#[async_trait]
impl SideEffectExecutor for StoreExecutor {
    async fn execute(&mut self, effects: Vec<SideEffect>) -> Result<(), ProjectionError> {
        for effect in effects {
            match effect {
                SideEffect::Insert {
                    collection,
                    key,
                    record,
                } => self.store.insert(&collection, &key, record).await?,
                SideEffect::Update {
                    collection,
                    key,
                    changes,
                } => self.merge(&collection, &key, changes).await?,
                SideEffect::Log { level, message } => match level {
                    LogLevel::Debug => debug!("{}", message),
                    LogLevel::Info => info!("{}", message),
                    LogLevel::Warn => warn!("{}", message),
                    LogLevel::Error => error!("{}", message),
                },
            }
        }
        Ok(())
    }
}
