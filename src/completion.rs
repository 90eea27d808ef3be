// Copyright (c) 2025 - Cowboy AI, Inc.
//! Registration completion
//!
//! A registration finishes asynchronously: the saga either creates the
//! customer (a notification) or reports why it did not (an error-channel
//! event). [`RegistrationTracker`] watches both channels and resolves the
//! waiters of the affected entity.
//!
//! Waiters are keyed by entity id. Track the entity *before* dispatching the
//! register command, otherwise a fast saga can finish before anyone listens.
//! Dropping a [`PendingRegistration`] removes its waiter.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::bus::EventBus;
use crate::domain::CustomerId;
use crate::events::{CustomerEvent, DomainErrorEvent};

/// How a registration ended, as seen by the registering caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// The customer was created; `version` is its stream version afterwards
    Created { version: u64 },

    /// Another customer already owns the email
    EmailTaken,

    /// The saga could not complete the registration
    Rejected { reason: String },

    /// Neither outcome arrived in time
    TimedOut,
}

type Waiter = (u64, oneshot::Sender<RegistrationOutcome>);

#[derive(Default)]
struct Waiters {
    next_id: AtomicU64,
    by_entity: Mutex<HashMap<CustomerId, Vec<Waiter>>>,
}

impl Waiters {
    fn lock(&self) -> MutexGuard<'_, HashMap<CustomerId, Vec<Waiter>>> {
        self.by_entity.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn resolve(&self, entity_id: &CustomerId, outcome: RegistrationOutcome) {
        let Some(waiters) = self.lock().remove(entity_id) else {
            return;
        };
        debug!(entity_id = %entity_id, waiters = waiters.len(), outcome = ?outcome, "Registration resolved");
        for (_, sender) in waiters {
            let _ = sender.send(outcome.clone());
        }
    }

    fn remove(&self, entity_id: &CustomerId, id: u64) {
        let mut by_entity = self.lock();
        if let Some(waiters) = by_entity.get_mut(entity_id) {
            waiters.retain(|(waiter, _)| *waiter != id);
            if waiters.is_empty() {
                by_entity.remove(entity_id);
            }
        }
    }
}

/// Resolves registration waiters from the bus
pub struct RegistrationTracker {
    waiters: Arc<Waiters>,
    task: JoinHandle<()>,
}

impl RegistrationTracker {
    /// Subscribe to both channels of `bus` and start resolving
    pub fn start(bus: &EventBus) -> Self {
        let waiters = Arc::new(Waiters::default());
        let mut notifications = bus.notifications().subscribe();
        let mut errors = bus.errors().subscribe();

        let resolver = Arc::clone(&waiters);
        let task = tokio::spawn(async move {
            loop {
                tokio::select! {
                    Some(recorded) = notifications.recv() => {
                        if let CustomerEvent::CustomerCreated(_) = recorded.event {
                            resolver.resolve(
                                &recorded.entity_id,
                                RegistrationOutcome::Created { version: recorded.version },
                            );
                        }
                    }
                    Some(error) = errors.recv() => {
                        let outcome = match &error {
                            DomainErrorEvent::CustomerExistingEmailFound(_) => {
                                RegistrationOutcome::EmailTaken
                            }
                            DomainErrorEvent::CustomerCreateRejected(rejected) => {
                                RegistrationOutcome::Rejected { reason: rejected.reason.clone() }
                            }
                        };
                        resolver.resolve(error.entity_id(), outcome);
                    }
                    else => break,
                }
            }
            debug!("Registration tracker stopped");
        });

        Self { waiters, task }
    }

    /// Start waiting for the outcome of `entity_id`'s registration
    pub fn track(&self, entity_id: CustomerId) -> PendingRegistration {
        let id = self.waiters.next_id.fetch_add(1, Ordering::Relaxed);
        let (sender, receiver) = oneshot::channel();
        self.waiters
            .lock()
            .entry(entity_id.clone())
            .or_default()
            .push((id, sender));

        PendingRegistration {
            entity_id,
            id,
            receiver,
            waiters: Arc::clone(&self.waiters),
        }
    }

    /// Number of entities with at least one waiter
    pub fn pending(&self) -> usize {
        self.waiters.lock().len()
    }

    pub fn stop(&self) {
        self.task.abort();
    }
}

impl Drop for RegistrationTracker {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One caller waiting for a registration outcome
pub struct PendingRegistration {
    entity_id: CustomerId,
    id: u64,
    receiver: oneshot::Receiver<RegistrationOutcome>,
    waiters: Arc<Waiters>,
}

impl PendingRegistration {
    pub fn entity_id(&self) -> &CustomerId {
        &self.entity_id
    }

    /// Wait at most `timeout` for the outcome
    ///
    /// A timeout is an outcome of its own, [`RegistrationOutcome::TimedOut`].
    pub async fn wait(mut self, timeout: Duration) -> RegistrationOutcome {
        match tokio::time::timeout(timeout, &mut self.receiver).await {
            Ok(Ok(outcome)) => outcome,
            Ok(Err(_)) => RegistrationOutcome::Rejected {
                reason: "registration tracker stopped".to_string(),
            },
            Err(_) => {
                warn!(
                    entity_id = %self.entity_id,
                    timeout = ?timeout,
                    "Registration outcome not observed before timeout"
                );
                RegistrationOutcome::TimedOut
            }
        }
    }
}

impl Drop for PendingRegistration {
    fn drop(&mut self) {
        self.waiters.remove(&self.entity_id, self.id);
    }
}
