// Copyright (c) 2025 - Cowboy AI, Inc.
//! Event-sourced customer lifecycle for the Composable Information Machine
//!
//! This crate provides the write side (aggregate, event log, command router),
//! the read side (projector and customer list read model) and the email
//! uniqueness saga that connects them, all delivered in-process.
//!
//! ```text
//! InboundCommand ─> CommandRouter ─> CustomerAggregate ─> EventStore
//!                        ▲                                    │ notifications
//!                        │ CREATE_CUSTOMER                    ▼
//!                 UniqueEmailSaga <──── find(email) ──── Projector ─> ProjectionStore
//! ```
//!
//! [`CustomerApplication`] wires everything together.

pub mod aggregate;
pub mod application;
pub mod bus;
pub mod completion;
pub mod config;
pub mod domain;
pub mod errors;
pub mod event_store;
pub mod events;
pub mod projection;
pub mod router;
pub mod saga;
pub mod service;
pub mod state_machine;

// Re-export commonly used types
pub use aggregate::{Aggregate, AggregateState, CustomerAggregate, CustomerCommand, InboundCommand};
pub use application::CustomerApplication;
pub use bus::{EventBus, EventChannel, MessageHandler, Subscription};
pub use completion::{RegistrationOutcome, RegistrationTracker};
pub use config::{ConsistencyPolicy, CustomerConfig, SagaConfig};
pub use domain::CustomerId;
pub use errors::{CustomerError, CustomerResult};
pub use event_store::{EventStore, InMemoryEventStore, RecordedEvent, StoredEvent};
pub use events::{CustomerEvent, DomainErrorEvent};
pub use projection::{CustomerRecord, ProjectionStore};
pub use router::{CommandHandler, CommandOutcome, CommandRouter};
