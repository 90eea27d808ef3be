// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Aggregates
//!
//! This module provides the generic aggregate engine for event sourcing and the
//! customer aggregate built on it:
//! - Decisions are pure functions: State → Command → Result<Event, Error>
//! - State reconstruction via event folding: [Event] → State
//! - Every fold step returns a new value; nothing is mutated in place
//!
//! # Event Sourcing Pattern
//!
//! ```text
//! Command → Aggregate → Events → Event Store
//!    ↓          ↓          ↓
//! Intent   Validation  Facts
//! ```
//!
//! # Versions
//!
//! An [`AggregateState`] tracks two things besides the folded state:
//! - the **committed version**, the number of historical events folded in
//!   (0 for an entity that does not exist yet)
//! - the **uncommitted changes**, events produced by the current decision
//!
//! The committed version is the `expected_version` handed to the event store when
//! the uncommitted changes are stored. Folding a new event never moves it.
//!
//! # Example Usage
//!
//! ```rust,ignore
//! use cim_customer::aggregate::*;
//!
//! let history = event_store.read_events(&entity_id).await?;
//! let aggregate = CustomerAggregate::load_from_history(history.iter().map(|r| &r.event))?;
//!
//! let expected_version = aggregate.current_version();
//! let aggregate = execute(aggregate, command)?;
//! event_store
//!     .store_events(&entity_id, aggregate.uncommitted_changes().to_vec(), expected_version)
//!     .await?;
//! ```

pub mod commands;
pub mod customer;
pub mod handlers;

pub use commands::*;
pub use customer::{CustomerAggregate, CustomerState};
pub use handlers::*;

use std::fmt::Debug;

/// An event could not be folded onto the current state
///
/// Only happens for a log written by a different rule set or edited by hand.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{event} cannot be applied: {reason}")]
pub struct FoldError {
    pub event: &'static str,
    pub reason: &'static str,
}

/// Pure reducer over a closed event type
pub trait Aggregate: Clone + Default + PartialEq + Debug {
    type Event: Clone + PartialEq + Debug;

    /// Fold one event onto the state, returning the next state
    fn apply(self, event: &Self::Event) -> Result<Self, FoldError>;
}

/// Folded state of one entity plus its version bookkeeping
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateState<A: Aggregate> {
    state: A,
    committed_version: u64,
    uncommitted: Vec<A::Event>,
}

impl<A: Aggregate> Default for AggregateState<A> {
    fn default() -> Self {
        Self {
            state: A::default(),
            committed_version: 0,
            uncommitted: Vec::new(),
        }
    }
}

impl<A: Aggregate> AggregateState<A> {
    /// Empty state at version 0
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from ordered history, starting from an empty state
    ///
    /// The result has `current_version() == n` for `n` events and no
    /// uncommitted changes.
    pub fn load_from_history<'a, I>(events: I) -> Result<Self, FoldError>
    where
        I: IntoIterator<Item = &'a A::Event>,
        A::Event: 'a,
    {
        events
            .into_iter()
            .try_fold(Self::new(), |aggregate, event| aggregate.apply(event.clone(), false))
    }

    /// Fold `event` onto the state
    ///
    /// Historical events (`is_new == false`) advance the committed version; new
    /// events are appended to the uncommitted changes instead.
    pub fn apply(self, event: A::Event, is_new: bool) -> Result<Self, FoldError> {
        let state = self.state.apply(&event)?;
        let mut uncommitted = self.uncommitted;

        let committed_version = if is_new {
            uncommitted.push(event);
            self.committed_version
        } else {
            self.committed_version + 1
        };

        Ok(Self {
            state,
            committed_version,
            uncommitted,
        })
    }

    /// Record a decision's event as an uncommitted change
    pub fn record(self, event: A::Event) -> Result<Self, FoldError> {
        self.apply(event, true)
    }

    /// Number of committed historical events folded in
    pub fn current_version(&self) -> u64 {
        self.committed_version
    }

    pub fn uncommitted_changes(&self) -> &[A::Event] {
        &self.uncommitted
    }

    pub fn into_uncommitted_changes(self) -> Vec<A::Event> {
        self.uncommitted
    }

    pub fn state(&self) -> &A {
        &self.state
    }
}
