// Copyright (c) 2025 - Cowboy AI, Inc.
//! Finite State Machine Abstractions
//!
//! Lifecycles are modeled as pure, deterministic transition functions:
//!
//! ```text
//! (State, Input) → Result<State, Error>
//! ```
//!
//! Command handlers consult the machine before producing an event, so the
//! transition table is the single place a lifecycle rule lives.
//!
//! # Example
//!
//! ```rust,ignore
//! use cim_customer::state_machine::*;
//!
//! let next = CustomerStatus::Registered.transition(&LifecycleCommand::Create)?;
//! assert_eq!(next, CustomerStatus::Active);
//! ```

pub mod customer_lifecycle;

pub use customer_lifecycle::{CustomerStatus, LifecycleCommand};

/// Trait for finite state machines
pub trait StateMachine: Sized + Clone {
    /// Input type that triggers transitions
    type Input;

    /// Why an input is refused in the current state
    type Error;

    /// Attempt to transition to a new state given an input
    fn transition(&self, input: &Self::Input) -> Result<Self, Self::Error>;

    /// Check if a transition is valid without performing it
    fn can_transition(&self, input: &Self::Input) -> bool {
        self.transition(input).is_ok()
    }

    /// All inputs accepted from the current state
    fn valid_inputs(&self) -> Vec<Self::Input>;
}
