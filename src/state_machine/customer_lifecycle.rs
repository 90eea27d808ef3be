// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer Lifecycle State Machine
//!
//! ```text
//!                 register              create
//! Unregistered ───────────> Registered ────────> Active
//!      │                     │    ▲               │  ▲
//!      │ create              │    │ reactivate    │  │ reactivate
//!      └──────> Active       ▼    │               ▼  │
//!                  Deactivated{created: false}   Deactivated{created: true}
//!                             │ create                ▲
//!                             └───────────────────────┘
//! ```
//!
//! `update` keeps the status and is refused for deactivated customers.

use serde::{Deserialize, Serialize};

use super::StateMachine;
use crate::aggregate::handlers::CommandError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CustomerStatus {
    /// No events yet
    Unregistered,

    /// Registered, waiting for the uniqueness check
    Registered,

    /// Created and active
    Active,

    /// Deactivated; `created` remembers whether creation already happened
    Deactivated { created: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleCommand {
    Register,
    Create,
    Update,
    Deactivate,
    Reactivate,
}

impl LifecycleCommand {
    pub const ALL: [LifecycleCommand; 5] = [
        LifecycleCommand::Register,
        LifecycleCommand::Create,
        LifecycleCommand::Update,
        LifecycleCommand::Deactivate,
        LifecycleCommand::Reactivate,
    ];
}

impl StateMachine for CustomerStatus {
    type Input = LifecycleCommand;
    type Error = CommandError;

    fn transition(&self, input: &LifecycleCommand) -> Result<Self, CommandError> {
        use CustomerStatus::*;
        use LifecycleCommand::*;

        match (*self, *input) {
            (Unregistered, Register) => Ok(Registered),
            (_, Register) => Err(CommandError::AlreadyRegistered),

            (Unregistered, Create) | (Registered, Create) => Ok(Active),
            (Deactivated { created: false }, Create) => Ok(Deactivated { created: true }),
            (Active, Create) | (Deactivated { created: true }, Create) => {
                Err(CommandError::AlreadyCreated)
            }

            (Unregistered, _) => Err(CommandError::NotFound),

            (Registered, Update) | (Active, Update) => Ok(*self),
            (Deactivated { .. }, Update) => Err(CommandError::NotActive),

            (Registered, Deactivate) => Ok(Deactivated { created: false }),
            (Active, Deactivate) => Ok(Deactivated { created: true }),
            (Deactivated { .. }, Deactivate) => Err(CommandError::NotActive),

            (Deactivated { created: false }, Reactivate) => Ok(Registered),
            (Deactivated { created: true }, Reactivate) => Ok(Active),
            (Registered, Reactivate) | (Active, Reactivate) => Err(CommandError::AlreadyActive),
        }
    }

    fn valid_inputs(&self) -> Vec<LifecycleCommand> {
        LifecycleCommand::ALL
            .into_iter()
            .filter(|input| self.can_transition(input))
            .collect()
    }
}
