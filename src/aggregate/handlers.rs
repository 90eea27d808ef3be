// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Command Handlers for the Customer Aggregate
//!
//! Command handlers are pure decisions:
//! 1. Validate required fields (before any state is consulted)
//! 2. Ask the lifecycle state machine whether the command is allowed
//! 3. Return the resulting event, or the rule it violates
//!
//! ```text
//! handle_command(&State, Command) → Result<Event, CommandError>
//! ```
//!
//! Event ids are fresh UUID v7 values; everything else in an event comes from
//! the command and the state.

use uuid::Uuid;

use crate::aggregate::commands::*;
use crate::aggregate::customer::{CustomerAggregate, CustomerState};
use crate::errors::CustomerResult;
use crate::events::customer::*;
use crate::state_machine::{LifecycleCommand, StateMachine};

/// Command validation error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum CommandError {
    /// A required field is missing or blank
    #[error("{field} param is required")]
    InvalidArgument { field: &'static str },

    #[error("can not register same customer more than once")]
    AlreadyRegistered,

    #[error("can not create same customer more than once")]
    AlreadyCreated,

    #[error("customer does not exist")]
    NotFound,

    #[error("customer is not active")]
    NotActive,

    #[error("customer is already active")]
    AlreadyActive,
}

impl CommandError {
    /// Lifecycle rule violations, as opposed to malformed input
    pub fn is_rule_violation(&self) -> bool {
        !matches!(self, CommandError::InvalidArgument { .. })
    }
}

fn check(state: &CustomerState, input: LifecycleCommand) -> Result<(), CommandError> {
    state.status().transition(&input).map(|_| ())
}

/// Handle RegisterCustomer command
///
/// # Business Rules
/// - name, email and passwordHash are required
/// - Customer must not exist yet
pub fn handle_register(
    state: &CustomerState,
    command: RegisterCustomerCommand,
) -> Result<CustomerRegistered, CommandError> {
    command.validate()?;
    check(state, LifecycleCommand::Register)?;

    Ok(CustomerRegistered {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: Uuid::now_v7(),
        entity_id: command.entity_id,
        timestamp: command.timestamp,
        correlation_id: command.correlation_id,
        causation_id: None,
        name: command.name,
        email: command.email,
        password_hash: command.password_hash,
    })
}

/// Handle CreateCustomer command
///
/// # Business Rules
/// - name, email and passwordHash are required
/// - Customer must not be created yet
pub fn handle_create(
    state: &CustomerState,
    command: CreateCustomerCommand,
) -> Result<CustomerCreated, CommandError> {
    command.validate()?;
    check(state, LifecycleCommand::Create)?;

    Ok(CustomerCreated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: Uuid::now_v7(),
        entity_id: command.entity_id,
        timestamp: command.timestamp,
        correlation_id: command.correlation_id,
        causation_id: command.causation_id,
        name: command.name,
        email: command.email,
        password_hash: command.password_hash,
    })
}

/// Handle UpdateCustomer command
///
/// # Business Rules
/// - name is required
/// - Customer must exist and not be deactivated
pub fn handle_update(
    state: &CustomerState,
    command: UpdateCustomerCommand,
) -> Result<CustomerUpdated, CommandError> {
    command.validate()?;
    check(state, LifecycleCommand::Update)?;

    Ok(CustomerUpdated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: Uuid::now_v7(),
        entity_id: command.entity_id,
        timestamp: command.timestamp,
        correlation_id: command.correlation_id,
        causation_id: command.causation_id,
        name: command.name,
    })
}

/// Handle DeactivateCustomer command
///
/// # Business Rules
/// - Customer must exist and not be deactivated
pub fn handle_deactivate(
    state: &CustomerState,
    command: DeactivateCustomerCommand,
) -> Result<CustomerDeactivated, CommandError> {
    check(state, LifecycleCommand::Deactivate)?;

    Ok(CustomerDeactivated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: Uuid::now_v7(),
        entity_id: command.entity_id,
        timestamp: command.timestamp,
        correlation_id: command.correlation_id,
        causation_id: command.causation_id,
    })
}

/// Handle ReactivateCustomer command
///
/// # Business Rules
/// - Customer must exist and be deactivated
pub fn handle_reactivate(
    state: &CustomerState,
    command: ReactivateCustomerCommand,
) -> Result<CustomerReactivated, CommandError> {
    check(state, LifecycleCommand::Reactivate)?;

    Ok(CustomerReactivated {
        event_version: EVENT_SCHEMA_VERSION,
        event_id: Uuid::now_v7(),
        entity_id: command.entity_id,
        timestamp: command.timestamp,
        correlation_id: command.correlation_id,
        causation_id: command.causation_id,
    })
}

/// Decide which event a command produces against `state`
pub fn decide(state: &CustomerState, command: CustomerCommand) -> Result<CustomerEvent, CommandError> {
    let event = match command {
        CustomerCommand::RegisterCustomer(c) => {
            CustomerEvent::CustomerRegistered(handle_register(state, c)?)
        }
        CustomerCommand::CreateCustomer(c) => CustomerEvent::CustomerCreated(handle_create(state, c)?),
        CustomerCommand::UpdateCustomer(c) => CustomerEvent::CustomerUpdated(handle_update(state, c)?),
        CustomerCommand::DeactivateCustomer(c) => {
            CustomerEvent::CustomerDeactivated(handle_deactivate(state, c)?)
        }
        CustomerCommand::ReactivateCustomer(c) => {
            CustomerEvent::CustomerReactivated(handle_reactivate(state, c)?)
        }
    };
    Ok(event)
}

/// Run a command against an aggregate and record the resulting event
///
/// The committed version is unchanged; the event lands in the uncommitted changes.
pub fn execute(aggregate: CustomerAggregate, command: CustomerCommand) -> CustomerResult<CustomerAggregate> {
    let event = decide(aggregate.state(), command)?;
    Ok(aggregate.record(event)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::CustomerId;
    use chrono::{DateTime, Utc};

    fn at() -> DateTime<Utc> {
        "2026-01-19T12:00:00Z".parse().unwrap()
    }

    fn register(name: &str) -> RegisterCustomerCommand {
        RegisterCustomerCommand {
            entity_id: CustomerId::new("C1").unwrap(),
            name: name.to_string(),
            email: "test@test.com".to_string(),
            password_hash: "hash".to_string(),
            timestamp: at(),
            correlation_id: Uuid::now_v7(),
        }
    }

    fn registered_state() -> CustomerState {
        use crate::aggregate::Aggregate;

        let event = handle_register(&CustomerState::default(), register("Test")).unwrap();
        CustomerState::default()
            .apply(&CustomerEvent::CustomerRegistered(event))
            .unwrap()
    }

    #[test]
    fn test_register_copies_fields() {
        let command = register("Test");
        let event = handle_register(&CustomerState::default(), command.clone()).unwrap();

        assert_eq!(event.entity_id, command.entity_id);
        assert_eq!(event.name, "Test");
        assert_eq!(event.timestamp, at());
        assert_eq!(event.correlation_id, command.correlation_id);
        assert_eq!(event.causation_id, None);
    }

    #[test]
    fn test_validation_precedes_state() {
        // blank name on an existing customer still reports the missing field
        let existing = registered_state();

        assert_eq!(
            handle_register(&existing, register("  ")),
            Err(CommandError::InvalidArgument { field: "name" })
        );
    }

    #[test]
    fn test_execute_records_uncommitted() {
        let aggregate = execute(
            CustomerAggregate::new(),
            CustomerCommand::RegisterCustomer(register("Test")),
        )
        .unwrap();

        assert_eq!(aggregate.current_version(), 0);
        assert_eq!(aggregate.uncommitted_changes().len(), 1);
        assert_eq!(
            aggregate.uncommitted_changes()[0].event_type_name(),
            "CUSTOMER_REGISTERED"
        );
    }
}
