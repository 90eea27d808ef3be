// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Customer Aggregate
//!
//! ```text
//! Command → handle_command() → Result<Event, Error>
//!                                    ↓
//! Events → CustomerState::apply() → New State
//! ```

use chrono::{DateTime, Utc};

use crate::aggregate::{Aggregate, AggregateState, FoldError};
use crate::domain::CustomerId;
use crate::events::CustomerEvent;
use crate::state_machine::CustomerStatus;

/// Customer aggregate: folded state plus version bookkeeping
pub type CustomerAggregate = AggregateState<CustomerState>;

/// Immutable Customer State
///
/// `created` and `active` start false on registration and become true on
/// creation. Deactivation clears `active`; reactivation restores it to
/// `created`, so a customer reactivated before creation is registered again,
/// not active.
///
/// `active` always means "created and not deactivated". A create that lands
/// while the customer is deactivated therefore sets `created` but leaves
/// `active` false until reactivation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CustomerState {
    /// `None` until the first event is folded in
    pub entity_id: Option<CustomerId>,

    pub name: String,
    pub email: String,
    pub password_hash: String,

    pub created: bool,

    /// Created and not deactivated
    pub active: bool,
    pub deactivated: bool,

    pub registered_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl CustomerState {
    /// Lifecycle status derived from the flags
    pub fn status(&self) -> CustomerStatus {
        match (&self.entity_id, self.deactivated, self.created) {
            (None, _, _) => CustomerStatus::Unregistered,
            (Some(_), true, created) => CustomerStatus::Deactivated { created },
            (Some(_), false, true) => CustomerStatus::Active,
            (Some(_), false, false) => CustomerStatus::Registered,
        }
    }

    /// Guard that an event addresses the entity this state was built for
    fn existing(&self, entity_id: &CustomerId, event: &'static str) -> Result<(), FoldError> {
        match &self.entity_id {
            None => Err(FoldError {
                event,
                reason: "customer does not exist",
            }),
            Some(id) if id != entity_id => Err(FoldError {
                event,
                reason: "entity id does not match the stream",
            }),
            Some(_) => Ok(()),
        }
    }
}

impl Aggregate for CustomerState {
    type Event = CustomerEvent;

    fn apply(self, event: &CustomerEvent) -> Result<Self, FoldError> {
        let kind = event.event_type_name();

        match event {
            CustomerEvent::CustomerRegistered(e) => {
                if self.entity_id.is_some() {
                    return Err(FoldError {
                        event: kind,
                        reason: "customer already exists",
                    });
                }
                Ok(CustomerState {
                    entity_id: Some(e.entity_id.clone()),
                    name: e.name.clone(),
                    email: e.email.clone(),
                    password_hash: e.password_hash.clone(),
                    created: false,
                    active: false,
                    registered_at: Some(e.timestamp),
                    updated_at: Some(e.timestamp),
                    ..self
                })
            }

            CustomerEvent::CustomerCreated(e) => {
                if self.created {
                    return Err(FoldError {
                        event: kind,
                        reason: "customer already created",
                    });
                }
                if self.entity_id.is_some() {
                    self.existing(&e.entity_id, kind)?;
                }
                let active = !self.deactivated;
                Ok(CustomerState {
                    entity_id: Some(e.entity_id.clone()),
                    name: e.name.clone(),
                    email: e.email.clone(),
                    password_hash: e.password_hash.clone(),
                    created: true,
                    active,
                    registered_at: self.registered_at.or(Some(e.timestamp)),
                    updated_at: Some(e.timestamp),
                    ..self
                })
            }

            CustomerEvent::CustomerUpdated(e) => {
                self.existing(&e.entity_id, kind)?;
                Ok(CustomerState {
                    name: e.name.clone(),
                    updated_at: Some(e.timestamp),
                    ..self
                })
            }

            CustomerEvent::CustomerDeactivated(e) => {
                self.existing(&e.entity_id, kind)?;
                if self.deactivated {
                    return Err(FoldError {
                        event: kind,
                        reason: "customer already deactivated",
                    });
                }
                Ok(CustomerState {
                    active: false,
                    deactivated: true,
                    updated_at: Some(e.timestamp),
                    ..self
                })
            }

            CustomerEvent::CustomerReactivated(e) => {
                self.existing(&e.entity_id, kind)?;
                if !self.deactivated {
                    return Err(FoldError {
                        event: kind,
                        reason: "customer is not deactivated",
                    });
                }
                let active = self.created;
                Ok(CustomerState {
                    active,
                    deactivated: false,
                    updated_at: Some(e.timestamp),
                    ..self
                })
            }
        }
    }
}

impl AggregateState<CustomerState> {
    pub fn status(&self) -> CustomerStatus {
        self.state().status()
    }
}
