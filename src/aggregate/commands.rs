// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Functional Commands for the Customer Aggregate
//!
//! Commands express intent and can be rejected by business rules.
//!
//! # Command Pattern
//!
//! ```text
//! Command → handle_command(State, Command) → Result<Event, Error>
//! ```
//!
//! # Time Handling
//!
//! All commands include an explicit `timestamp`. Commands built in code pass it
//! from the application layer; commands decoded from JSON may omit it and get
//! the decode time.
//!
//! # Inbound surface
//!
//! `CreateCustomer` is issued only by the email uniqueness saga.
//! [`InboundCommand`] is the set of commands an outside caller may submit and has
//! no create variant.

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use uuid::Uuid;

use crate::aggregate::handlers::CommandError;
use crate::domain::CustomerId;
use crate::errors::CustomerResult;
use crate::events::known_kind;

/// Command to register a new customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerCommand {
    pub entity_id: CustomerId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password_hash: String,

    /// Timestamp when command was issued (explicit time parameter)
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    /// Correlation ID for distributed tracing
    #[serde(default = "Uuid::now_v7")]
    pub correlation_id: Uuid,
}

/// Command to create a registered customer once its email proved unique
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateCustomerCommand {
    pub entity_id: CustomerId,

    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub email: String,

    #[serde(default)]
    pub password_hash: String,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "Uuid::now_v7")]
    pub correlation_id: Uuid,

    /// The registration event that led to this command
    #[serde(default)]
    pub causation_id: Option<Uuid>,
}

/// Command to change a customer's name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateCustomerCommand {
    pub entity_id: CustomerId,

    #[serde(default)]
    pub name: String,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "Uuid::now_v7")]
    pub correlation_id: Uuid,

    #[serde(default)]
    pub causation_id: Option<Uuid>,
}

/// Command to deactivate a customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeactivateCustomerCommand {
    pub entity_id: CustomerId,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "Uuid::now_v7")]
    pub correlation_id: Uuid,

    #[serde(default)]
    pub causation_id: Option<Uuid>,
}

/// Command to reactivate a deactivated customer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReactivateCustomerCommand {
    pub entity_id: CustomerId,

    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,

    #[serde(default = "Uuid::now_v7")]
    pub correlation_id: Uuid,

    #[serde(default)]
    pub causation_id: Option<Uuid>,
}

/// Every command the customer aggregate accepts
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CustomerCommand {
    RegisterCustomer(RegisterCustomerCommand),
    CreateCustomer(CreateCustomerCommand),
    UpdateCustomer(UpdateCustomerCommand),
    DeactivateCustomer(DeactivateCustomerCommand),
    ReactivateCustomer(ReactivateCustomerCommand),
}

/// Routing key of a command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommandKind {
    RegisterCustomer,
    CreateCustomer,
    UpdateCustomer,
    DeactivateCustomer,
    ReactivateCustomer,
}

impl CommandKind {
    pub const ALL: [CommandKind; 5] = [
        CommandKind::RegisterCustomer,
        CommandKind::CreateCustomer,
        CommandKind::UpdateCustomer,
        CommandKind::DeactivateCustomer,
        CommandKind::ReactivateCustomer,
    ];

    /// Wire `kind` tag
    pub fn as_str(&self) -> &'static str {
        match self {
            CommandKind::RegisterCustomer => "REGISTER_CUSTOMER",
            CommandKind::CreateCustomer => "CREATE_CUSTOMER",
            CommandKind::UpdateCustomer => "UPDATE_CUSTOMER",
            CommandKind::DeactivateCustomer => "DEACTIVATE_CUSTOMER",
            CommandKind::ReactivateCustomer => "REACTIVATE_CUSTOMER",
        }
    }
}

impl fmt::Display for CommandKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Reject an empty required field
fn require(field: &'static str, value: &str) -> Result<(), CommandError> {
    if value.trim().is_empty() {
        Err(CommandError::InvalidArgument { field })
    } else {
        Ok(())
    }
}

/// Decode a tagged command, reporting a missing or malformed `entityId` as an
/// invalid argument rather than a decoding failure
fn decode_command<T: DeserializeOwned>(value: &Value, known: &[&str]) -> CustomerResult<T> {
    known_kind(value, known)?;

    match value.get("entityId") {
        Some(Value::String(raw)) => {
            CustomerId::new(raw.as_str())?;
        }
        _ => return Err(CommandError::InvalidArgument { field: "entityId" }.into()),
    }

    Ok(serde_json::from_value(value.clone())?)
}

impl RegisterCustomerCommand {
    pub fn validate(&self) -> Result<(), CommandError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("passwordHash", &self.password_hash)
    }
}

impl CreateCustomerCommand {
    pub fn validate(&self) -> Result<(), CommandError> {
        require("name", &self.name)?;
        require("email", &self.email)?;
        require("passwordHash", &self.password_hash)
    }
}

impl UpdateCustomerCommand {
    pub fn validate(&self) -> Result<(), CommandError> {
        require("name", &self.name)
    }
}

impl CustomerCommand {
    pub fn kind(&self) -> CommandKind {
        match self {
            CustomerCommand::RegisterCustomer(_) => CommandKind::RegisterCustomer,
            CustomerCommand::CreateCustomer(_) => CommandKind::CreateCustomer,
            CustomerCommand::UpdateCustomer(_) => CommandKind::UpdateCustomer,
            CustomerCommand::DeactivateCustomer(_) => CommandKind::DeactivateCustomer,
            CustomerCommand::ReactivateCustomer(_) => CommandKind::ReactivateCustomer,
        }
    }

    pub fn entity_id(&self) -> &CustomerId {
        match self {
            CustomerCommand::RegisterCustomer(c) => &c.entity_id,
            CustomerCommand::CreateCustomer(c) => &c.entity_id,
            CustomerCommand::UpdateCustomer(c) => &c.entity_id,
            CustomerCommand::DeactivateCustomer(c) => &c.entity_id,
            CustomerCommand::ReactivateCustomer(c) => &c.entity_id,
        }
    }

    pub fn correlation_id(&self) -> Uuid {
        match self {
            CustomerCommand::RegisterCustomer(c) => c.correlation_id,
            CustomerCommand::CreateCustomer(c) => c.correlation_id,
            CustomerCommand::UpdateCustomer(c) => c.correlation_id,
            CustomerCommand::DeactivateCustomer(c) => c.correlation_id,
            CustomerCommand::ReactivateCustomer(c) => c.correlation_id,
        }
    }

    /// Check required fields without looking at any state
    pub fn validate(&self) -> Result<(), CommandError> {
        match self {
            CustomerCommand::RegisterCustomer(c) => c.validate(),
            CustomerCommand::CreateCustomer(c) => c.validate(),
            CustomerCommand::UpdateCustomer(c) => c.validate(),
            CustomerCommand::DeactivateCustomer(_) | CustomerCommand::ReactivateCustomer(_) => {
                Ok(())
            }
        }
    }

    /// Decode a command from its tagged JSON form
    pub fn from_json(value: &serde_json::Value) -> CustomerResult<Self> {
        let known = CommandKind::ALL.map(|kind| kind.as_str());
        decode_command(value, &known)
    }
}

/// Commands an outside caller may submit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InboundCommand {
    RegisterCustomer(RegisterCustomerCommand),
    UpdateCustomer(UpdateCustomerCommand),
    DeactivateCustomer(DeactivateCustomerCommand),
    ReactivateCustomer(ReactivateCustomerCommand),
}

impl InboundCommand {
    /// Decode an inbound command; `CREATE_CUSTOMER` is not accepted here
    pub fn from_json(value: &serde_json::Value) -> CustomerResult<Self> {
        let known = [
            CommandKind::RegisterCustomer.as_str(),
            CommandKind::UpdateCustomer.as_str(),
            CommandKind::DeactivateCustomer.as_str(),
            CommandKind::ReactivateCustomer.as_str(),
        ];
        decode_command(value, &known)
    }
}

impl From<InboundCommand> for CustomerCommand {
    fn from(command: InboundCommand) -> Self {
        match command {
            InboundCommand::RegisterCustomer(c) => CustomerCommand::RegisterCustomer(c),
            InboundCommand::UpdateCustomer(c) => CustomerCommand::UpdateCustomer(c),
            InboundCommand::DeactivateCustomer(c) => CustomerCommand::DeactivateCustomer(c),
            InboundCommand::ReactivateCustomer(c) => CustomerCommand::ReactivateCustomer(c),
        }
    }
}
