// Copyright (c) 2025 - Cowboy AI, Inc.
//! Error types for the customer runtime

use thiserror::Error;

use crate::aggregate::commands::CommandKind;
use crate::aggregate::handlers::CommandError;
use crate::aggregate::FoldError;
use crate::domain::{CustomerId, CustomerIdError};
use crate::event_store::ConcurrencyConflict;
use crate::projection::ProjectionError;

/// Errors that can occur anywhere in the customer runtime
#[derive(Debug, Error)]
pub enum CustomerError {
    /// A command was rejected by the customer aggregate
    #[error(transparent)]
    Command(#[from] CommandError),

    /// Entity identifier failed validation
    #[error("Invalid customer id: {0}")]
    InvalidEntityId(#[from] CustomerIdError),

    /// Optimistic concurrency check failed; the caller may reload and retry
    #[error(transparent)]
    Concurrency(#[from] ConcurrencyConflict),

    /// Stored history could not be folded onto the aggregate
    #[error("Corrupt history: {0}")]
    CorruptHistory(#[from] FoldError),

    /// A command or event carried a kind this build does not know
    #[error("unrecognised kind: {0}")]
    UnrecognizedKind(String),

    /// A persisted log failed its integrity checks on load
    #[error("Invalid event log: {0}")]
    InvalidLog(String),

    /// An event addressed to one entity was appended to another entity's stream
    #[error("Event for {found} cannot be stored in stream {stream}")]
    StreamMismatch { stream: CustomerId, found: CustomerId },

    /// A handler is already registered for the command kind
    #[error("handler already registered: {0}")]
    HandlerAlreadyRegistered(CommandKind),

    /// No handler is registered for the command kind
    #[error("handler not registered: {0}")]
    HandlerNotRegistered(CommandKind),

    /// Read model failure
    #[error(transparent)]
    Projection(#[from] ProjectionError),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Timeout error
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// A background component went away while a caller was waiting on it
    #[error("Channel closed: {0}")]
    ChannelClosed(String),
}

/// Result type for customer runtime operations
pub type CustomerResult<T> = Result<T, CustomerError>;

impl CustomerError {
    /// Malformed input, rejected before any state was read
    pub fn is_invalid_argument(&self) -> bool {
        matches!(
            self,
            CustomerError::Command(CommandError::InvalidArgument { .. })
                | CustomerError::InvalidEntityId(_)
        )
    }

    /// The command was well formed but the lifecycle forbids it
    pub fn is_rule_violation(&self) -> bool {
        matches!(self, CustomerError::Command(err) if err.is_rule_violation())
    }

    /// Only concurrency conflicts are worth retrying after a reload
    pub fn is_retryable(&self) -> bool {
        matches!(self, CustomerError::Concurrency(_))
    }

    /// Errors that indicate the log or read model can no longer be trusted
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            CustomerError::UnrecognizedKind(_)
                | CustomerError::CorruptHistory(_)
                | CustomerError::InvalidLog(_)
                | CustomerError::Projection(ProjectionError::OutOfSync(_))
        )
    }
}

impl From<serde_json::Error> for CustomerError {
    fn from(err: serde_json::Error) -> Self {
        CustomerError::Serialization(err.to_string())
    }
}
