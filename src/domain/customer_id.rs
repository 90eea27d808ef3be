// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer identifier value object

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Customer id validation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CustomerIdError {
    #[error("Customer id is empty")]
    Empty,

    #[error("Customer id exceeds maximum length of 128 characters: {0}")]
    TooLong(usize),

    #[error("Invalid character in customer id: {0:?}")]
    InvalidCharacter(char),
}

/// Identity of one customer entity and of its event stream
///
/// Invariants:
/// - Non-empty
/// - At most 128 characters
/// - No whitespace or control characters
///
/// # Examples
///
/// ```rust
/// use cim_customer::domain::CustomerId;
///
/// let id = CustomerId::new("C1").unwrap();
/// assert_eq!(id.as_str(), "C1");
///
/// assert!(CustomerId::new("").is_err());
/// assert!(CustomerId::new("C 1").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CustomerId(String);

impl CustomerId {
    /// Maximum length in characters
    pub const MAX_LENGTH: usize = 128;

    /// Create a new customer id with validation
    pub fn new(id: impl Into<String>) -> Result<Self, CustomerIdError> {
        let id = id.into();

        if id.is_empty() {
            return Err(CustomerIdError::Empty);
        }

        let length = id.chars().count();
        if length > Self::MAX_LENGTH {
            return Err(CustomerIdError::TooLong(length));
        }

        if let Some(ch) = id.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(CustomerIdError::InvalidCharacter(ch));
        }

        Ok(Self(id))
    }

    /// Get the id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CustomerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for CustomerId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for CustomerId {
    type Error = CustomerIdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for CustomerId {
    type Error = CustomerIdError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<CustomerId> for String {
    fn from(id: CustomerId) -> Self {
        id.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert!(CustomerId::new("C1").is_ok());
        assert!(CustomerId::new("0190a6c2-7f4e-7c3a-9d1e-5b2f8a4c6e10").is_ok());
        assert!(CustomerId::new("x".repeat(CustomerId::MAX_LENGTH)).is_ok());
    }

    #[test]
    fn test_invalid_ids() {
        assert_eq!(CustomerId::new(""), Err(CustomerIdError::Empty));
        assert_eq!(
            CustomerId::new("x".repeat(129)),
            Err(CustomerIdError::TooLong(129))
        );
        assert_eq!(
            CustomerId::new("C 1"),
            Err(CustomerIdError::InvalidCharacter(' '))
        );
        assert_eq!(
            CustomerId::new("C\n1"),
            Err(CustomerIdError::InvalidCharacter('\n'))
        );
    }

    #[test]
    fn test_serde_validates() {
        let id: CustomerId = serde_json::from_str("\"C1\"").unwrap();
        assert_eq!(id.as_str(), "C1");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"C1\"");

        assert!(serde_json::from_str::<CustomerId>("\"\"").is_err());
    }
}
