// Copyright (c) 2025 - Cowboy AI, Inc.
//! Runtime configuration
//!
//! Every setting has a default; [`CustomerConfig::from_env`] overrides them
//! from environment variables:
//!
//! | Variable | Setting |
//! |---|---|
//! | `CUSTOMER_REGISTRATION_TIMEOUT_MS` | how long `register_customer` waits for the saga |
//! | `CUSTOMER_SAGA_MODE` | `await_projection` or `fixed_delay` |
//! | `CUSTOMER_SAGA_TIMEOUT_MS` | watermark wait in `await_projection` mode |
//! | `CUSTOMER_SAGA_DELAY_MS` | sleep before the email check in `fixed_delay` mode |

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::errors::{CustomerError, CustomerResult};

pub const REGISTRATION_TIMEOUT_ENV: &str = "CUSTOMER_REGISTRATION_TIMEOUT_MS";
pub const SAGA_MODE_ENV: &str = "CUSTOMER_SAGA_MODE";
pub const SAGA_TIMEOUT_ENV: &str = "CUSTOMER_SAGA_TIMEOUT_MS";
pub const SAGA_DELAY_ENV: &str = "CUSTOMER_SAGA_DELAY_MS";

const DEFAULT_REGISTRATION_TIMEOUT_MS: u64 = 30_000;
const DEFAULT_PROJECTION_TIMEOUT_MS: u64 = 5_000;
const DEFAULT_FIXED_DELAY_MS: u64 = 300;

/// How the email uniqueness saga tolerates read-model lag
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum ConsistencyPolicy {
    /// Wait until the read model has projected the registration
    AwaitProjection { timeout_ms: u64 },

    /// Sleep, then check whatever the read model holds
    FixedDelay { delay_ms: u64 },
}

impl Default for ConsistencyPolicy {
    fn default() -> Self {
        ConsistencyPolicy::AwaitProjection {
            timeout_ms: DEFAULT_PROJECTION_TIMEOUT_MS,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SagaConfig {
    #[serde(default)]
    pub consistency: ConsistencyPolicy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerConfig {
    #[serde(default = "default_registration_timeout_ms")]
    pub registration_timeout_ms: u64,

    #[serde(default)]
    pub saga: SagaConfig,
}

fn default_registration_timeout_ms() -> u64 {
    DEFAULT_REGISTRATION_TIMEOUT_MS
}

impl Default for CustomerConfig {
    fn default() -> Self {
        Self {
            registration_timeout_ms: DEFAULT_REGISTRATION_TIMEOUT_MS,
            saga: SagaConfig::default(),
        }
    }
}

impl CustomerConfig {
    pub fn registration_timeout(&self) -> Duration {
        Duration::from_millis(self.registration_timeout_ms)
    }

    /// Load configuration from environment variables
    pub fn from_env() -> CustomerResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Load configuration from any variable source
    ///
    /// # Errors
    ///
    /// `Configuration` for an unknown saga mode or a value that is not a
    /// non-negative integer.
    pub fn from_lookup<F>(lookup: F) -> CustomerResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let millis = |name: &str, default: u64| -> CustomerResult<u64> {
            match lookup(name) {
                None => Ok(default),
                Some(raw) => raw.trim().parse().map_err(|_| {
                    CustomerError::Configuration(format!("{name} must be milliseconds, got {raw:?}"))
                }),
            }
        };

        let consistency = match lookup(SAGA_MODE_ENV).as_deref().map(str::trim) {
            None | Some("await_projection") => ConsistencyPolicy::AwaitProjection {
                timeout_ms: millis(SAGA_TIMEOUT_ENV, DEFAULT_PROJECTION_TIMEOUT_MS)?,
            },
            Some("fixed_delay") => ConsistencyPolicy::FixedDelay {
                delay_ms: millis(SAGA_DELAY_ENV, DEFAULT_FIXED_DELAY_MS)?,
            },
            Some(other) => {
                return Err(CustomerError::Configuration(format!(
                    "{SAGA_MODE_ENV} must be await_projection or fixed_delay, got {other:?}"
                )))
            }
        };

        Ok(Self {
            registration_timeout_ms: millis(
                REGISTRATION_TIMEOUT_ENV,
                DEFAULT_REGISTRATION_TIMEOUT_MS,
            )?,
            saga: SagaConfig { consistency },
        })
    }
}
