// Copyright (c) 2025 - Cowboy AI, Inc.
//! Customer Domain Value Objects
//!
//! - [`CustomerId`] - validated identity of a customer and its event stream

pub mod customer_id;

pub use customer_id::{CustomerId, CustomerIdError};
