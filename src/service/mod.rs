// Copyright (c) 2025 - Cowboy AI, Inc.
//! Service Layer
//!
//! Command handlers that connect the pure customer aggregate to the event log.
//!
//! # Architecture
//!
//! ```text
//! CommandRouter
//!     ↓
//! Service Layer (this module)
//!     ↓
//! read history → fold → decide → store_events(expected_version)
//!     ↓
//! Event Store ──notify──> Projector, Saga
//! ```

pub mod customer;

pub use customer::CustomerCommandHandler;
