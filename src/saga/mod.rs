// Copyright (c) 2025 - Cowboy AI, Inc.
//! Process managers
//!
//! Sagas enforce invariants that span more than one aggregate. They react to
//! notifications, query read models and answer with commands through the
//! [`CommandRouter`](crate::router::CommandRouter) or with events on the error
//! channel. They never write to the event log or a read model themselves.
//!
//! ```text
//! CUSTOMER_REGISTERED ──> UniqueEmailSaga ──find(email)──> customer list
//!                               │
//!                 unique ───────┴─────── taken
//!                   │                      │
//!           CREATE_CUSTOMER      CUSTOMER_EXISTING_EMAIL_FOUND
//!            (command router)          (error channel)
//! ```

pub mod unique_email;

pub use unique_email::UniqueEmailSaga;
