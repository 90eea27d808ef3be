// Copyright (c) 2025 - Cowboy AI, Inc.
//! Pure Projection System
//!
//! Projections are pure functions: `(State, &Event) → Result<(State, Effects), Error>`.
//! Side effects are returned as data, not performed; an executor performs them.
//!
//! ```text
//! Pure Projection Function          Side Effect Executor
//! ─────────────────────────         ──────────────────────
//!
//! (State, Event)                    Effects
//!      │                                 │
//!      ▼                                 ▼
//! ┌──────────────┐                 ┌──────────────┐
//! │   project()  │    Effects      │   execute()  │
//! │  pure func   │ ─────────────>  │  async I/O   │
//! └──────────────┘                 └──────────────┘
//!      │                                 │
//!      ▼                                 ▼
//! (New State, Effects)              Updated Read Model
//! ```
//!
//! Replay is a fold of the event history through the projection function.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::ProjectionError;

/// Side effects that can be produced by projections
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SideEffect {
    /// Create a record; fails if the key exists
    Insert {
        collection: String,
        key: String,
        record: Value,
    },

    /// Merge `changes` into an existing record; fails if the key is absent
    Update {
        collection: String,
        key: String,
        changes: Value,
    },

    /// Log a message
    Log { level: LogLevel, message: String },
}

/// Log levels for logging side effects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogLevel {
    Debug,
    Info,
    Warn,
    Error,
}

/// Projection result type
pub type ProjectionResult<S> = Result<(S, Vec<SideEffect>), ProjectionError>;

/// Pure projection function type
///
/// # Example
///
/// ```rust,ignore
/// fn my_projection(state: MyState, event: &MyEvent) -> ProjectionResult<MyState> {
///     // Pure logic - no I/O!
///     let new_state = state.apply(event);
///     Ok((new_state, vec![SideEffect::Insert { /* ... */ }]))
/// }
/// ```
pub type PureProjection<S, E> = fn(S, &E) -> ProjectionResult<S>;

/// Fold a sequence of events through a pure projection
///
/// Stops at the first event the projection rejects.
pub fn fold_projection<'a, S, E, I>(projection: PureProjection<S, E>, initial_state: S, events: I) -> ProjectionResult<S>
where
    E: 'a,
    I: IntoIterator<Item = &'a E>,
{
    events
        .into_iter()
        .try_fold((initial_state, Vec::new()), |(state, mut all_effects), event| {
            let (new_state, mut effects) = projection(state, event)?;
            all_effects.append(&mut effects);
            Ok((new_state, all_effects))
        })
}
