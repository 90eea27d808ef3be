// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Entry Point
//!
//! This test suite uses proptest to verify properties that must hold for
//! every accepted customer history.

mod fixtures;
mod property;
