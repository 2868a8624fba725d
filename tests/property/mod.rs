// Copyright (c) 2025 - Cowboy AI, Inc.
//! Property-Based Tests Module
//!
//! Property-based tests using proptest for aggregate replay, persistence
//! and projection.

mod event_application;
mod points_mapping;
