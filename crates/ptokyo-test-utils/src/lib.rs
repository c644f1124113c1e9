// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Parallel Tokyo.
//!
//! Provides in-memory adapters so store, bridge and oracle tests run fast and
//! deterministically without a backend or API keys.
//!
//! # Components
//!
//! - [`MockRemote`] - row store and realtime feed with failure injection
//! - [`MockAuth`] - single-session auth
//! - [`MockGenerator`] - scripted text generator

pub mod mock_auth;
pub mod mock_generator;
pub mod mock_remote;

pub use mock_auth::{MockAuth, session_for};
pub use mock_generator::MockGenerator;
pub use mock_remote::{InsertGate, MockRemote, RemoteCall, RemoteOp};
