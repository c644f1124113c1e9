// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter trait definitions.
//!
//! All adapters extend the [`PluginAdapter`] base trait and use
//! `#[async_trait]` for dynamic dispatch compatibility.

pub mod adapter;
pub mod auth;
pub mod generation;
pub mod realtime;
pub mod remote;

pub use adapter::PluginAdapter;
pub use auth::AuthAdapter;
pub use generation::GenerationAdapter;
pub use realtime::RealtimeAdapter;
pub use remote::{RemoteDataService, decode_row, fetch_records, insert_record};
