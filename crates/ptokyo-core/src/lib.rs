// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Parallel Tokyo client.
//!
//! This crate provides the domain records, the shared error type, and the
//! adapter traits that sit between the client state store and the managed
//! services it talks to (row store, realtime feed, auth, text generation).

pub mod error;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::PtokyoError;
pub use types::{
    AdapterType, Bonfire, ChangeFeed, ChangeKind, Cluster, CompletionRequest,
    CompletionResponse, Credentials, Filter, HealthStatus, Item, ItemKind, Layout, LayoutCluster,
    MoodStatus, NewBonfire, NewItem, Placement, Profile, RawChange, Record, Session, SignUpOutcome,
    Table, User, VisualBonfire,
};

pub use traits::{
    AuthAdapter, GenerationAdapter, PluginAdapter, RealtimeAdapter, RemoteDataService,
};
