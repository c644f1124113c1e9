// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapters for the managed backend: REST rows, email auth and realtime
//! change feeds.
//!
//! All three share one [`SupabaseClient`], so signing in through
//! [`SupabaseAuth`] changes the role that [`SupabaseRest`] and
//! [`SupabaseRealtime`] act as.

pub mod auth;
pub mod client;
pub mod realtime;
pub mod rest;

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use ptokyo_config::PtokyoConfig;
use ptokyo_core::PtokyoError;

pub use auth::SupabaseAuth;
pub use client::SupabaseClient;
pub use realtime::{JOIN_TIMEOUT, SupabaseRealtime};
pub use rest::SupabaseRest;

/// The three adapters wired to one project.
pub struct SupabaseBackend {
    pub rest: Arc<SupabaseRest>,
    pub auth: Arc<SupabaseAuth>,
    pub realtime: Arc<SupabaseRealtime>,
}

impl SupabaseBackend {
    /// Build every adapter from the `[supabase]` section.
    pub fn from_config(config: &PtokyoConfig, anon_key: SecretString) -> Result<Self, PtokyoError> {
        let client = SupabaseClient::from_config(config, anon_key)?;
        Ok(Self {
            rest: Arc::new(SupabaseRest::new(client.clone())),
            auth: Arc::new(SupabaseAuth::new(client.clone())),
            realtime: Arc::new(SupabaseRealtime::new(
                client,
                Duration::from_secs(config.supabase.realtime_heartbeat_secs),
            )),
        })
    }
}
