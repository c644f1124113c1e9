// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime adapter trait for per-table change notifications.

use async_trait::async_trait;

use crate::error::PtokyoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChangeFeed, ChangeKind, Table};

/// Adapter that streams insert/update/delete notifications for a table.
///
/// Subscriptions are independent: each call opens a new feed, and events
/// that happen while no feed is open are not replayed.
#[async_trait]
pub trait RealtimeAdapter: PluginAdapter {
    /// Opens a change feed for `table`, limited to the given change kinds.
    async fn subscribe(
        &self,
        table: Table,
        kinds: &[ChangeKind],
    ) -> Result<ChangeFeed, PtokyoError>;
}
