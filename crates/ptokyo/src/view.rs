// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! View lifecycle: mounting opens the realtime bridges a view needs and
//! fetches its data; dropping the mounted view closes them.

use std::sync::Arc;

use tracing::{info, warn};

use ptokyo_core::{PtokyoError, RealtimeAdapter, Table};
use ptokyo_store::{AppMode, BridgeHandle, RealtimeBridge, Store};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Canvas,
    Presence,
}

impl View {
    pub fn tables(self) -> &'static [Table] {
        match self {
            View::Canvas => &[Table::Items, Table::Clusters],
            View::Presence => &[Table::Profiles, Table::Bonfires],
        }
    }

    pub fn mode(self) -> AppMode {
        match self {
            View::Canvas => AppMode::Silence,
            View::Presence => AppMode::Glitch,
        }
    }

    pub fn for_mode(mode: AppMode) -> Self {
        match mode {
            AppMode::Silence => View::Canvas,
            AppMode::Glitch => View::Presence,
        }
    }
}

/// A view with its open bridges.
pub struct MountedView {
    view: View,
    bridges: Vec<BridgeHandle>,
}

impl MountedView {
    pub fn view(&self) -> View {
        self.view
    }

    /// One bridge per table the view reads.
    pub fn bridge_count(&self) -> usize {
        self.bridges.len()
    }
}

impl Drop for MountedView {
    fn drop(&mut self) {
        info!(view = ?self.view, bridges = self.bridge_count(), "view unmounted");
    }
}

/// Subscribe first, then fetch, so no change lands between the two.
///
/// Fetch failures keep the previous data and do not fail the mount.
pub async fn mount(
    store: &Store,
    realtime: Arc<dyn RealtimeAdapter>,
    view: View,
) -> Result<MountedView, PtokyoError> {
    let mut bridges = Vec::with_capacity(view.tables().len());
    for &table in view.tables() {
        bridges.push(RealtimeBridge::attach(store, realtime.clone(), table).await?);
    }

    let fetched = match view {
        View::Canvas => store.fetch_canvas().await,
        View::Presence => store.fetch_profiles().await,
    };
    if let Err(e) = fetched {
        warn!(view = ?view, error = %e, "view data is stale");
    }

    info!(view = ?view, bridges = bridges.len(), "view mounted");
    Ok(MountedView { view, bridges })
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use ptokyo_store::StoreSettings;
    use ptokyo_test_utils::{MockAuth, MockRemote, RemoteOp};
    use serde_json::json;

    use super::*;

    fn store(remote: &MockRemote) -> Store {
        Store::new(
            Arc::new(remote.clone()),
            Arc::new(MockAuth::signed_in("u1")),
            StoreSettings::default(),
        )
    }

    #[tokio::test]
    async fn canvas_mount_subscribes_and_fetches() {
        let remote = MockRemote::new();
        remote.seed(
            Table::Items,
            vec![json!({
                "id": "i1", "user_id": "u2", "type": "text", "content": "neon",
                "position_x": 0.0, "position_y": 0.0, "created_at": "2026-01-01T00:00:00Z"
            })],
        );
        let store = store(&remote);
        let mounted = mount(&store, Arc::new(remote.clone()), View::Canvas).await.unwrap();

        assert_eq!(mounted.view(), View::Canvas);
        assert_eq!(mounted.bridge_count(), View::Canvas.tables().len());
        assert_eq!(remote.subscriber_count(Table::Items), 1);
        assert_eq!(remote.subscriber_count(Table::Clusters), 1);
        assert_eq!(store.items().len(), 1);
    }

    #[tokio::test]
    async fn dropping_the_view_closes_its_bridges() {
        let remote = MockRemote::new();
        let store = store(&remote);
        let canvas = mount(&store, Arc::new(remote.clone()), View::Canvas).await.unwrap();
        drop(canvas);
        let presence = mount(&store, Arc::new(remote.clone()), View::Presence).await.unwrap();

        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(remote.subscriber_count(Table::Items), 0);
        assert_eq!(remote.subscriber_count(Table::Profiles), 1);
        assert_eq!(remote.subscriber_count(Table::Bonfires), 1);
        assert_eq!(presence.view(), View::Presence);
        assert_eq!(remote.calls_to(Table::Profiles, RemoteOp::Select).len(), 1);
    }

    #[tokio::test]
    async fn fetch_failure_still_mounts() {
        let remote = MockRemote::new();
        remote.fail_on(Table::Items, RemoteOp::Select);
        let store = store(&remote);
        let mounted = mount(&store, Arc::new(remote.clone()), View::Canvas).await;
        assert!(mounted.is_ok());
    }

    #[test]
    fn views_map_to_modes() {
        assert_eq!(View::for_mode(View::Presence.mode()), View::Presence);
        assert_eq!(View::Canvas.mode(), AppMode::Silence);
    }
}
