// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The client state store.
//!
//! `Store` is a cloneable handle to one shared [`CanvasState`]. Actions mutate
//! local state first and then reconcile with the remote data service. Each
//! mutation takes the write lock once, releases it, and then broadcasts a
//! single [`StoreEvent`] naming the slice that changed.

use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, Weak};
use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use tokio::sync::broadcast;
use tracing::{debug, error, info, warn};

use ptokyo_core::traits::{fetch_records, insert_record};
use ptokyo_core::{
    AuthAdapter, Bonfire, Cluster, Filter, Item, ItemKind, Layout, MoodStatus, NewBonfire,
    NewItem, Profile, PtokyoError, Record, RemoteDataService, Table, VisualBonfire,
};

use crate::optimistic::{PendingWrite, is_placeholder};
use crate::presence::{self, active_cutoff};
use crate::realtime::{ChangeEvent, apply_change};
use crate::state::{AppMode, CanvasState, StoreEvent};

/// Capacity of the change notification channel.
const EVENT_CAPACITY: usize = 256;

/// Highest intensity a bonfire can carry.
pub const MAX_INTENSITY: i32 = 10;

/// Timing knobs for the store.
#[derive(Debug, Clone)]
pub struct StoreSettings {
    /// Profiles active within this window count as present.
    pub active_window: Duration,
    /// How long a bonfire animation stays on screen.
    pub bonfire_ttl: Duration,
    /// How long a generated message stays on screen.
    pub message_ttl: Duration,
    /// Pause between a burn request and its broadcast.
    pub burn_delay: Duration,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            active_window: Duration::from_secs(3600),
            bonfire_ttl: Duration::from_secs(5),
            message_ttl: Duration::from_secs(10),
            burn_delay: Duration::from_millis(1500),
        }
    }
}

struct StoreInner {
    remote: Arc<dyn RemoteDataService>,
    auth: Arc<dyn AuthAdapter>,
    settings: StoreSettings,
    state: RwLock<CanvasState>,
    events: broadcast::Sender<StoreEvent>,
}

/// Shared handle to the client state.
#[derive(Clone)]
pub struct Store {
    inner: Arc<StoreInner>,
}

impl Store {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        auth: Arc<dyn AuthAdapter>,
        settings: StoreSettings,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            inner: Arc::new(StoreInner {
                remote,
                auth,
                settings,
                state: RwLock::new(CanvasState::default()),
                events,
            }),
        }
    }

    pub fn settings(&self) -> &StoreSettings {
        &self.inner.settings
    }

    /// Receive a [`StoreEvent`] after every state transition.
    pub fn subscribe(&self) -> broadcast::Receiver<StoreEvent> {
        self.inner.events.subscribe()
    }

    fn read(&self) -> RwLockReadGuard<'_, CanvasState> {
        self.inner.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    /// Apply `f` under the write lock, then announce `event`.
    fn mutate<R>(&self, event: StoreEvent, f: impl FnOnce(&mut CanvasState) -> R) -> R {
        let result = {
            let mut state = self
                .inner
                .state
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            f(&mut state)
        };
        // No receivers is fine: nothing is mounted.
        let _ = self.inner.events.send(event);
        result
    }

    // --- snapshots ---

    pub fn snapshot(&self) -> CanvasState {
        self.read().clone()
    }

    pub fn items(&self) -> Vec<Item> {
        self.read().items.clone()
    }

    pub fn item(&self, id: &str) -> Option<Item> {
        self.read().items.iter().find(|i| i.id == id).cloned()
    }

    pub fn clusters(&self) -> Vec<Cluster> {
        self.read().clusters.clone()
    }

    pub fn profiles(&self) -> Vec<Profile> {
        self.read().profiles.clone()
    }

    pub fn bonfires(&self) -> Vec<VisualBonfire> {
        self.read().bonfires.clone()
    }

    pub fn bonfire_log(&self) -> Vec<Bonfire> {
        self.read().bonfire_log.clone()
    }

    pub fn current_user_status(&self) -> MoodStatus {
        self.read().current_user_status
    }

    pub fn mode(&self) -> AppMode {
        self.read().mode
    }

    pub fn scale(&self) -> f64 {
        self.read().scale
    }

    pub fn offset(&self) -> (f64, f64) {
        self.read().offset
    }

    pub fn is_loading(&self) -> bool {
        self.read().is_loading
    }

    /// Id of the signed-in user, if any.
    pub async fn current_user_id(&self) -> Option<String> {
        self.inner.auth.current_user().await.map(|u| u.id)
    }

    async fn require_user(&self, action: &str) -> Result<String, PtokyoError> {
        match self.current_user_id().await {
            Some(id) => Ok(id),
            None => {
                warn!(action, "action requires a signed-in user");
                Err(PtokyoError::NotAuthenticated)
            }
        }
    }

    // --- fetching ---

    /// Replace the local collection for `table` with the remote one.
    ///
    /// On failure the previous collection stays in place.
    pub async fn fetch_all(&self, table: Table) -> Result<(), PtokyoError> {
        match table {
            Table::Items => {
                let items = self.fetch_table::<Item>().await?;
                self.set_items(items);
            }
            Table::Clusters => {
                let clusters = self.fetch_table::<Cluster>().await?;
                self.set_clusters(clusters);
            }
            Table::Profiles => self.fetch_profiles().await?,
            Table::Bonfires => {
                let log = self.fetch_table::<Bonfire>().await?;
                self.mutate(StoreEvent::BonfireLog, |s| s.bonfire_log = log);
            }
        }
        Ok(())
    }

    async fn fetch_table<T>(&self) -> Result<Vec<T>, PtokyoError>
    where
        T: Record + serde::de::DeserializeOwned,
    {
        let result = fetch_records::<T>(self.inner.remote.as_ref(), Filter::All).await;
        match &result {
            Ok(rows) => debug!(table = %T::TABLE, count = rows.len(), "fetched"),
            Err(e) => error!(table = %T::TABLE, error = %e, "fetch failed, keeping local state"),
        }
        result
    }

    /// Load items and clusters, flagging `is_loading` for the duration.
    pub async fn fetch_canvas(&self) -> Result<(), PtokyoError> {
        self.mutate(StoreEvent::Loading, |s| s.is_loading = true);
        let items = self.fetch_all(Table::Items).await;
        let clusters = self.fetch_all(Table::Clusters).await;
        self.mutate(StoreEvent::Loading, |s| s.is_loading = false);
        items.and(clusters)
    }

    /// Load profiles active within the configured window, measured from now.
    pub async fn fetch_profiles(&self) -> Result<(), PtokyoError> {
        self.fetch_profiles_at(Utc::now()).await
    }

    /// Load profiles whose `last_active_at` is strictly after `now - active_window`.
    pub async fn fetch_profiles_at(&self, now: chrono::DateTime<Utc>) -> Result<(), PtokyoError> {
        let window = self.inner.settings.active_window;
        let filter = match active_cutoff(now, window) {
            Some(cutoff) => Filter::GreaterThan {
                column: "last_active_at".to_string(),
                value: json!(cutoff.to_rfc3339()),
            },
            None => Filter::All,
        };

        let profiles = fetch_records::<Profile>(self.inner.remote.as_ref(), filter)
            .await
            .inspect_err(|e| error!(error = %e, "profile fetch failed, keeping local state"))?;

        let active: Vec<Profile> = profiles
            .into_iter()
            .filter(|p| presence::is_active(p, now, window))
            .collect();
        debug!(count = active.len(), "active profiles fetched");
        self.mutate(StoreEvent::Profiles, |s| s.profiles = active);
        Ok(())
    }

    // --- canvas actions ---

    /// Add an item optimistically.
    ///
    /// The item is visible under a placeholder id before the insert is sent.
    /// On success the placeholder is swapped for the server record; on
    /// failure it is removed and the error returned.
    pub async fn add_item(
        &self,
        kind: ItemKind,
        content: impl Into<String>,
        x: f64,
        y: f64,
    ) -> Result<Item, PtokyoError> {
        let owner = self.require_user("add_item").await?;
        let payload = NewItem {
            owner,
            kind,
            content: content.into(),
            x,
            y,
        };

        let mut write = PendingWrite::begin();
        let placeholder_id = write.placeholder_id().to_string();
        let placeholder = payload
            .clone()
            .into_placeholder(placeholder_id.clone(), Utc::now());
        self.mutate(StoreEvent::Items, |s| s.items.push(placeholder));
        debug!(placeholder = %placeholder_id, "item added optimistically");

        match insert_record::<Item, NewItem>(self.inner.remote.as_ref(), &payload).await {
            Ok(stored) => {
                write.commit(stored.id.clone())?;
                let (committed, moved) = self.mutate(StoreEvent::Items, |s| {
                    commit_placeholder(&mut s.items, &placeholder_id, stored)
                });
                info!(id = %committed.id, "item committed");
                if moved {
                    // The user moved the placeholder while the insert was in flight.
                    let _ = self
                        .push_position(&committed.id, committed.x, committed.y)
                        .await;
                }
                Ok(committed)
            }
            Err(e) => {
                write.roll_back()?;
                self.mutate(StoreEvent::Items, |s| {
                    s.items.retain(|i| i.id != placeholder_id)
                });
                error!(
                    placeholder = %placeholder_id,
                    error = %e,
                    "item insert failed, rolled back"
                );
                Err(e)
            }
        }
    }

    /// Move an item locally, then send the new position.
    ///
    /// A failed remote update is logged and returned but not rolled back.
    pub async fn update_item_position(&self, id: &str, x: f64, y: f64) -> Result<(), PtokyoError> {
        let found = self.mutate(StoreEvent::Items, |s| {
            s.items.iter_mut().find(|i| i.id == id).map(|item| {
                item.x = x;
                item.y = y;
            })
        });
        if found.is_none() {
            return Err(PtokyoError::NotFound {
                table: Table::Items,
                id: id.to_string(),
            });
        }
        if is_placeholder(id) {
            // Carried over when the insert commits.
            return Ok(());
        }
        self.push_position(id, x, y).await
    }

    async fn push_position(&self, id: &str, x: f64, y: f64) -> Result<(), PtokyoError> {
        self.inner
            .remote
            .update(Table::Items, id, json!({ "position_x": x, "position_y": y }))
            .await
            .inspect_err(|e| warn!(id, error = %e, "position update failed, local position kept"))
    }

    /// Move every item named in `layout`, in order. Returns how many were moved.
    pub async fn apply_layout(&self, layout: &Layout) -> usize {
        let mut moved = 0;
        for placement in layout.placements() {
            match self
                .update_item_position(&placement.id, placement.x, placement.y)
                .await
            {
                Ok(()) => moved += 1,
                Err(PtokyoError::NotFound { id, .. }) => {
                    warn!(id, "layout names an unknown item, skipped");
                }
                // The local move already happened.
                Err(_) => moved += 1,
            }
        }
        info!(moved, "layout applied");
        moved
    }

    pub fn set_items(&self, items: Vec<Item>) {
        self.mutate(StoreEvent::Items, |s| s.items = items);
    }

    pub fn set_clusters(&self, clusters: Vec<Cluster>) {
        self.mutate(StoreEvent::Clusters, |s| s.clusters = clusters);
    }

    /// Set the canvas zoom. Must be finite and positive.
    pub fn set_scale(&self, scale: f64) -> Result<(), PtokyoError> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(PtokyoError::InvalidInput(format!(
                "scale must be a positive number, got {scale}"
            )));
        }
        self.mutate(StoreEvent::Viewport, |s| s.scale = scale);
        Ok(())
    }

    pub fn set_offset(&self, x: f64, y: f64) {
        self.mutate(StoreEvent::Viewport, |s| s.offset = (x, y));
    }

    /// Switch between the canvas and presence experiences.
    pub fn toggle_mode(&self) -> AppMode {
        self.mutate(StoreEvent::Mode, |s| {
            s.mode = s.mode.toggled();
            s.mode
        })
    }

    // --- presence actions ---

    /// Set the user's mood locally, then upsert their profile.
    ///
    /// The local change happens even when signed out; the upsert is then skipped.
    pub async fn update_status(&self, status: MoodStatus) -> Result<(), PtokyoError> {
        let user_id = self.current_user_id().await;
        let now = Utc::now();

        self.mutate(StoreEvent::Status, |s| {
            s.current_user_status = status;
            let Some(user_id) = user_id.as_deref() else {
                return;
            };
            match s.profiles.iter_mut().find(|p| p.id == user_id) {
                Some(profile) => {
                    profile.status = status;
                    profile.last_active_at = now;
                }
                None => s.profiles.push(Profile {
                    id: user_id.to_string(),
                    status,
                    color_theme: "default".to_string(),
                    last_active_at: now,
                }),
            }
        });

        let Some(user_id) = user_id else {
            warn!(%status, "not signed in, status kept local only");
            return Ok(());
        };

        self.inner
            .remote
            .upsert(
                Table::Profiles,
                json!({
                    "id": user_id,
                    "status": status,
                    "last_active_at": now.to_rfc3339(),
                }),
            )
            .await
            .inspect_err(|e| warn!(error = %e, "status upsert failed, local status kept"))
    }

    /// Persist a bonfire event carrying only its intensity, clamped to `1..=10`.
    pub async fn add_bonfire_broadcast(&self, intensity: i32) -> Result<Bonfire, PtokyoError> {
        let owner = self.require_user("add_bonfire_broadcast").await?;
        let payload = NewBonfire {
            owner,
            intensity: intensity.clamp(1, MAX_INTENSITY),
        };
        insert_record::<Bonfire, NewBonfire>(self.inner.remote.as_ref(), &payload)
            .await
            .inspect(|b| debug!(id = %b.id, intensity = b.intensity, "bonfire broadcast"))
            .inspect_err(|e| error!(error = %e, "bonfire broadcast failed"))
    }

    /// Show a bonfire locally for the bonfire lifetime. Needs a tokio runtime.
    pub fn add_local_bonfire(&self, record: VisualBonfire) {
        self.show_visual(record, self.inner.settings.bonfire_ttl);
    }

    /// Show a generated message locally for the message lifetime. Needs a tokio runtime.
    pub fn add_local_message(&self, record: VisualBonfire) {
        self.show_visual(record, self.inner.settings.message_ttl);
    }

    fn show_visual(&self, record: VisualBonfire, ttl: Duration) {
        let id = record.id.clone();
        self.mutate(StoreEvent::Bonfires, |s| {
            s.bonfires.retain(|b| b.id != record.id);
            s.bonfires.push(record);
        });
        self.schedule_expiry(id, ttl);
    }

    /// Remove `id` from the visual bonfires after `ttl`, unless the store is gone.
    fn schedule_expiry(&self, id: String, ttl: Duration) {
        let store: Weak<StoreInner> = Arc::downgrade(&self.inner);
        tokio::spawn(async move {
            tokio::time::sleep(ttl).await;
            if let Some(inner) = store.upgrade() {
                Store { inner }.expire_visual(&id);
            }
        });
    }

    fn expire_visual(&self, id: &str) {
        self.mutate(StoreEvent::Bonfires, |s| s.bonfires.retain(|b| b.id != id));
        debug!(id, "visual expired");
    }

    /// Burn a worry: after the burn delay, show `text` locally at the user's
    /// position and broadcast its intensity. The text never leaves the client.
    pub async fn burn(&self, text: &str) -> Result<VisualBonfire, PtokyoError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(PtokyoError::InvalidInput("nothing to burn".to_string()));
        }
        let intensity = i32::try_from(text.chars().count())
            .unwrap_or(MAX_INTENSITY)
            .min(MAX_INTENSITY);

        tokio::time::sleep(self.inner.settings.burn_delay).await;

        let user_id = self.current_user_id().await;
        let point = presence::project(user_id.as_deref().unwrap_or_default());
        let visual = VisualBonfire {
            id: uuid::Uuid::new_v4().to_string(),
            x: point.x,
            y: point.y,
            intensity,
            text: text.to_string(),
            created_at: Utc::now(),
        };
        self.add_local_bonfire(visual.clone());

        if let Err(e) = self.add_bonfire_broadcast(intensity).await {
            warn!(error = %e, "burn shown locally only");
        }
        Ok(visual)
    }

    // --- realtime entry points ---

    pub(crate) fn splice_items(&self, change: ChangeEvent<Item>) {
        self.mutate(StoreEvent::Items, |s| apply_change(&mut s.items, change));
    }

    pub(crate) fn splice_clusters(&self, change: ChangeEvent<Cluster>) {
        self.mutate(StoreEvent::Clusters, |s| apply_change(&mut s.clusters, change));
    }
}

/// Swap the placeholder for the stored record, keeping ids unique.
///
/// Returns the committed item and whether the placeholder had been moved
/// locally (its position then wins over the stored one).
fn commit_placeholder(items: &mut Vec<Item>, placeholder_id: &str, stored: Item) -> (Item, bool) {
    let mut committed = stored;
    let placeholder = items.iter().position(|i| i.id == placeholder_id);
    let echo = items.iter().position(|i| i.id == committed.id);

    let mut moved = false;
    if let Some(idx) = placeholder {
        let local = &items[idx];
        moved = local.x != committed.x || local.y != committed.y;
        committed.x = local.x;
        committed.y = local.y;
    }

    match (placeholder, echo) {
        // A realtime echo already delivered the durable record.
        (Some(p), Some(e)) => {
            items[e] = committed.clone();
            items.remove(p);
        }
        (Some(p), None) => items[p] = committed.clone(),
        (None, Some(e)) => items[e] = committed.clone(),
        (None, None) => items.push(committed.clone()),
    }
    (committed, moved)
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;

    fn item(id: &str, x: f64) -> Item {
        Item {
            id: id.into(),
            owner: "u1".into(),
            kind: ItemKind::Text,
            content: "hello".into(),
            x,
            y: 0.0,
            cluster_id: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn commit_replaces_placeholder_in_place() {
        let mut items = vec![item("temp-1", 0.0), item("other", 3.0)];
        let (committed, moved) = commit_placeholder(&mut items, "temp-1", item("d1", 0.0));
        assert!(!moved);
        assert_eq!(committed.id, "d1");
        let ids: Vec<&str> = items.iter().map(|i| i.id.as_str()).collect();
        assert_eq!(ids, ["d1", "other"]);
    }

    #[test]
    fn commit_after_echo_does_not_duplicate() {
        let mut items = vec![item("temp-1", 0.0), item("d1", 0.0)];
        commit_placeholder(&mut items, "temp-1", item("d1", 0.0));
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].id, "d1");
    }

    #[test]
    fn commit_keeps_local_move() {
        let mut items = vec![item("temp-1", 42.0)];
        let (committed, moved) = commit_placeholder(&mut items, "temp-1", item("d1", 0.0));
        assert!(moved);
        assert_eq!(committed.x, 42.0);
        assert_eq!(items[0].x, 42.0);
    }

    #[tokio::test]
    #[traced_test]
    async fn rollback_is_logged() {
        use ptokyo_test_utils::{MockAuth, MockRemote, RemoteOp};

        let remote = Arc::new(MockRemote::new());
        remote.fail_on(Table::Items, RemoteOp::Insert);
        let store = Store::new(
            remote,
            Arc::new(MockAuth::signed_in("u1")),
            StoreSettings::default(),
        );

        assert!(store.add_item(ItemKind::Text, "x", 0.0, 0.0).await.is_err());
        assert!(logs_contain("item insert failed, rolled back"));
    }

    #[test]
    fn app_mode_toggles() {
        assert_eq!(AppMode::Silence.toggled(), AppMode::Glitch);
        assert_eq!(AppMode::Glitch.toggled().to_string(), "silence");
    }
}
