// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime synchronization bridge.
//!
//! Turns change notifications from a [`RealtimeAdapter`] into store
//! mutations. A bridge is opened per table when a view mounts and closed when
//! it unmounts; changes that arrive while no bridge is open are lost until the
//! next fetch.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ptokyo_core::traits::decode_row;
use ptokyo_core::{
    Bonfire, ChangeKind, Cluster, Item, PtokyoError, RawChange, RealtimeAdapter, Record, Table,
    VisualBonfire,
};

use crate::presence;
use crate::store::Store;

/// Text shown for bonfires lit by other users; their words never arrive.
pub const REMOTE_BONFIRE_TEXT: &str = "Someone is burning...";

/// A decoded change to one record.
#[derive(Debug, Clone, PartialEq)]
pub enum ChangeEvent<T> {
    Inserted(T),
    Updated(T),
    Deleted { id: String },
}

impl<T> ChangeEvent<T>
where
    T: Record + DeserializeOwned,
{
    /// Decode a raw notification for `T`'s table.
    pub fn decode(raw: RawChange) -> Result<Self, PtokyoError> {
        let RawChange { kind, new, old, .. } = raw;
        let missing = |what: &str| PtokyoError::Realtime {
            message: format!("{} {kind} change without {what} row", T::TABLE),
            source: None,
        };
        match kind {
            ChangeKind::Insert => {
                decode_row::<T>(new.ok_or_else(|| missing("new"))?).map(ChangeEvent::Inserted)
            }
            ChangeKind::Update => {
                decode_row::<T>(new.ok_or_else(|| missing("new"))?).map(ChangeEvent::Updated)
            }
            ChangeKind::Delete => old
                .as_ref()
                .and_then(|old| old.get("id"))
                .and_then(|id| id.as_str())
                .map(|id| ChangeEvent::Deleted { id: id.to_string() })
                .ok_or_else(|| missing("old")),
        }
    }
}

/// Splice one change into `records`.
///
/// Inserts append, or replace a record that already has the id. Updates
/// replace by id, or append when the record is not held yet. Deletes remove
/// by id.
pub fn apply_change<T: Record>(records: &mut Vec<T>, change: ChangeEvent<T>) {
    match change {
        ChangeEvent::Inserted(record) | ChangeEvent::Updated(record) => {
            match records.iter_mut().find(|r| r.id() == record.id()) {
                Some(existing) => *existing = record,
                None => records.push(record),
            }
        }
        ChangeEvent::Deleted { id } => records.retain(|r| r.id() != id),
    }
}

/// Change kinds each table's view listens for.
pub fn kinds_for(table: Table) -> &'static [ChangeKind] {
    match table {
        Table::Items | Table::Clusters => {
            &[ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete]
        }
        Table::Profiles => &[ChangeKind::Insert, ChangeKind::Update],
        Table::Bonfires => &[ChangeKind::Insert],
    }
}

/// Route one notification to the store.
pub async fn dispatch(store: &Store, raw: RawChange) {
    let table = raw.table;
    let kind = raw.kind;
    let result = match table {
        Table::Items => ChangeEvent::<Item>::decode(raw).map(|c| store.splice_items(c)),
        Table::Clusters => ChangeEvent::<Cluster>::decode(raw).map(|c| store.splice_clusters(c)),
        Table::Profiles => match kind {
            ChangeKind::Insert | ChangeKind::Update => store.fetch_profiles().await,
            ChangeKind::Delete => Ok(()),
        },
        Table::Bonfires => match ChangeEvent::<Bonfire>::decode(raw) {
            Ok(ChangeEvent::Inserted(bonfire)) => {
                show_remote_bonfire(store, bonfire).await;
                Ok(())
            }
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        },
    };
    match result {
        Ok(()) => debug!(%table, %kind, "change applied"),
        Err(e) => warn!(%table, %kind, error = %e, "change skipped"),
    }
}

async fn show_remote_bonfire(store: &Store, bonfire: Bonfire) {
    if store.current_user_id().await.as_deref() == Some(bonfire.owner.as_str()) {
        // Already shown, with its text, by the burn that produced it.
        debug!(id = %bonfire.id, "own bonfire echo skipped");
        return;
    }
    let point = presence::project(&bonfire.owner);
    store.add_local_bonfire(VisualBonfire {
        id: bonfire.id,
        x: point.x,
        y: point.y,
        intensity: bonfire.intensity,
        text: REMOTE_BONFIRE_TEXT.to_string(),
        created_at: bonfire.created_at,
    });
}

/// Opens per-table bridges.
pub struct RealtimeBridge;

impl RealtimeBridge {
    /// Subscribe to `table` and apply every change to `store` until the handle closes.
    pub async fn attach(
        store: &Store,
        realtime: Arc<dyn RealtimeAdapter>,
        table: Table,
    ) -> Result<BridgeHandle, PtokyoError> {
        let mut feed = realtime.subscribe(table, kinds_for(table)).await?;
        let cancel = feed.cancel.clone();
        let store = store.clone();

        let task = tokio::spawn({
            let cancel = cancel.clone();
            async move {
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => break,
                        next = feed.events.recv() => match next {
                            Some(raw) => dispatch(&store, raw).await,
                            None => {
                                debug!(%table, "change feed ended");
                                break;
                            }
                        },
                    }
                }
            }
        });

        info!(%table, "realtime bridge attached");
        Ok(BridgeHandle {
            table,
            cancel,
            task,
        })
    }
}

/// An open bridge. Closing or dropping it ends the subscription.
pub struct BridgeHandle {
    table: Table,
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

impl BridgeHandle {
    pub fn table(&self) -> Table {
        self.table
    }

    pub fn is_closed(&self) -> bool {
        self.cancel.is_cancelled()
    }

    pub fn close(self) {
        drop(self);
    }
}

impl Drop for BridgeHandle {
    fn drop(&mut self) {
        if !self.cancel.is_cancelled() {
            self.cancel.cancel();
            self.task.abort();
            info!(table = %self.table, "realtime bridge closed");
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn cluster(id: &str, title: &str) -> Cluster {
        Cluster {
            id: id.into(),
            owner: "u1".into(),
            title: title.into(),
            centroid_x: 0.0,
            centroid_y: 0.0,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        }
    }

    #[test]
    fn insert_appends_and_replaces_duplicates() {
        let mut records = vec![cluster("a", "one")];
        apply_change(&mut records, ChangeEvent::Inserted(cluster("b", "two")));
        apply_change(&mut records, ChangeEvent::Inserted(cluster("a", "uno")));
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].title, "uno");
    }

    #[test]
    fn update_replaces_by_id_and_delete_removes() {
        let mut records = vec![cluster("a", "one"), cluster("b", "two")];
        apply_change(&mut records, ChangeEvent::Updated(cluster("b", "deux")));
        assert_eq!(records[1].title, "deux");
        apply_change(&mut records, ChangeEvent::Deleted { id: "a".into() });
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, "b");
    }

    #[test]
    fn decode_delete_reads_old_id() {
        let raw = RawChange {
            table: Table::Items,
            kind: ChangeKind::Delete,
            new: None,
            old: Some(json!({ "id": "gone" })),
        };
        assert_eq!(
            ChangeEvent::<Item>::decode(raw).unwrap(),
            ChangeEvent::Deleted { id: "gone".into() }
        );
    }

    #[test]
    fn decode_rejects_malformed_rows() {
        let raw = RawChange {
            table: Table::Items,
            kind: ChangeKind::Insert,
            new: Some(json!({ "id": "x" })),
            old: None,
        };
        assert!(matches!(
            ChangeEvent::<Item>::decode(raw),
            Err(PtokyoError::Decode { table: Table::Items, .. })
        ));

        let raw = RawChange {
            table: Table::Items,
            kind: ChangeKind::Update,
            new: None,
            old: None,
        };
        assert!(matches!(
            ChangeEvent::<Item>::decode(raw),
            Err(PtokyoError::Realtime { .. })
        ));
    }

    #[test]
    fn bonfire_view_listens_to_inserts_only() {
        assert_eq!(kinds_for(Table::Bonfires), &[ChangeKind::Insert]);
        assert_eq!(kinds_for(Table::Items).len(), 3);
    }
}
