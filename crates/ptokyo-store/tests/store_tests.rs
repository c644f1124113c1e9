// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Behavior tests for the store and the realtime bridge against in-memory adapters.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::json;

use ptokyo_core::{
    ChangeKind, ItemKind, Layout, LayoutCluster, MoodStatus, Placement, PtokyoError, RawChange,
    RemoteDataService, Table, VisualBonfire,
};
use ptokyo_store::realtime::REMOTE_BONFIRE_TEXT;
use ptokyo_store::{RealtimeBridge, Store, StoreEvent, StoreSettings, project};
use ptokyo_test_utils::{MockAuth, MockRemote, RemoteOp};

fn store_for(remote: &Arc<MockRemote>, auth: MockAuth) -> Store {
    Store::new(remote.clone(), Arc::new(auth), StoreSettings::default())
}

/// Poll `check` until it holds, letting spawned tasks run in between.
async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("condition not reached");
}

fn visual(id: &str, intensity: i32) -> VisualBonfire {
    VisualBonfire {
        id: id.into(),
        x: 50.0,
        y: 50.0,
        intensity,
        text: "deadline anxiety".into(),
        created_at: Utc::now(),
    }
}

fn item_row(id: &str, content: &str) -> serde_json::Value {
    json!({
        "id": id,
        "user_id": "other",
        "type": "text",
        "content": content,
        "position_x": 0.0,
        "position_y": 0.0,
        "created_at": "2026-01-01T00:00:00Z"
    })
}

// --- optimistic writes ---

#[tokio::test]
async fn added_item_is_visible_before_ack_and_gone_after_failure() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let gate = remote.hold_inserts();
    remote.fail_on(Table::Items, RemoteOp::Insert);

    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.add_item(ItemKind::Text, "hello", 10.0, 20.0).await }
    });

    wait_until(|| store.items().len() == 1).await;
    let shown = store.items();
    assert!(shown[0].id.starts_with("temp-"));
    assert_eq!(shown[0].content, "hello");

    gate.release();
    let result = pending.await.unwrap();
    assert!(matches!(result, Err(PtokyoError::Remote { .. })));
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn committed_item_replaces_placeholder() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));

    let stored = store
        .add_item(ItemKind::Link, "https://example.com", 1.0, 2.0)
        .await
        .unwrap();

    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, stored.id);
    assert!(!items[0].id.starts_with("temp-"));
    assert_eq!(remote.rows(Table::Items)[0]["user_id"], "u1");
}

#[tokio::test]
async fn position_change_during_insert_survives_commit() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let gate = remote.hold_inserts();

    let pending = tokio::spawn({
        let store = store.clone();
        async move { store.add_item(ItemKind::Text, "drag me", 0.0, 0.0).await }
    });
    wait_until(|| store.items().len() == 1).await;
    let placeholder = store.items()[0].id.clone();
    store.update_item_position(&placeholder, 300.0, -40.0).await.unwrap();

    gate.release();
    let committed = pending.await.unwrap().unwrap();
    assert_eq!(store.items()[0].x, 300.0);
    assert_eq!(committed.y, -40.0);

    let updates = remote.calls_to(Table::Items, RemoteOp::Update);
    assert_eq!(updates.len(), 1);
    assert_eq!(updates[0].payload["id"], committed.id);
}

#[tokio::test]
async fn add_item_requires_sign_in() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_out());

    let err = store
        .add_item(ItemKind::Text, "hello", 0.0, 0.0)
        .await
        .unwrap_err();
    assert!(matches!(err, PtokyoError::NotAuthenticated));
    assert!(store.items().is_empty());
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn failed_position_update_is_not_rolled_back() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(Table::Items, vec![item_row("i1", "note")]);
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    store.fetch_all(Table::Items).await.unwrap();
    remote.fail_on(Table::Items, RemoteOp::Update);

    let result = store.update_item_position("i1", 5.0, 6.0).await;
    assert!(result.is_err());
    let item = store.item("i1").unwrap();
    assert_eq!((item.x, item.y), (5.0, 6.0));
}

#[tokio::test]
async fn moving_unknown_item_is_not_found() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let err = store.update_item_position("nope", 1.0, 1.0).await.unwrap_err();
    assert!(matches!(err, PtokyoError::NotFound { table: Table::Items, .. }));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn apply_layout_moves_known_items_only() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(
        Table::Items,
        vec![item_row("a", "ramen"), item_row("b", "last train")],
    );
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    store.fetch_all(Table::Items).await.unwrap();

    let layout = Layout {
        clusters: vec![LayoutCluster {
            title: "Night".into(),
            items: vec![
                Placement { id: "a".into(), x: -500.0, y: 200.0 },
                Placement { id: "ghost".into(), x: 0.0, y: 0.0 },
                Placement { id: "b".into(), x: -450.0, y: 260.0 },
            ],
        }],
    };
    assert_eq!(store.apply_layout(&layout).await, 2);
    assert_eq!(store.item("a").unwrap().x, -500.0);
    assert_eq!(store.item("b").unwrap().y, 260.0);
    assert_eq!(remote.calls_to(Table::Items, RemoteOp::Update).len(), 2);
}

// --- fetching ---

#[tokio::test]
async fn failed_fetch_keeps_previous_collection() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(Table::Items, vec![item_row("i1", "kept")]);
    let store = store_for(&remote, MockAuth::signed_out());
    store.fetch_all(Table::Items).await.unwrap();

    remote.fail_on(Table::Items, RemoteOp::Select);
    assert!(store.fetch_all(Table::Items).await.is_err());
    assert_eq!(store.items().len(), 1);
    assert_eq!(store.items()[0].content, "kept");
}

#[tokio::test]
async fn fetch_canvas_brackets_loading_flag() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(Table::Items, vec![item_row("i1", "a")]);
    let store = store_for(&remote, MockAuth::signed_out());
    let mut events = store.subscribe();

    store.fetch_canvas().await.unwrap();

    assert!(!store.is_loading());
    let mut seen = Vec::new();
    while let Ok(event) = events.try_recv() {
        seen.push(event);
    }
    assert_eq!(seen.first(), Some(&StoreEvent::Loading));
    assert_eq!(seen.last(), Some(&StoreEvent::Loading));
    assert!(seen.contains(&StoreEvent::Items));
    assert!(seen.contains(&StoreEvent::Clusters));
}

#[tokio::test]
async fn fetch_all_bonfires_fills_log() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(
        Table::Bonfires,
        vec![json!({
            "id": "b1", "user_id": "u2", "intensity": 4,
            "created_at": "2026-01-01T00:00:00Z"
        })],
    );
    let store = store_for(&remote, MockAuth::signed_out());
    store.fetch_all(Table::Bonfires).await.unwrap();
    assert_eq!(store.bonfire_log()[0].intensity, 4);
    assert!(store.bonfires().is_empty());
}

#[tokio::test]
async fn profile_active_exactly_one_hour_ago_is_excluded() {
    let now: DateTime<Utc> = "2026-05-01T09:00:00Z".parse().unwrap();
    let remote = Arc::new(MockRemote::new());
    remote.seed(
        Table::Profiles,
        vec![
            json!({ "id": "edge", "status": "calm", "last_active_at": "2026-05-01T08:00:00Z" }),
            json!({ "id": "inside", "status": "tired", "last_active_at": "2026-05-01T08:00:01Z" }),
            json!({ "id": "stale", "status": "anxious", "last_active_at": "2026-04-30T09:00:00Z" }),
        ],
    );
    let store = store_for(&remote, MockAuth::signed_out());

    store.fetch_profiles_at(now).await.unwrap();

    let ids: Vec<String> = store.profiles().into_iter().map(|p| p.id).collect();
    assert_eq!(ids, ["inside"]);
    let select = &remote.calls_to(Table::Profiles, RemoteOp::Select)[0];
    assert_eq!(select.payload["column"], "last_active_at");
}

// --- presence actions ---

#[tokio::test]
async fn update_status_applies_locally_even_when_upsert_fails() {
    let remote = Arc::new(MockRemote::new());
    remote.seed(
        Table::Profiles,
        vec![json!({ "id": "u1", "status": "neutral", "last_active_at": Utc::now().to_rfc3339() })],
    );
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    store.fetch_profiles().await.unwrap();
    remote.fail_on(Table::Profiles, RemoteOp::Upsert);

    let result = store.update_status(MoodStatus::Calm).await;

    assert!(result.is_err());
    assert_eq!(store.current_user_status(), MoodStatus::Calm);
    let profiles = store.profiles();
    assert_eq!(profiles.len(), 1);
    assert_eq!(profiles[0].status, MoodStatus::Calm);
}

#[tokio::test]
async fn update_status_upserts_profile_row() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));

    store.update_status(MoodStatus::Melancholy).await.unwrap();

    let row = &remote.rows(Table::Profiles)[0];
    assert_eq!(row["id"], "u1");
    assert_eq!(row["status"], "melancholy");
    assert!(row["last_active_at"].is_string());
    assert_eq!(store.profiles()[0].id, "u1");
}

#[tokio::test]
async fn update_status_signed_out_stays_local() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_out());

    store.update_status(MoodStatus::Tired).await.unwrap();

    assert_eq!(store.current_user_status(), MoodStatus::Tired);
    assert!(store.profiles().is_empty());
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn bonfire_broadcast_carries_intensity_only() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));

    let high = store.add_bonfire_broadcast(42).await.unwrap();
    let low = store.add_bonfire_broadcast(0).await.unwrap();

    assert_eq!(high.intensity, 10);
    assert_eq!(low.intensity, 1);
    let payload = &remote.calls_to(Table::Bonfires, RemoteOp::Insert)[0].payload;
    let mut keys: Vec<&String> = payload.as_object().unwrap().keys().collect();
    keys.sort();
    assert_eq!(keys, ["intensity", "user_id"]);
    assert!(store.bonfires().is_empty());
}

#[tokio::test(start_paused = true)]
async fn local_bonfire_expires_after_five_seconds() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_out());

    store.add_local_bonfire(visual("v1", 5));
    assert_eq!(store.bonfires().len(), 1);

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert_eq!(store.bonfires().len(), 1);

    tokio::time::sleep(Duration::from_secs(2)).await;
    assert!(store.bonfires().is_empty());
}

#[tokio::test(start_paused = true)]
async fn local_message_lasts_ten_seconds() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_out());

    store.add_local_message(visual("m1", 1));

    tokio::time::sleep(Duration::from_secs(6)).await;
    assert_eq!(store.bonfires().len(), 1);
    tokio::time::sleep(Duration::from_secs(5)).await;
    assert!(store.bonfires().is_empty());
}

#[tokio::test(start_paused = true)]
async fn burn_shows_text_locally_and_broadcasts_intensity() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));

    let shown = store.burn("  let it go  ").await.unwrap();

    assert_eq!(shown.text, "let it go");
    assert_eq!(shown.intensity, 9);
    assert_eq!((shown.x, shown.y), (project("u1").x, project("u1").y));
    assert_eq!(store.bonfires()[0].text, "let it go");

    let inserts = remote.calls_to(Table::Bonfires, RemoteOp::Insert);
    assert_eq!(inserts.len(), 1);
    assert_eq!(inserts[0].payload["intensity"], 9);
    assert!(!inserts[0].payload.to_string().contains("let it go"));
}

#[tokio::test(start_paused = true)]
async fn burn_waits_for_the_delay() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));

    let burning = tokio::spawn({
        let store = store.clone();
        async move { store.burn("the whole inbox").await }
    });
    tokio::time::sleep(Duration::from_millis(1000)).await;
    assert!(store.bonfires().is_empty());

    let shown = burning.await.unwrap().unwrap();
    assert_eq!(shown.intensity, 10);
    assert_eq!(store.bonfires().len(), 1);
}

#[tokio::test]
async fn blank_burn_is_rejected() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    assert!(matches!(
        store.burn("   ").await,
        Err(PtokyoError::InvalidInput(_))
    ));
    assert!(remote.calls().is_empty());
}

#[tokio::test]
async fn viewport_and_mode_setters() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_out());

    store.set_scale(2.5).unwrap();
    store.set_offset(-30.0, 12.0);
    assert!(store.set_scale(0.0).is_err());
    assert_eq!(store.scale(), 2.5);
    assert_eq!(store.offset(), (-30.0, 12.0));

    assert_eq!(store.toggle_mode().to_string(), "glitch");
    assert_eq!(store.toggle_mode().to_string(), "silence");
}

// --- realtime bridge ---

#[tokio::test]
async fn bridge_splices_item_changes_until_closed() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let bridge = RealtimeBridge::attach(&store, remote.clone(), Table::Items)
        .await
        .unwrap();

    remote.emit(RawChange {
        table: Table::Items,
        kind: ChangeKind::Insert,
        new: Some(item_row("r1", "from afar")),
        old: None,
    });
    wait_until(|| store.items().len() == 1).await;

    remote.emit(RawChange {
        table: Table::Items,
        kind: ChangeKind::Update,
        new: Some(item_row("r1", "edited")),
        old: None,
    });
    wait_until(|| store.item("r1").is_some_and(|i| i.content == "edited")).await;

    remote.emit(RawChange {
        table: Table::Items,
        kind: ChangeKind::Delete,
        new: None,
        old: Some(json!({ "id": "r1" })),
    });
    wait_until(|| store.items().is_empty()).await;

    bridge.close();
    assert_eq!(remote.subscriber_count(Table::Items), 0);

    remote.emit(RawChange {
        table: Table::Items,
        kind: ChangeKind::Insert,
        new: Some(item_row("r2", "missed")),
        old: None,
    });
    tokio::time::sleep(Duration::from_millis(20)).await;
    assert!(store.items().is_empty());
}

#[tokio::test]
async fn bridge_skips_malformed_changes() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_out());
    let _bridge = RealtimeBridge::attach(&store, remote.clone(), Table::Clusters)
        .await
        .unwrap();

    remote.emit(RawChange {
        table: Table::Clusters,
        kind: ChangeKind::Insert,
        new: Some(json!({ "id": "c0" })),
        old: None,
    });
    remote.emit(RawChange {
        table: Table::Clusters,
        kind: ChangeKind::Insert,
        new: Some(json!({
            "id": "c1", "user_id": "u2", "title": "Commute",
            "centroid_x": 10.0, "centroid_y": -3.0,
            "created_at": "2026-01-01T00:00:00Z"
        })),
        old: None,
    });

    wait_until(|| store.clusters().len() == 1).await;
    assert_eq!(store.clusters()[0].id, "c1");
}

#[tokio::test]
async fn own_item_echo_does_not_duplicate() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let _bridge = RealtimeBridge::attach(&store, remote.clone(), Table::Items)
        .await
        .unwrap();

    let stored = store
        .add_item(ItemKind::Text, "echo", 0.0, 0.0)
        .await
        .unwrap();
    tokio::time::sleep(Duration::from_millis(20)).await;

    let items = store.items();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0].id, stored.id);
}

#[tokio::test]
async fn bridge_shows_other_users_bonfires_without_text() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let _bridge = RealtimeBridge::attach(&store, remote.clone(), Table::Bonfires)
        .await
        .unwrap();

    remote.emit(RawChange {
        table: Table::Bonfires,
        kind: ChangeKind::Insert,
        new: Some(json!({
            "id": "mine", "user_id": "u1", "intensity": 3,
            "created_at": "2026-01-01T00:00:00Z"
        })),
        old: None,
    });
    remote.emit(RawChange {
        table: Table::Bonfires,
        kind: ChangeKind::Insert,
        new: Some(json!({
            "id": "theirs", "user_id": "u2", "intensity": 7,
            "created_at": "2026-01-01T00:00:00Z"
        })),
        old: None,
    });

    wait_until(|| !store.bonfires().is_empty()).await;
    tokio::time::sleep(Duration::from_millis(20)).await;
    let shown = store.bonfires();
    assert_eq!(shown.len(), 1);
    assert_eq!(shown[0].id, "theirs");
    assert_eq!(shown[0].text, REMOTE_BONFIRE_TEXT);
    assert_eq!(shown[0].intensity, 7);
    assert_eq!(shown[0].x, project("u2").x);
}

#[tokio::test]
async fn profile_changes_trigger_refetch() {
    let remote = Arc::new(MockRemote::new());
    let store = store_for(&remote, MockAuth::signed_in("u1"));
    let _bridge = RealtimeBridge::attach(&store, remote.clone(), Table::Profiles)
        .await
        .unwrap();

    remote
        .upsert(
            Table::Profiles,
            json!({ "id": "u2", "status": "anxious", "last_active_at": Utc::now().to_rfc3339() }),
        )
        .await
        .unwrap();

    wait_until(|| store.profiles().len() == 1).await;
    assert_eq!(store.profiles()[0].status, MoodStatus::Anxious);
}
