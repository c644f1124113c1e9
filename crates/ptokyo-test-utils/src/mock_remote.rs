// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-memory remote data service with a realtime feed.
//!
//! `MockRemote` behaves like the managed backend closely enough for store
//! tests: it assigns ids and timestamps on insert, filters selects, and emits
//! change notifications to subscribers after every write. Failures can be
//! injected per table and operation, and inserts can be held open so tests
//! can observe optimistic state while a write is in flight.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::{Map, Value};
use tokio::sync::{Semaphore, mpsc};
use tokio_util::sync::CancellationToken;

use ptokyo_core::types::{
    AdapterType, ChangeFeed, ChangeKind, Filter, HealthStatus, RawChange, Table,
};
use ptokyo_core::{PluginAdapter, PtokyoError, RealtimeAdapter, RemoteDataService};

/// Buffer of each mock subscription channel.
const FEED_CAPACITY: usize = 64;

/// Remote operations that can be observed and failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RemoteOp {
    Select,
    Insert,
    Update,
    Upsert,
}

/// One call received by the mock, in arrival order.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCall {
    pub op: RemoteOp,
    pub table: Table,
    /// Row, patch or filter column, depending on the operation.
    pub payload: Value,
}

struct Subscriber {
    table: Table,
    kinds: Vec<ChangeKind>,
    events: mpsc::Sender<RawChange>,
    cancel: CancellationToken,
}

#[derive(Default)]
struct RemoteState {
    tables: HashMap<Table, Vec<Value>>,
    failures: HashSet<(Table, RemoteOp)>,
    calls: Vec<RemoteCall>,
    subscribers: Vec<Subscriber>,
}

/// Handle that keeps inserts waiting until released.
#[derive(Clone)]
pub struct InsertGate {
    permits: Arc<Semaphore>,
}

impl InsertGate {
    /// Lets one waiting (or future) insert proceed.
    pub fn release(&self) {
        self.permits.add_permits(1);
    }
}

/// In-memory [`RemoteDataService`] and [`RealtimeAdapter`].
#[derive(Clone, Default)]
pub struct MockRemote {
    state: Arc<Mutex<RemoteState>>,
    gate: Arc<Mutex<Option<Arc<Semaphore>>>>,
}

impl MockRemote {
    /// Create an empty mock with no tables populated.
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, RemoteState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Replace the rows of `table` without emitting change notifications.
    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        self.state().tables.insert(table, rows);
    }

    /// Current rows of `table`.
    pub fn rows(&self, table: Table) -> Vec<Value> {
        self.state().tables.get(&table).cloned().unwrap_or_default()
    }

    /// Every call received so far.
    pub fn calls(&self) -> Vec<RemoteCall> {
        self.state().calls.clone()
    }

    /// Calls of one kind against one table.
    pub fn calls_to(&self, table: Table, op: RemoteOp) -> Vec<RemoteCall> {
        self.state()
            .calls
            .iter()
            .filter(|c| c.table == table && c.op == op)
            .cloned()
            .collect()
    }

    /// Make every `op` against `table` fail until [`clear_failures`](Self::clear_failures).
    pub fn fail_on(&self, table: Table, op: RemoteOp) {
        self.state().failures.insert((table, op));
    }

    pub fn clear_failures(&self) {
        self.state().failures.clear();
    }

    /// Hold every subsequent insert until the returned gate is released once per insert.
    pub fn hold_inserts(&self) -> InsertGate {
        let permits = Arc::new(Semaphore::new(0));
        *self.gate.lock().unwrap_or_else(PoisonError::into_inner) = Some(permits.clone());
        InsertGate { permits }
    }

    /// Number of live (not cancelled, not dropped) subscriptions on `table`.
    pub fn subscriber_count(&self, table: Table) -> usize {
        let mut state = self.state();
        state.subscribers.retain(|s| !s.cancel.is_cancelled() && !s.events.is_closed());
        state.subscribers.iter().filter(|s| s.table == table).count()
    }

    /// Push a change notification as if another client had written it.
    pub fn emit(&self, change: RawChange) {
        broadcast(&mut self.state(), change);
    }

    fn record(&self, op: RemoteOp, table: Table, payload: Value) -> Result<(), PtokyoError> {
        let mut state = self.state();
        state.calls.push(RemoteCall { op, table, payload });
        if state.failures.contains(&(table, op)) {
            return Err(PtokyoError::remote(format!(
                "injected {op:?} failure on {table}"
            )));
        }
        Ok(())
    }
}

fn broadcast(state: &mut RemoteState, change: RawChange) {
    state.subscribers.retain(|s| !s.cancel.is_cancelled() && !s.events.is_closed());
    for sub in &state.subscribers {
        if sub.table == change.table
            && sub.kinds.contains(&change.kind)
            && sub.events.try_send(change.clone()).is_err()
        {
            tracing::warn!(table = %change.table, "mock feed full, change dropped");
        }
    }
}

fn row_id(row: &Value) -> Option<&str> {
    row.get("id").and_then(Value::as_str)
}

fn merge(target: &mut Value, patch: &Value) {
    if let (Some(target), Some(patch)) = (target.as_object_mut(), patch.as_object()) {
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }
    }
}

/// Strict `>` over numbers, RFC 3339 timestamps, then plain strings.
fn greater_than(cell: Option<&Value>, bound: &Value) -> bool {
    match (cell, bound) {
        (Some(Value::Number(a)), Value::Number(b)) => match (a.as_f64(), b.as_f64()) {
            (Some(a), Some(b)) => a > b,
            _ => false,
        },
        (Some(Value::String(a)), Value::String(b)) => {
            match (
                DateTime::parse_from_rfc3339(a),
                DateTime::parse_from_rfc3339(b),
            ) {
                (Ok(a), Ok(b)) => a > b,
                _ => a > b,
            }
        }
        _ => false,
    }
}

#[async_trait]
impl PluginAdapter for MockRemote {
    fn name(&self) -> &str {
        "mock-remote"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Remote
    }

    async fn health_check(&self) -> Result<HealthStatus, PtokyoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PtokyoError> {
        Ok(())
    }
}

#[async_trait]
impl RemoteDataService for MockRemote {
    async fn select(&self, table: Table, filter: Filter) -> Result<Vec<Value>, PtokyoError> {
        let payload = match &filter {
            Filter::All => Value::Null,
            Filter::GreaterThan { column, value } => {
                serde_json::json!({ "column": column, "gt": value })
            }
        };
        self.record(RemoteOp::Select, table, payload)?;

        let rows = self.rows(table);
        Ok(match filter {
            Filter::All => rows,
            Filter::GreaterThan { column, value } => rows
                .into_iter()
                .filter(|row| greater_than(row.get(&column), &value))
                .collect(),
        })
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, PtokyoError> {
        let gate = self
            .gate
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();
        if let Some(gate) = gate {
            let permit = gate
                .acquire()
                .await
                .map_err(|_| PtokyoError::remote("insert gate closed"))?;
            permit.forget();
        }

        self.record(RemoteOp::Insert, table, row.clone())?;

        let mut stored = match row {
            Value::Object(map) => map,
            _ => return Err(PtokyoError::remote("insert payload must be an object")),
        };
        stored
            .entry("id")
            .or_insert_with(|| Value::String(uuid::Uuid::new_v4().to_string()));
        stored
            .entry("created_at")
            .or_insert_with(|| Value::String(Utc::now().to_rfc3339()));
        let stored = Value::Object(stored);

        let mut state = self.state();
        state.tables.entry(table).or_default().push(stored.clone());
        broadcast(
            &mut state,
            RawChange {
                table,
                kind: ChangeKind::Insert,
                new: Some(stored.clone()),
                old: None,
            },
        );
        Ok(stored)
    }

    async fn update(&self, table: Table, id: &str, patch: Value) -> Result<(), PtokyoError> {
        let mut payload = Map::new();
        payload.insert("id".into(), Value::String(id.to_string()));
        payload.insert("patch".into(), patch.clone());
        self.record(RemoteOp::Update, table, Value::Object(payload))?;

        let mut state = self.state();
        let updated = state
            .tables
            .entry(table)
            .or_default()
            .iter_mut()
            .find(|row| row_id(row) == Some(id))
            .map(|row| {
                let old = row.clone();
                merge(row, &patch);
                (old, row.clone())
            });
        // Matching zero rows is not an error for the row store either.
        if let Some((old, new)) = updated {
            broadcast(
                &mut state,
                RawChange {
                    table,
                    kind: ChangeKind::Update,
                    new: Some(new),
                    old: Some(old),
                },
            );
        }
        Ok(())
    }

    async fn upsert(&self, table: Table, row: Value) -> Result<(), PtokyoError> {
        self.record(RemoteOp::Upsert, table, row.clone())?;

        let id = row_id(&row)
            .map(str::to_string)
            .ok_or_else(|| PtokyoError::remote("upsert payload needs an id"))?;

        let mut state = self.state();
        let rows = state.tables.entry(table).or_default();
        let change = match rows.iter_mut().find(|r| row_id(r) == Some(id.as_str())) {
            Some(existing) => {
                let old = existing.clone();
                merge(existing, &row);
                RawChange {
                    table,
                    kind: ChangeKind::Update,
                    new: Some(existing.clone()),
                    old: Some(old),
                }
            }
            None => {
                rows.push(row.clone());
                RawChange {
                    table,
                    kind: ChangeKind::Insert,
                    new: Some(row),
                    old: None,
                }
            }
        };
        broadcast(&mut state, change);
        Ok(())
    }
}

#[async_trait]
impl RealtimeAdapter for MockRemote {
    async fn subscribe(
        &self,
        table: Table,
        kinds: &[ChangeKind],
    ) -> Result<ChangeFeed, PtokyoError> {
        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let cancel = CancellationToken::new();
        self.state().subscribers.push(Subscriber {
            table,
            kinds: kinds.to_vec(),
            events: tx,
            cancel: cancel.clone(),
        });
        Ok(ChangeFeed { events: rx, cancel })
    }
}
