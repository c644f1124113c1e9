// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Realtime change feeds over the backend's Phoenix channel websocket.
//!
//! Each [`subscribe`](RealtimeAdapter::subscribe) call opens its own socket,
//! joins `realtime:public:<table>` with a `postgres_changes` filter, and
//! forwards matching changes into the returned [`ChangeFeed`]. Cancelling the
//! feed's token leaves the channel and closes the socket.

use std::time::Duration;

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use ptokyo_core::{
    AdapterType, ChangeFeed, ChangeKind, HealthStatus, PluginAdapter, PtokyoError, RawChange,
    RealtimeAdapter, Table,
};

use crate::client::SupabaseClient;

/// How long to wait for the server to acknowledge a channel join.
pub const JOIN_TIMEOUT: Duration = Duration::from_secs(10);

const FEED_CAPACITY: usize = 256;

/// One frame of the Phoenix channel protocol.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub(crate) struct PhoenixMessage {
    pub topic: String,
    pub event: String,
    #[serde(default)]
    pub payload: Value,
    #[serde(rename = "ref", default)]
    pub reference: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub join_ref: Option<String>,
}

impl PhoenixMessage {
    fn to_frame(&self) -> Result<Message, PtokyoError> {
        let text = serde_json::to_string(self).map_err(|e| PtokyoError::Realtime {
            message: format!("failed to encode {} frame", self.event),
            source: Some(Box::new(e)),
        })?;
        Ok(Message::Text(text.into()))
    }
}

pub(crate) fn topic_for(table: Table) -> String {
    format!("realtime:public:{table}")
}

/// `postgres_changes` filters for the requested kinds; all three collapse to `*`.
pub(crate) fn change_filters(table: Table, kinds: &[ChangeKind]) -> Vec<Value> {
    let all = [ChangeKind::Insert, ChangeKind::Update, ChangeKind::Delete];
    if kinds.is_empty() || all.iter().all(|k| kinds.contains(k)) {
        return vec![json!({ "event": "*", "schema": "public", "table": table.to_string() })];
    }
    kinds
        .iter()
        .map(|k| json!({ "event": k.to_string(), "schema": "public", "table": table.to_string() }))
        .collect()
}

/// Decode a `postgres_changes` frame into a [`RawChange`] for `table`.
///
/// Returns `None` for frames about other events, other tables, or kinds
/// outside `kinds`.
pub(crate) fn parse_change(
    msg: &PhoenixMessage,
    table: Table,
    kinds: &[ChangeKind],
) -> Option<RawChange> {
    if msg.event != "postgres_changes" {
        return None;
    }
    let data = msg.payload.get("data")?;
    if data.get("table").and_then(Value::as_str) != Some(table.to_string().as_str()) {
        return None;
    }
    let kind: ChangeKind = data.get("type")?.as_str()?.parse().ok()?;
    if !kinds.is_empty() && !kinds.contains(&kind) {
        return None;
    }
    let row = |key: &str| data.get(key).filter(|v| v.is_object()).cloned();
    Some(RawChange {
        table,
        kind,
        new: row("record"),
        old: row("old_record"),
    })
}

fn socket_error(message: &str, e: impl std::error::Error + Send + Sync + 'static) -> PtokyoError {
    PtokyoError::Realtime {
        message: format!("{message}: {e}"),
        source: Some(Box::new(e)),
    }
}

/// [`RealtimeAdapter`] speaking the backend's websocket protocol.
pub struct SupabaseRealtime {
    client: SupabaseClient,
    heartbeat: Duration,
}

impl SupabaseRealtime {
    pub fn new(client: SupabaseClient, heartbeat: Duration) -> Self {
        Self { client, heartbeat }
    }
}

#[async_trait]
impl PluginAdapter for SupabaseRealtime {
    fn name(&self) -> &str {
        "supabase-realtime"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Realtime
    }

    async fn health_check(&self) -> Result<HealthStatus, PtokyoError> {
        match tokio_tungstenite::connect_async(self.client.realtime_url()).await {
            Ok((mut ws, _)) => {
                let _ = ws.close(None).await;
                Ok(HealthStatus::Healthy)
            }
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), PtokyoError> {
        Ok(())
    }
}

#[async_trait]
impl RealtimeAdapter for SupabaseRealtime {
    async fn subscribe(
        &self,
        table: Table,
        kinds: &[ChangeKind],
    ) -> Result<ChangeFeed, PtokyoError> {
        let (ws, _) = tokio_tungstenite::connect_async(self.client.realtime_url())
            .await
            .map_err(|e| socket_error("websocket connect failed", e))?;
        let (mut sink, mut stream) = ws.split();

        let topic = topic_for(table);
        // Refs are per socket; the join always takes the first.
        let join_ref = "1".to_string();
        let mut last_ref: u64 = 1;
        let join = PhoenixMessage {
            topic: topic.clone(),
            event: "phx_join".into(),
            payload: json!({
                "config": {
                    "broadcast": { "self": false },
                    "presence": { "key": "" },
                    "postgres_changes": change_filters(table, kinds),
                },
                "access_token": self.client.bearer(),
            }),
            reference: Some(join_ref.clone()),
            join_ref: Some(join_ref.clone()),
        };
        sink.send(join.to_frame()?)
            .await
            .map_err(|e| socket_error("failed to send join", e))?;

        let ack = tokio::time::timeout(JOIN_TIMEOUT, async {
            while let Some(frame) = stream.next().await {
                let frame = frame.map_err(|e| socket_error("websocket read failed", e))?;
                let Message::Text(text) = frame else { continue };
                let Ok(msg) = serde_json::from_str::<PhoenixMessage>(text.as_str()) else {
                    continue;
                };
                if msg.event == "phx_reply" && msg.reference.as_deref() == Some(join_ref.as_str()) {
                    return match msg.payload.get("status").and_then(Value::as_str) {
                        Some("ok") => Ok(()),
                        status => Err(PtokyoError::Realtime {
                            message: format!(
                                "join of {topic} rejected ({}): {}",
                                status.unwrap_or("no status"),
                                msg.payload.get("response").cloned().unwrap_or_default()
                            ),
                            source: None,
                        }),
                    };
                }
            }
            Err(PtokyoError::Realtime {
                message: format!("socket closed before {topic} join was acknowledged"),
                source: None,
            })
        })
        .await
        .map_err(|_| PtokyoError::Timeout {
            duration: JOIN_TIMEOUT,
        })?;
        ack?;
        info!(%table, "realtime channel joined");

        let (tx, rx) = mpsc::channel(FEED_CAPACITY);
        let cancel = CancellationToken::new();
        let kinds = kinds.to_vec();
        let heartbeat = self.heartbeat;

        tokio::spawn({
            let cancel = cancel.clone();
            async move {
                let mut ticker =
                    tokio::time::interval_at(tokio::time::Instant::now() + heartbeat, heartbeat);
                loop {
                    tokio::select! {
                        biased;
                        _ = cancel.cancelled() => {
                            last_ref += 1;
                            let leave = PhoenixMessage {
                                topic: topic.clone(),
                                event: "phx_leave".into(),
                                payload: json!({}),
                                reference: Some(last_ref.to_string()),
                                join_ref: Some(join_ref.clone()),
                            };
                            if let Ok(frame) = leave.to_frame() {
                                let _ = sink.send(frame).await;
                            }
                            let _ = sink.close().await;
                            info!(%table, "realtime channel left");
                            break;
                        }
                        _ = ticker.tick() => {
                            last_ref += 1;
                            let beat = PhoenixMessage {
                                topic: "phoenix".into(),
                                event: "heartbeat".into(),
                                payload: json!({}),
                                reference: Some(last_ref.to_string()),
                                join_ref: None,
                            };
                            let sent = match beat.to_frame() {
                                Ok(frame) => sink.send(frame).await.map_err(|e| e.to_string()),
                                Err(e) => Err(e.to_string()),
                            };
                            if let Err(error) = sent {
                                warn!(%table, %error, "heartbeat failed, closing feed");
                                break;
                            }
                        }
                        frame = stream.next() => match frame {
                            Some(Ok(Message::Text(text))) => {
                                let parsed = serde_json::from_str::<PhoenixMessage>(&text);
                                let msg = match parsed {
                                    Ok(msg) => msg,
                                    Err(e) => {
                                        debug!(%table, error = %e, "unparseable frame ignored");
                                        continue;
                                    }
                                };
                                if msg.event == "phx_error" || msg.event == "phx_close" {
                                    warn!(%table, event = %msg.event, "channel closed by server");
                                    break;
                                }
                                if let Some(change) = parse_change(&msg, table, &kinds)
                                    && tx.send(change).await.is_err()
                                {
                                    debug!(%table, "feed receiver dropped");
                                    break;
                                }
                            }
                            Some(Ok(Message::Close(_))) | None => {
                                info!(%table, "realtime socket closed");
                                break;
                            }
                            Some(Ok(_)) => {}
                            Some(Err(e)) => {
                                warn!(%table, error = %e, "realtime socket error");
                                break;
                            }
                        },
                    }
                }
            }
        });

        Ok(ChangeFeed { events: rx, cancel })
    }
}
