// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Records, realtime payloads and request types shared across the workspace.
//!
//! Persisted records serialize with the backend's column names so they can be
//! sent to and decoded from the remote data service without a mapping layer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the role an adapter plays.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Remote,
    Realtime,
    Auth,
    Generation,
}

/// Logical tables exposed by the remote data service.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Table {
    Items,
    Clusters,
    Profiles,
    Bonfires,
}

/// Kind of content an item holds.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Text,
    Image,
    Link,
}

/// Mood a user broadcasts through their profile.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum MoodStatus {
    Tired,
    Melancholy,
    Calm,
    Anxious,
    #[default]
    Neutral,
}

/// A persisted record that lives in one logical table and is keyed by `id`.
pub trait Record: Clone + Send + Sync + 'static {
    /// Table the record is stored in.
    const TABLE: Table;

    /// Durable (or placeholder) identifier.
    fn id(&self) -> &str;
}

/// A note, image or link placed on the shared canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub content: String,
    #[serde(rename = "position_x")]
    pub x: f64,
    #[serde(rename = "position_y")]
    pub y: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Item {
    const TABLE: Table = Table::Items;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Insert payload for an item; the server assigns `id` and `created_at`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewItem {
    #[serde(rename = "user_id")]
    pub owner: String,
    #[serde(rename = "type")]
    pub kind: ItemKind,
    pub content: String,
    #[serde(rename = "position_x")]
    pub x: f64,
    #[serde(rename = "position_y")]
    pub y: f64,
}

impl NewItem {
    /// Materializes the payload as a local item carrying a placeholder id.
    pub fn into_placeholder(self, id: String, created_at: DateTime<Utc>) -> Item {
        Item {
            id,
            owner: self.owner,
            kind: self.kind,
            content: self.content,
            x: self.x,
            y: self.y,
            cluster_id: None,
            created_at,
        }
    }
}

/// A titled semantic grouping of canvas items.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cluster {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner: String,
    pub title: String,
    pub centroid_x: f64,
    pub centroid_y: f64,
    pub created_at: DateTime<Utc>,
}

impl Record for Cluster {
    const TABLE: Table = Table::Clusters;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Per-user presence row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    pub id: String,
    #[serde(default)]
    pub status: MoodStatus,
    #[serde(default = "default_color_theme")]
    pub color_theme: String,
    pub last_active_at: DateTime<Utc>,
}

impl Record for Profile {
    const TABLE: Table = Table::Profiles;

    fn id(&self) -> &str {
        &self.id
    }
}

fn default_color_theme() -> String {
    "default".to_string()
}

/// A persisted bonfire event. Carries intensity only, never the burned text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Bonfire {
    pub id: String,
    #[serde(rename = "user_id")]
    pub owner: String,
    pub intensity: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message_hash: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Record for Bonfire {
    const TABLE: Table = Table::Bonfires;

    fn id(&self) -> &str {
        &self.id
    }
}

/// Insert payload for a bonfire broadcast.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBonfire {
    #[serde(rename = "user_id")]
    pub owner: String,
    pub intensity: i32,
}

/// Client-only bonfire animation. Never persisted; expires on a timer.
#[derive(Debug, Clone, PartialEq)]
pub struct VisualBonfire {
    pub id: String,
    /// Horizontal position in screen percent.
    pub x: f64,
    /// Vertical position in screen percent.
    pub y: f64,
    pub intensity: i32,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Target position for one item in an organizer result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub id: String,
    pub x: f64,
    pub y: f64,
}

/// A titled group of placements proposed by the organizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayoutCluster {
    pub title: String,
    #[serde(default)]
    pub items: Vec<Placement>,
}

/// Organizer result: items grouped into titled clusters with new positions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Layout {
    #[serde(default)]
    pub clusters: Vec<LayoutCluster>,
}

impl Layout {
    /// Every placement across all clusters, in cluster order.
    pub fn placements(&self) -> impl Iterator<Item = &Placement> {
        self.clusters.iter().flat_map(|c| c.items.iter())
    }
}

/// Row filter understood by [`RemoteDataService::select`](crate::RemoteDataService::select).
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Every row in the table.
    All,
    /// Rows whose `column` is strictly greater than `value`.
    GreaterThan {
        column: String,
        value: serde_json::Value,
    },
}

/// Kind of change carried by a realtime notification.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "UPPERCASE")]
#[serde(rename_all = "UPPERCASE")]
pub enum ChangeKind {
    Insert,
    Update,
    Delete,
}

/// An undecoded change notification for one row of one table.
#[derive(Debug, Clone, PartialEq)]
pub struct RawChange {
    pub table: Table,
    pub kind: ChangeKind,
    /// Row after the change (insert/update).
    pub new: Option<serde_json::Value>,
    /// Row before the change; for deletes it carries at least the id.
    pub old: Option<serde_json::Value>,
}

/// An open realtime subscription.
///
/// Dropping the receiver stops delivery locally; cancelling the token also
/// tears the subscription down on the server.
#[derive(Debug)]
pub struct ChangeFeed {
    pub events: mpsc::Receiver<RawChange>,
    pub cancel: CancellationToken,
}

/// An authenticated user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// An active auth session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub expires_at: Option<i64>,
    pub user: User,
}

/// Email/password credentials for sign-in and sign-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Result of a sign-up attempt.
#[derive(Debug, Clone, PartialEq)]
pub enum SignUpOutcome {
    /// The account is usable immediately.
    SignedIn(Session),
    /// The backend sent a confirmation link; no session yet.
    ConfirmationRequired,
}

/// A one-shot text completion request.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompletionRequest {
    pub system: Option<String>,
    pub prompt: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Ask the provider for a JSON object response.
    pub json_mode: bool,
}

/// Response to a [`CompletionRequest`].
#[derive(Debug, Clone, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub model: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn item_serializes_with_column_names() {
        let item = Item {
            id: "i1".into(),
            owner: "u1".into(),
            kind: ItemKind::Link,
            content: "https://example.com".into(),
            x: 1.5,
            y: -2.0,
            cluster_id: None,
            created_at: "2026-01-01T00:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_value(&item).unwrap();
        assert_eq!(json["user_id"], "u1");
        assert_eq!(json["type"], "link");
        assert_eq!(json["position_x"], 1.5);
        assert_eq!(json["position_y"], -2.0);
        assert!(json.get("cluster_id").is_none());
    }

    #[test]
    fn profile_defaults_missing_status_to_neutral() {
        let json = serde_json::json!({
            "id": "u1",
            "last_active_at": "2026-01-01T00:00:00Z"
        });
        let profile: Profile = serde_json::from_value(json).unwrap();
        assert_eq!(profile.status, MoodStatus::Neutral);
        assert_eq!(profile.color_theme, "default");
    }

    #[test]
    fn table_and_mood_parse_lowercase() {
        use std::str::FromStr;
        assert_eq!(Table::from_str("bonfires").unwrap(), Table::Bonfires);
        assert_eq!(Table::Items.to_string(), "items");
        assert_eq!(MoodStatus::from_str("melancholy").unwrap(), MoodStatus::Melancholy);
        assert!(MoodStatus::from_str("ecstatic").is_err());
    }

    #[test]
    fn change_kind_uses_uppercase_wire_names() {
        let kind: ChangeKind = serde_json::from_str("\"DELETE\"").unwrap();
        assert_eq!(kind, ChangeKind::Delete);
        assert_eq!(ChangeKind::Insert.to_string(), "INSERT");
    }

    #[test]
    fn layout_placements_flatten_in_order() {
        let layout: Layout = serde_json::from_value(serde_json::json!({
            "clusters": [
                { "title": "Nocturnal", "items": [{ "id": "a", "x": 1.0, "y": 2.0 }] },
                { "title": "Empty" },
                { "title": "Transit", "items": [{ "id": "b", "x": -3.0, "y": 4.5 }] }
            ]
        }))
        .unwrap();
        let ids: Vec<&str> = layout.placements().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, ["a", "b"]);
    }

    #[test]
    fn new_bonfire_has_no_text_field() {
        let payload = serde_json::to_value(NewBonfire {
            owner: "u1".into(),
            intensity: 7,
        })
        .unwrap();
        let keys: Vec<&String> = payload.as_object().unwrap().keys().collect();
        assert_eq!(keys.len(), 2);
        assert_eq!(payload["intensity"], 7);
    }
}
