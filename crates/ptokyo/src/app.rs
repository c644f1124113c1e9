// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Adapter wiring and command handling shared by the shell and the one-shot
//! subcommands.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use colored::Colorize;
use rand::Rng;
use tracing::{info, warn};

use ptokyo_config::PtokyoConfig;
use ptokyo_core::{
    AuthAdapter, Credentials, GenerationAdapter, PtokyoError, RealtimeAdapter, RemoteDataService,
    SignUpOutcome, VisualBonfire,
};
use ptokyo_gemini::GeminiProvider;
use ptokyo_openai::OpenAiProvider;
use ptokyo_oracle::{LEGEND_FALLBACKS, Oracle, OracleSettings, PURIFICATION_FALLBACKS, fallback};
use ptokyo_store::{Store, StoreSettings, project};
use ptokyo_supabase::SupabaseBackend;

use crate::command::Command;
use crate::render;
use crate::session;
use crate::view::{self, MountedView, View};

/// Half-width of the area around the canvas center where unplaced items land.
const DROP_SPREAD: f64 = 200.0;

/// Shown when the organizer cannot produce a layout.
const ORGANIZE_FAILED: &str = "The city refuses to be sorted tonight.";

/// Build the configured generation provider.
pub fn build_generator(config: &PtokyoConfig) -> Result<Arc<dyn GenerationAdapter>, PtokyoError> {
    match config.generation.provider.as_str() {
        "openai" => Ok(Arc::new(OpenAiProvider::new(config)?)),
        "gemini" => Ok(Arc::new(GeminiProvider::new(config)?)),
        other => Err(PtokyoError::Config(format!(
            "unknown generation provider: {other}"
        ))),
    }
}

/// An [`Oracle`], or `None` when no provider can be built. Callers then use
/// the offline fallbacks.
pub fn build_oracle(config: &PtokyoConfig) -> Option<Oracle> {
    match build_generator(config) {
        Ok(generator) => Some(Oracle::new(generator, OracleSettings::from(config))),
        Err(e) => {
            warn!(error = %e, "generation unavailable, using offline text");
            None
        }
    }
}

pub fn store_settings(config: &PtokyoConfig) -> StoreSettings {
    StoreSettings {
        active_window: Duration::from_secs(config.presence.active_window_secs),
        bonfire_ttl: Duration::from_secs(config.presence.bonfire_ttl_secs),
        message_ttl: Duration::from_secs(config.presence.message_ttl_secs),
        burn_delay: Duration::from_millis(config.presence.burn_delay_ms),
    }
}

pub async fn urban_legend(oracle: Option<&Oracle>) -> String {
    match oracle {
        Some(oracle) => oracle.urban_legend().await,
        None => fallback::pick(LEGEND_FALLBACKS).to_string(),
    }
}

pub async fn purification(oracle: Option<&Oracle>, text: &str) -> String {
    match oracle {
        Some(oracle) => oracle.purification(text).await,
        None => fallback::pick(PURIFICATION_FALLBACKS).to_string(),
    }
}

/// Connected client: the store, its adapters and the mounted view.
pub struct App {
    store: Store,
    auth: Arc<dyn AuthAdapter>,
    realtime: Arc<dyn RealtimeAdapter>,
    oracle: Option<Oracle>,
    mounted: Option<MountedView>,
}

impl App {
    pub fn new(
        remote: Arc<dyn RemoteDataService>,
        realtime: Arc<dyn RealtimeAdapter>,
        auth: Arc<dyn AuthAdapter>,
        oracle: Option<Oracle>,
        settings: StoreSettings,
    ) -> Self {
        Self {
            store: Store::new(remote, auth.clone(), settings),
            auth,
            realtime,
            oracle,
            mounted: None,
        }
    }

    /// Build the backend adapters, restore the saved session and keep it
    /// persisted from here on.
    pub fn connect(config: &PtokyoConfig) -> Result<Self, PtokyoError> {
        let anon_key = ptokyo_config::credentials::supabase_anon_key(config)?;
        let backend = SupabaseBackend::from_config(config, anon_key)?;

        if let Some(path) = session::session_path() {
            if let Some(saved) = session::load(&path) {
                backend.auth.restore(saved, Utc::now().timestamp());
            }
            session::spawn_persister(backend.auth.session_changes(), path);
        }

        info!(url = %config.supabase.url, "backend adapters ready");
        Ok(Self::new(
            backend.rest,
            backend.realtime,
            backend.auth,
            build_oracle(config),
            store_settings(config),
        ))
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn mounted_view(&self) -> Option<View> {
        self.mounted.as_ref().map(MountedView::view)
    }

    /// Close the current view, then open `view` and switch to its mode.
    pub async fn mount(&mut self, view: View) -> Result<(), PtokyoError> {
        self.mounted = None;
        if self.store.mode() != view.mode() {
            self.store.toggle_mode();
        }
        self.mounted = Some(view::mount(&self.store, self.realtime.clone(), view).await?);
        Ok(())
    }

    pub async fn sign_in(&self, credentials: &Credentials) -> Result<String, PtokyoError> {
        let session = self.auth.sign_in(credentials).await?;
        Ok(format!(
            "signed in as {}",
            session.user.email.as_deref().unwrap_or(&session.user.id)
        ))
    }

    pub async fn sign_up(&self, credentials: &Credentials) -> Result<String, PtokyoError> {
        Ok(match self.auth.sign_up(credentials).await? {
            SignUpOutcome::SignedIn(session) => format!("welcome, {}", session.user.id),
            SignUpOutcome::ConfirmationRequired => {
                format!("check {} for a confirmation link", credentials.email)
            }
        })
    }

    /// Run one command. Auth prompts and `/quit` belong to the shell.
    pub async fn execute(&mut self, command: Command) -> Result<Option<String>, PtokyoError> {
        match command {
            Command::SignOut => {
                self.auth.sign_out().await?;
                Ok(Some("signed out".to_string()))
            }
            Command::Canvas => {
                self.mount(View::Canvas).await?;
                Ok(Some(render::state(&self.store.snapshot())))
            }
            Command::Presence => {
                self.mount(View::Presence).await?;
                Ok(Some(render::state(&self.store.snapshot())))
            }
            Command::Mode => {
                let mode = self.store.toggle_mode();
                self.mount(View::for_mode(mode)).await?;
                Ok(Some(format!("now in {mode} mode")))
            }
            Command::Add {
                kind,
                content,
                position,
            } => {
                let (x, y) = position.unwrap_or_else(|| {
                    let mut rng = rand::thread_rng();
                    (
                        rng.gen_range(-DROP_SPREAD..DROP_SPREAD),
                        rng.gen_range(-DROP_SPREAD..DROP_SPREAD),
                    )
                });
                let item = self.store.add_item(kind, content, x, y).await?;
                Ok(Some(format!("placed {}", item.id)))
            }
            Command::Move { id, x, y } => {
                self.store.update_item_position(&id, x, y).await?;
                Ok(None)
            }
            Command::Organize => Ok(Some(self.organize().await)),
            Command::Status(status) => {
                self.store.update_status(status).await?;
                Ok(Some(format!("status set to {status}")))
            }
            Command::Burn(text) => {
                let visual = self.store.burn(&text).await?;
                Ok(Some(format!(
                    "{} the worry burns at intensity {}",
                    "^^^".red(),
                    visual.intensity
                )))
            }
            Command::Legend => Ok(Some(urban_legend(self.oracle.as_ref()).await)),
            Command::Purify(text) => {
                let message = purification(self.oracle.as_ref(), &text).await;
                self.show_message(&message).await;
                Ok(Some(message))
            }
            Command::Zoom(scale) => {
                self.store.set_scale(scale)?;
                Ok(None)
            }
            Command::Pan(x, y) => {
                self.store.set_offset(x, y);
                Ok(None)
            }
            Command::Show => Ok(Some(render::state(&self.store.snapshot()))),
            Command::Scan => Ok(Some(
                "no camera here: the glitch scan needs a browser".to_string(),
            )),
            Command::Help => Ok(Some(render::help())),
            Command::SignIn { .. } | Command::SignUp { .. } | Command::Quit => Err(
                PtokyoError::InvalidInput("command is handled by the shell".to_string()),
            ),
        }
    }

    async fn organize(&self) -> String {
        let Some(oracle) = &self.oracle else {
            warn!("organize requested without a generation provider");
            return ORGANIZE_FAILED.to_string();
        };
        match oracle.organize(&self.store.items()).await {
            Ok(layout) => {
                let moved = self.store.apply_layout(&layout).await;
                format!(
                    "{moved} items gathered into {} clusters",
                    layout.clusters.len()
                )
            }
            Err(e) => {
                warn!(error = %e, "organize failed");
                ORGANIZE_FAILED.to_string()
            }
        }
    }

    /// Float a generated message over the user's spot, or the center when
    /// signed out.
    async fn show_message(&self, text: &str) {
        let (x, y) = match self.store.current_user_id().await {
            Some(id) => {
                let point = project(&id);
                (point.x, point.y)
            }
            None => (50.0, 50.0),
        };
        self.store.add_local_message(VisualBonfire {
            id: uuid::Uuid::new_v4().to_string(),
            x,
            y,
            intensity: 1,
            text: text.to_string(),
            created_at: Utc::now(),
        });
    }
}

#[cfg(test)]
mod tests {
    use ptokyo_core::{ItemKind, MoodStatus, Table};
    use ptokyo_store::AppMode;
    use ptokyo_test_utils::{MockAuth, MockGenerator, MockRemote, RemoteOp};
    use serde_json::json;

    use super::*;

    fn settings() -> StoreSettings {
        StoreSettings {
            burn_delay: Duration::ZERO,
            ..StoreSettings::default()
        }
    }

    fn app(remote: &MockRemote, auth: MockAuth, generator: Option<MockGenerator>) -> App {
        App::new(
            Arc::new(remote.clone()),
            Arc::new(remote.clone()),
            Arc::new(auth),
            generator.map(|g| Oracle::new(Arc::new(g), OracleSettings::default())),
            settings(),
        )
    }

    fn item_row(id: &str) -> serde_json::Value {
        json!({
            "id": id, "user_id": "u1", "type": "text", "content": id,
            "position_x": 0.0, "position_y": 0.0, "created_at": "2026-01-01T00:00:00Z"
        })
    }

    #[tokio::test]
    async fn mode_switch_remounts_matching_view() {
        let remote = MockRemote::new();
        let mut app = app(&remote, MockAuth::signed_in("u1"), None);

        app.execute(Command::Canvas).await.unwrap();
        assert_eq!(app.mounted_view(), Some(View::Canvas));
        assert_eq!(app.store().mode(), AppMode::Silence);

        let reply = app.execute(Command::Mode).await.unwrap().unwrap();
        assert_eq!(reply, "now in glitch mode");
        assert_eq!(app.mounted_view(), Some(View::Presence));
        assert_eq!(remote.subscriber_count(Table::Items), 0);
        assert_eq!(remote.subscriber_count(Table::Bonfires), 1);

        app.execute(Command::Canvas).await.unwrap();
        assert_eq!(app.store().mode(), AppMode::Silence);
        assert_eq!(remote.subscriber_count(Table::Profiles), 0);
    }

    #[tokio::test]
    async fn add_without_position_lands_near_center() {
        let remote = MockRemote::new();
        let mut app = app(&remote, MockAuth::signed_in("u1"), None);
        app.execute(Command::Add {
            kind: ItemKind::Text,
            content: "karaoke".into(),
            position: None,
        })
        .await
        .unwrap();

        let items = app.store().items();
        assert_eq!(items.len(), 1);
        assert!(items[0].x.abs() <= DROP_SPREAD && items[0].y.abs() <= DROP_SPREAD);
        assert_eq!(remote.calls_to(Table::Items, RemoteOp::Insert).len(), 1);
    }

    #[tokio::test]
    async fn add_while_signed_out_is_refused() {
        let remote = MockRemote::new();
        let mut app = app(&remote, MockAuth::signed_out(), None);
        let err = app
            .execute(Command::Add {
                kind: ItemKind::Text,
                content: "x".into(),
                position: Some((0.0, 0.0)),
            })
            .await
            .unwrap_err();
        assert!(matches!(err, PtokyoError::NotAuthenticated));
        assert!(remote.calls().is_empty());
    }

    #[tokio::test]
    async fn organize_moves_items_from_layout() {
        let remote = MockRemote::new();
        remote.seed(Table::Items, vec![item_row("a"), item_row("b")]);
        let generator = MockGenerator::with_responses(vec![
            json!({
                "clusters": [
                    { "title": "Night", "items": [
                        { "id": "a", "x": 300.0, "y": -100.0 },
                        { "id": "b", "x": 320.0, "y": -80.0 }
                    ]}
                ]
            })
            .to_string(),
        ]);
        let mut app = app(&remote, MockAuth::signed_in("u1"), Some(generator));
        app.store().fetch_canvas().await.unwrap();

        let reply = app.execute(Command::Organize).await.unwrap().unwrap();
        assert_eq!(reply, "2 items gathered into 1 clusters");
        assert_eq!(app.store().item("a").unwrap().x, 300.0);
        assert_eq!(remote.calls_to(Table::Items, RemoteOp::Update).len(), 2);
    }

    #[tokio::test]
    async fn organize_failure_is_reported_in_universe() {
        let remote = MockRemote::new();
        remote.seed(Table::Items, vec![item_row("a"), item_row("b")]);
        let mut app = app(&remote, MockAuth::signed_in("u1"), Some(MockGenerator::failing()));
        app.store().fetch_canvas().await.unwrap();

        let reply = app.execute(Command::Organize).await.unwrap().unwrap();
        assert_eq!(reply, ORGANIZE_FAILED);
        assert!(remote.calls_to(Table::Items, RemoteOp::Update).is_empty());
    }

    #[tokio::test]
    async fn purify_shows_message_at_center_when_signed_out() {
        let remote = MockRemote::new();
        let generator = MockGenerator::with_responses(vec!["Let it drift over Shibuya.".into()]);
        let mut app = app(&remote, MockAuth::signed_out(), Some(generator));

        let reply = app
            .execute(Command::Purify("deadline".into()))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(reply, "Let it drift over Shibuya.");
        let bonfires = app.store().bonfires();
        assert_eq!(bonfires.len(), 1);
        assert_eq!((bonfires[0].x, bonfires[0].y), (50.0, 50.0));
        assert_eq!(bonfires[0].text, reply);
    }

    #[tokio::test]
    async fn legend_without_provider_uses_fallback() {
        let remote = MockRemote::new();
        let mut app = app(&remote, MockAuth::signed_out(), None);
        let legend = app.execute(Command::Legend).await.unwrap().unwrap();
        assert!(LEGEND_FALLBACKS.contains(&legend.as_str()));
    }

    #[tokio::test]
    async fn status_and_burn_reach_the_remote() {
        let remote = MockRemote::new();
        let mut app = app(&remote, MockAuth::signed_in("u1"), None);

        app.execute(Command::Status(MoodStatus::Anxious)).await.unwrap();
        assert_eq!(remote.calls_to(Table::Profiles, RemoteOp::Upsert).len(), 1);

        app.execute(Command::Burn("overtime".into())).await.unwrap();
        let inserts = remote.calls_to(Table::Bonfires, RemoteOp::Insert);
        assert_eq!(inserts.len(), 1);
        assert!(inserts[0].payload.get("text").is_none());
    }

    #[tokio::test]
    async fn sign_up_reports_pending_confirmation() {
        let remote = MockRemote::new();
        let app = app(&remote, MockAuth::signed_out(), None);
        let reply = app
            .sign_up(&Credentials {
                email: "kaito@example.com".into(),
                password: "hunter22".into(),
            })
            .await
            .unwrap();
        assert_eq!(reply, "check kaito@example.com for a confirmation link");
    }

    #[tokio::test]
    async fn zoom_rejects_nonpositive_scale() {
        let remote = MockRemote::new();
        let mut app = app(&remote, MockAuth::signed_out(), None);
        assert!(app.execute(Command::Zoom(0.0)).await.is_err());
        app.execute(Command::Zoom(2.0)).await.unwrap();
        assert_eq!(app.store().scale(), 2.0);
    }

    #[test]
    fn unknown_provider_falls_back_to_offline_text() {
        let mut config = PtokyoConfig::default();
        config.generation.provider = "mystery".into();
        assert!(build_oracle(&config).is_none());
    }
}
