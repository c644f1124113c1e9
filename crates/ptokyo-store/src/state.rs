// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! State held by the store and the change notifications it emits.

use ptokyo_core::{Bonfire, Cluster, Item, MoodStatus, Profile, VisualBonfire};

/// Which of the two experiences the client shows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AppMode {
    /// Shared note canvas.
    #[default]
    Silence,
    /// Mood presence and bonfires.
    Glitch,
}

impl AppMode {
    pub fn toggled(self) -> Self {
        match self {
            AppMode::Silence => AppMode::Glitch,
            AppMode::Glitch => AppMode::Silence,
        }
    }
}

impl std::fmt::Display for AppMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AppMode::Silence => write!(f, "silence"),
            AppMode::Glitch => write!(f, "glitch"),
        }
    }
}

/// Names the slice of [`CanvasState`] a transition touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreEvent {
    Items,
    Clusters,
    Profiles,
    /// Visual bonfires appeared or expired.
    Bonfires,
    /// Persisted bonfire events were refetched.
    BonfireLog,
    /// The user's mood and their own profile entry.
    Status,
    Mode,
    /// Scale or offset.
    Viewport,
    Loading,
}

/// Everything the views render.
#[derive(Debug, Clone, PartialEq)]
pub struct CanvasState {
    pub items: Vec<Item>,
    pub clusters: Vec<Cluster>,
    pub profiles: Vec<Profile>,
    pub bonfires: Vec<VisualBonfire>,
    pub bonfire_log: Vec<Bonfire>,
    pub current_user_status: MoodStatus,
    pub mode: AppMode,
    pub scale: f64,
    pub offset: (f64, f64),
    pub is_loading: bool,
}

impl Default for CanvasState {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            clusters: Vec::new(),
            profiles: Vec::new(),
            bonfires: Vec::new(),
            bonfire_log: Vec::new(),
            current_user_status: MoodStatus::default(),
            mode: AppMode::default(),
            scale: 1.0,
            offset: (0.0, 0.0),
            is_loading: false,
        }
    }
}
