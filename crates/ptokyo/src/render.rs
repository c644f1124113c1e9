// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Text rendering of store state for the terminal views.

use std::collections::HashSet;
use std::fmt::Write as _;

use colored::Colorize;

use ptokyo_core::{Cluster, Item, MoodStatus, Profile, VisualBonfire};
use ptokyo_store::optimistic::is_placeholder;
use ptokyo_store::{AppMode, CanvasState, StoreEvent, project};

const HELP: &[(&str, &str)] = &[
    ("/signin <email>", "sign in (password is prompted)"),
    ("/signup <email>", "create an account"),
    ("/signout", "end the session"),
    ("/canvas", "open the shared canvas"),
    ("/presence", "open the presence view"),
    ("/add <text|image|link> <content> [x y]", "place an item"),
    ("/move <id> <x> <y>", "move an item"),
    ("/status <mood>", "tired, melancholy, calm, anxious or neutral"),
    ("/burn <worry>", "burn a worry (plain text does the same)"),
    ("/legend", "hear an urban legend"),
    ("/purify <worry>", "ask for a release message"),
    ("/organize", "let the oracle cluster the canvas"),
    ("/mode", "switch between silence and glitch"),
    ("/zoom <scale>", "set canvas scale"),
    ("/pan <x> <y>", "set canvas offset"),
    ("/show", "print the current view"),
    ("/scan", "camera glitch scan"),
    ("/quit", "leave"),
];

pub fn help() -> String {
    let mut out = String::new();
    for (usage, what) in HELP {
        let _ = writeln!(out, "  {:<42} {}", usage.yellow(), what.dimmed());
    }
    out
}

fn mood_label(status: MoodStatus) -> colored::ColoredString {
    let label = status.to_string();
    match status {
        MoodStatus::Tired => label.bright_black(),
        MoodStatus::Melancholy => label.blue(),
        MoodStatus::Calm => label.green(),
        MoodStatus::Anxious => label.red(),
        MoodStatus::Neutral => label.normal(),
    }
}

pub fn items(items: &[Item]) -> String {
    if items.is_empty() {
        return format!("  {}\n", "the canvas is empty".dimmed());
    }
    let mut out = String::new();
    for item in items {
        let saving = if is_placeholder(&item.id) {
            format!(" {}", "(saving)".dimmed())
        } else {
            String::new()
        };
        let _ = writeln!(
            out,
            "  {} [{}] {} @ ({:.0}, {:.0}){saving}",
            item.id.cyan(),
            item.kind,
            item.content,
            item.x,
            item.y
        );
    }
    out
}

pub fn clusters(clusters: &[Cluster]) -> String {
    let mut out = String::new();
    for cluster in clusters {
        let _ = writeln!(
            out,
            "  {} @ ({:.0}, {:.0})",
            cluster.title.bold(),
            cluster.centroid_x,
            cluster.centroid_y
        );
    }
    out
}

pub fn profiles(profiles: &[Profile]) -> String {
    if profiles.is_empty() {
        return format!("  {}\n", "nobody else is awake".dimmed());
    }
    let mut out = String::new();
    for profile in profiles {
        let point = project(&profile.id);
        let _ = writeln!(
            out,
            "  ({:>2.0}%, {:>2.0}%) {}",
            point.x,
            point.y,
            mood_label(profile.status)
        );
    }
    out
}

pub fn bonfires(bonfires: &[VisualBonfire]) -> String {
    let mut out = String::new();
    for bonfire in bonfires {
        let flames = "^".repeat(usize::try_from(bonfire.intensity.max(1)).unwrap_or(1));
        let _ = writeln!(
            out,
            "  {} ({:.0}%, {:.0}%) {}",
            flames.red(),
            bonfire.x,
            bonfire.y,
            bonfire.text.italic()
        );
    }
    out
}

/// The whole current view, as `/show` prints it.
pub fn state(state: &CanvasState) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} mode, status {}, zoom {:.2}, offset ({:.0}, {:.0}){}",
        state.mode.to_string().bold(),
        mood_label(state.current_user_status),
        state.scale,
        state.offset.0,
        state.offset.1,
        if state.is_loading { " loading..." } else { "" }
    );
    match state.mode {
        AppMode::Silence => {
            out.push_str(&clusters(&state.clusters));
            out.push_str(&items(&state.items));
        }
        AppMode::Glitch => {
            out.push_str(&profiles(&state.profiles));
            out.push_str(&bonfires(&state.bonfires));
        }
    }
    out
}

/// One-line notices for changes the user may not have caused.
///
/// Bonfires are announced once, when they appear. The same store event fires
/// again when one burns out, which stays silent.
#[derive(Debug, Default)]
pub struct Notices {
    shown_bonfires: HashSet<String>,
}

impl Notices {
    pub fn line(&mut self, state: &CanvasState, event: StoreEvent) -> Option<String> {
        let line = match event {
            StoreEvent::Items => format!("{} items on the canvas", state.items.len()),
            StoreEvent::Clusters => format!("{} clusters", state.clusters.len()),
            StoreEvent::Profiles => format!("{} others awake", state.profiles.len()),
            StoreEvent::Bonfires => {
                self.shown_bonfires
                    .retain(|id| state.bonfires.iter().any(|b| b.id == *id));
                let fresh = state
                    .bonfires
                    .iter()
                    .rev()
                    .find(|b| !self.shown_bonfires.contains(&b.id))?;
                self.shown_bonfires.insert(fresh.id.clone());
                format!("{} {}", "^".repeat(3).red(), fresh.text)
            }
            StoreEvent::Mode => format!("now in {} mode", state.mode),
            StoreEvent::BonfireLog
            | StoreEvent::Status
            | StoreEvent::Viewport
            | StoreEvent::Loading => return None,
        };
        Some(format!("{} {}", "~".dimmed(), line))
    }
}
