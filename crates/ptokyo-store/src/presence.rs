// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Spatial presence projection.
//!
//! Maps an opaque user id to a stable position on screen so presence markers
//! land in the same place across reloads without storing coordinates.

use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use ptokyo_core::Profile;

/// Width of the band positions are confined to, in screen percent.
const BAND: i32 = 80;

/// Distance kept from every screen edge, in screen percent.
const MARGIN: i32 = 10;

/// A position in screen percent, each axis within `[10, 90]`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: f64,
    pub y: f64,
}

/// 32-bit rolling hash (`h * 31 + c`) over UTF-16 code units, wrapping like a signed int.
fn rolling_hash(id: &str) -> i32 {
    id.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_shl(5)
            .wrapping_sub(hash)
            .wrapping_add(i32::from(unit))
    })
}

/// Deterministic screen position for `id`.
pub fn project(id: &str) -> ScreenPoint {
    let hash = rolling_hash(id);
    // `>>` on i32 is arithmetic, so the sign survives the shift.
    let x = (hash % BAND).abs() + MARGIN;
    let y = ((hash >> 8) % BAND).abs() + MARGIN;
    ScreenPoint {
        x: f64::from(x),
        y: f64::from(y),
    }
}

/// Earliest activity time that still counts as present, or `None` when the
/// window reaches back past the representable range.
pub fn active_cutoff(now: DateTime<Utc>, window: Duration) -> Option<DateTime<Utc>> {
    TimeDelta::from_std(window)
        .ok()
        .and_then(|delta| now.checked_sub_signed(delta))
}

/// Whether `profile` was active strictly after `now - window`.
pub fn is_active(profile: &Profile, now: DateTime<Utc>, window: Duration) -> bool {
    match active_cutoff(now, window) {
        Some(cutoff) => profile.last_active_at > cutoff,
        None => true,
    }
}
