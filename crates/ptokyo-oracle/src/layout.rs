// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Parsing of organizer responses.

use ptokyo_core::{Layout, PtokyoError};

/// Drop a surrounding Markdown code fence (with or without a language tag).
fn strip_fence(text: &str) -> &str {
    let trimmed = text.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let body = match rest.find('\n') {
        Some(newline) => &rest[newline + 1..],
        None => rest,
    };
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

/// Parse an organizer reply into a [`Layout`].
pub fn parse_layout(text: &str) -> Result<Layout, PtokyoError> {
    let body = strip_fence(text);
    if body.is_empty() {
        return Err(PtokyoError::generation("organizer returned no content"));
    }
    serde_json::from_str(body).map_err(|e| PtokyoError::Generation {
        message: format!("organizer returned malformed layout: {e}"),
        source: Some(Box::new(e)),
    })
}
