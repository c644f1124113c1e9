// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Instruction templates for the three generation use cases.

use serde::Serialize;

use ptokyo_core::{Item, ItemKind};

pub const LEGEND_SYSTEM: &str = "You are an AI that narrates the hidden, darker side of reality.";

pub const PURIFICATION_SYSTEM: &str =
    "You are the keeper of a city bonfire. You answer discarded worries with quiet, poetic release.";

pub const ORGANIZER_SYSTEM: &str = "You are a helpful assistant that outputs JSON.";

pub fn legend_prompt(context: &str) -> String {
    format!(
        "Generate a short, creepy, and surreal urban legend about a specific location in {context}.\n\
         The story should feel like a \"glitch in reality\" or a \"secret hidden in plain sight\".\n\
         Keep it under 200 characters.\n\
         Style: Cyberpunk, SCP Foundation, Creepypasta.\n\
         Output ONLY the story text. Do not include any intro or outro."
    )
}

/// Trim `text` and keep at most `max_chars` characters of it.
pub fn excerpt(text: &str, max_chars: usize) -> &str {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((end, _)) => &trimmed[..end],
        None => trimmed,
    }
}

pub fn purification_prompt(excerpt: &str) -> String {
    format!(
        "Someone in Tokyo just burned this worry in a bonfire:\n\
         \"{excerpt}\"\n\
         Reply with one short sentence that lets it go, like smoke leaving the city.\n\
         Keep it under 100 characters.\n\
         Output ONLY the message."
    )
}

#[derive(Serialize)]
struct OrganizerItem<'a> {
    id: &'a str,
    content: &'a str,
    #[serde(rename = "type")]
    kind: ItemKind,
}

pub fn organizer_prompt(items: &[Item]) -> Result<String, serde_json::Error> {
    let listing: Vec<OrganizerItem<'_>> = items
        .iter()
        .map(|i| OrganizerItem {
            id: &i.id,
            content: &i.content,
            kind: i.kind,
        })
        .collect();
    let listing = serde_json::to_string(&listing)?;
    Ok(format!(
        "You are an intelligent spatial organizer.\n\
         I have a list of items (notes, images, links) on a 2D canvas.\n\
         Your task is to:\n\
         1. Analyze the content of these items.\n\
         2. Group them into logical semantic clusters.\n\
         3. Assign a title to each cluster.\n\
         4. Calculate 2D coordinates (x, y) for each item so that items in the same cluster are close together, and clusters are spread out.\n\
         \n\
         The canvas coordinate system is roughly -1000 to 1000 for both x and y.\n\
         Spread the clusters out nicely.\n\
         \n\
         Return a JSON object with the following structure:\n\
         {{\"clusters\": [{{\"title\": \"Cluster Title\", \"items\": [{{\"id\": \"item_id\", \"x\": 123, \"y\": 456}}]}}]}}\n\
         \n\
         Here are the items:\n\
         {listing}"
    ))
}
