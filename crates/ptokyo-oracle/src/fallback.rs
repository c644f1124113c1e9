// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Offline texts shown when the generation service cannot answer.

use rand::seq::SliceRandom;

/// Urban legends used when the legend generator fails or returns nothing.
pub const LEGEND_FALLBACKS: &[&str] = &[
    "In the basement of Shibuya Station, there is a ticket gate that only opens at 3:33 AM. Those who pass through never return to the Yamanote Line.",
    "The crows in Yoyogi Park aren't birds. They are surveillance drones left over from a failed 1980s government experiment. Listen closely, and you can hear their gears grinding.",
    "If you stare at the Tokyo Tower from a specific angle in Roppongi, you can see the shadow of a second, inverted tower hanging from the sky.",
    "There is a vending machine in Akihabara that sells 'yesterday's memories' in a can. Drinking it makes you forget who you were 24 hours ago.",
];

/// Messages used when a purification cannot be generated.
pub const PURIFICATION_FALLBACKS: &[&str] = &[
    "The smoke carries it past the last train. It is no longer yours to hold.",
    "The city swallowed your words. Only warm ash remains.",
    "Somewhere in Shinjuku, a neon sign flickered once for you. It is done.",
    "The river under the expressway took it out to the bay. Breathe.",
];

/// Shown only if a fallback set were ever empty.
const STATIC_SIGNAL: &str = "The signal is too weak... reality is stable here.";

/// Uniform random pick from `set`.
pub fn pick(set: &'static [&'static str]) -> &'static str {
    set.choose(&mut rand::thread_rng())
        .copied()
        .unwrap_or(STATIC_SIGNAL)
}
