// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Flavor text and canvas organization on top of a [`GenerationAdapter`].
//!
//! [`Oracle::urban_legend`] and [`Oracle::purification`] never fail: any
//! service error or empty answer is logged and replaced by an offline
//! fallback. [`Oracle::organize`] returns its errors so the caller can pick
//! what to show.

pub mod fallback;
pub mod layout;
pub mod prompts;

use std::sync::Arc;

use tracing::{debug, warn};

use ptokyo_config::PtokyoConfig;
use ptokyo_core::{CompletionRequest, GenerationAdapter, Item, Layout, PtokyoError};

pub use fallback::{LEGEND_FALLBACKS, PURIFICATION_FALLBACKS};
pub use layout::parse_layout;

/// Fewest items worth organizing.
pub const MIN_ORGANIZE_ITEMS: usize = 2;

/// Generation knobs taken from the `[generation]` section.
#[derive(Debug, Clone)]
pub struct OracleSettings {
    pub legend_context: String,
    pub excerpt_chars: usize,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            legend_context: "Tokyo".to_string(),
            excerpt_chars: 100,
        }
    }
}

impl From<&PtokyoConfig> for OracleSettings {
    fn from(config: &PtokyoConfig) -> Self {
        Self {
            legend_context: config.generation.legend_context.clone(),
            excerpt_chars: config.generation.purification_excerpt_chars,
        }
    }
}

/// Wraps one generation provider with the app's instruction templates.
#[derive(Clone)]
pub struct Oracle {
    generator: Arc<dyn GenerationAdapter>,
    settings: OracleSettings,
}

impl Oracle {
    pub fn new(generator: Arc<dyn GenerationAdapter>, settings: OracleSettings) -> Self {
        Self {
            generator,
            settings,
        }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }

    /// Completion text, or `None` when the call failed or came back blank.
    async fn ask(&self, use_case: &str, request: CompletionRequest) -> Option<String> {
        match self.generator.complete(request).await {
            Ok(response) => {
                let text = response.text.trim();
                if text.is_empty() {
                    warn!(use_case, model = %response.model, "generator returned empty text");
                    None
                } else {
                    debug!(use_case, model = %response.model, "generated");
                    Some(text.to_string())
                }
            }
            Err(e) => {
                warn!(use_case, error = %e, "generation failed, using fallback");
                None
            }
        }
    }

    /// A short urban legend set in the configured place.
    pub async fn urban_legend(&self) -> String {
        let request = CompletionRequest {
            system: Some(prompts::LEGEND_SYSTEM.to_string()),
            prompt: prompts::legend_prompt(&self.settings.legend_context),
            temperature: Some(0.9),
            max_tokens: Some(100),
            json_mode: false,
        };
        match self.ask("urban_legend", request).await {
            Some(text) => text,
            None => fallback::pick(LEGEND_FALLBACKS).to_string(),
        }
    }

    /// A one-line release message for a burned worry.
    ///
    /// Only a trimmed excerpt of `text` is sent.
    pub async fn purification(&self, text: &str) -> String {
        let excerpt = prompts::excerpt(text, self.settings.excerpt_chars);
        if excerpt.is_empty() {
            return fallback::pick(PURIFICATION_FALLBACKS).to_string();
        }
        let request = CompletionRequest {
            system: Some(prompts::PURIFICATION_SYSTEM.to_string()),
            prompt: prompts::purification_prompt(excerpt),
            temperature: Some(0.8),
            max_tokens: Some(60),
            json_mode: false,
        };
        match self.ask("purification", request).await {
            Some(text) => text,
            None => fallback::pick(PURIFICATION_FALLBACKS).to_string(),
        }
    }

    /// Ask the generator to group `items` into titled clusters with new
    /// positions in canvas coordinates (-1000..1000).
    pub async fn organize(&self, items: &[Item]) -> Result<Layout, PtokyoError> {
        if items.len() < MIN_ORGANIZE_ITEMS {
            return Err(PtokyoError::generation("add at least 2 items to organize"));
        }
        let prompt = prompts::organizer_prompt(items).map_err(|e| PtokyoError::Generation {
            message: format!("failed to encode items: {e}"),
            source: Some(Box::new(e)),
        })?;
        let response = self
            .generator
            .complete(CompletionRequest {
                system: Some(prompts::ORGANIZER_SYSTEM.to_string()),
                prompt,
                temperature: None,
                max_tokens: None,
                json_mode: true,
            })
            .await?;
        let layout = parse_layout(&response.text)?;
        debug!(
            clusters = layout.clusters.len(),
            placements = layout.placements().count(),
            "organizer layout parsed"
        );
        Ok(layout)
    }
}
