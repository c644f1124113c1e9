// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks constraints serde attributes cannot express: URL schemes, positive
//! durations and known provider names.

use crate::diagnostic::ConfigError;
use crate::model::{KNOWN_PROVIDERS, PtokyoConfig};

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every problem instead of stopping at the first one.
pub fn validate_config(config: &PtokyoConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();

    check_url(&mut errors, "supabase.url", &config.supabase.url);
    check_url(&mut errors, "openai.base_url", &config.openai.base_url);
    check_url(&mut errors, "gemini.base_url", &config.gemini.base_url);

    let durations = [
        ("supabase.realtime_heartbeat_secs", config.supabase.realtime_heartbeat_secs),
        ("supabase.request_timeout_secs", config.supabase.request_timeout_secs),
        ("presence.active_window_secs", config.presence.active_window_secs),
        ("presence.bonfire_ttl_secs", config.presence.bonfire_ttl_secs),
        ("presence.message_ttl_secs", config.presence.message_ttl_secs),
    ];
    for (key, value) in durations {
        if value == 0 {
            errors.push(ConfigError::Validation {
                message: format!("{key} must be greater than zero"),
            });
        }
    }

    let provider = config.generation.provider.as_str();
    if !KNOWN_PROVIDERS.contains(&provider) {
        let hint = crate::diagnostic::suggest_key(provider, KNOWN_PROVIDERS)
            .map(|s| format!(" (did you mean `{s}`?)"))
            .unwrap_or_default();
        errors.push(ConfigError::Validation {
            message: format!(
                "generation.provider `{provider}` is not one of {}{hint}",
                KNOWN_PROVIDERS.join(", ")
            ),
        });
    }

    if config.generation.purification_excerpt_chars == 0 {
        errors.push(ConfigError::Validation {
            message: "generation.purification_excerpt_chars must be at least 1".to_string(),
        });
    }

    if config.generation.legend_context.trim().is_empty() {
        errors.push(ConfigError::Validation {
            message: "generation.legend_context must not be empty".to_string(),
        });
    }

    if errors.is_empty() { Ok(()) } else { Err(errors) }
}

fn check_url(errors: &mut Vec<ConfigError>, key: &str, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        errors.push(ConfigError::Validation {
            message: format!("{key} must not be empty"),
        });
    } else if !(value.starts_with("http://") || value.starts_with("https://")) {
        errors.push(ConfigError::Validation {
            message: format!("{key} `{value}` must start with http:// or https://"),
        });
    }
}
