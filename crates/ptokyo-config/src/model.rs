// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Parallel Tokyo client.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use serde::{Deserialize, Serialize};

/// Top-level client configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable overrides.
/// All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PtokyoConfig {
    /// Client process settings.
    #[serde(default)]
    pub client: ClientConfig,

    /// Managed backend (row store, auth, realtime) settings.
    #[serde(default)]
    pub supabase: SupabaseConfig,

    /// Which text generator to use and how to prompt it.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// OpenAI API settings.
    #[serde(default)]
    pub openai: OpenAiConfig,

    /// Google Gemini API settings.
    #[serde(default)]
    pub gemini: GeminiConfig,

    /// Presence layer timing.
    #[serde(default)]
    pub presence: PresenceConfig,
}

/// Client process configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ClientConfig {
    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Managed backend configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SupabaseConfig {
    /// Project URL, e.g. `https://abcd.supabase.co`.
    #[serde(default = "default_supabase_url")]
    pub url: String,

    /// Public anon key. `None` falls back to `SUPABASE_ANON_KEY` or a prompt.
    #[serde(default)]
    pub anon_key: Option<String>,

    /// Interval between realtime socket heartbeats.
    #[serde(default = "default_heartbeat_secs")]
    pub realtime_heartbeat_secs: u64,

    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for SupabaseConfig {
    fn default() -> Self {
        Self {
            url: default_supabase_url(),
            anon_key: None,
            realtime_heartbeat_secs: default_heartbeat_secs(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_supabase_url() -> String {
    "http://127.0.0.1:54321".to_string()
}

fn default_heartbeat_secs() -> u64 {
    30
}

fn default_request_timeout_secs() -> u64 {
    30
}

/// Text generation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// Provider name: `openai` or `gemini`.
    #[serde(default = "default_provider")]
    pub provider: String,

    /// Place the urban legends are set in.
    #[serde(default = "default_legend_context")]
    pub legend_context: String,

    /// Maximum characters of user text forwarded to the purification prompt.
    #[serde(default = "default_excerpt_chars")]
    pub purification_excerpt_chars: usize,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            provider: default_provider(),
            legend_context: default_legend_context(),
            purification_excerpt_chars: default_excerpt_chars(),
        }
    }
}

/// Provider names accepted by `generation.provider`.
pub const KNOWN_PROVIDERS: &[&str] = &["openai", "gemini"];

fn default_provider() -> String {
    "openai".to_string()
}

fn default_legend_context() -> String {
    "Tokyo".to_string()
}

fn default_excerpt_chars() -> usize {
    100
}

/// OpenAI API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OpenAiConfig {
    /// API key. `None` falls back to `OPENAI_API_KEY` or a prompt.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Chat completion model.
    #[serde(default = "default_openai_model")]
    pub model: String,

    /// API base URL (override for proxies).
    #[serde(default = "default_openai_base_url")]
    pub base_url: String,
}

impl Default for OpenAiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_openai_model(),
            base_url: default_openai_base_url(),
        }
    }
}

fn default_openai_model() -> String {
    "gpt-4o".to_string()
}

fn default_openai_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

/// Google Gemini API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GeminiConfig {
    /// API key. `None` falls back to `GEMINI_API_KEY` or a prompt.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Generative model name.
    #[serde(default = "default_gemini_model")]
    pub model: String,

    /// API base URL.
    #[serde(default = "default_gemini_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            model: default_gemini_model(),
            base_url: default_gemini_base_url(),
        }
    }
}

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}

fn default_gemini_base_url() -> String {
    "https://generativelanguage.googleapis.com/v1beta".to_string()
}

/// Presence layer configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct PresenceConfig {
    /// A profile counts as present if active within this many seconds.
    #[serde(default = "default_active_window_secs")]
    pub active_window_secs: u64,

    /// Lifetime of a bonfire animation.
    #[serde(default = "default_bonfire_ttl_secs")]
    pub bonfire_ttl_secs: u64,

    /// Lifetime of a generated message shown on screen.
    #[serde(default = "default_message_ttl_secs")]
    pub message_ttl_secs: u64,

    /// Pause between pressing "burn" and the broadcast.
    #[serde(default = "default_burn_delay_ms")]
    pub burn_delay_ms: u64,
}

impl Default for PresenceConfig {
    fn default() -> Self {
        Self {
            active_window_secs: default_active_window_secs(),
            bonfire_ttl_secs: default_bonfire_ttl_secs(),
            message_ttl_secs: default_message_ttl_secs(),
            burn_delay_ms: default_burn_delay_ms(),
        }
    }
}

fn default_active_window_secs() -> u64 {
    3600
}

fn default_bonfire_ttl_secs() -> u64 {
    5
}

fn default_message_ttl_secs() -> u64 {
    10
}

fn default_burn_delay_ms() -> u64 {
    1500
}
