// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./ptokyo.toml` > `~/.config/ptokyo/ptokyo.toml` >
//! `/etc/ptokyo/ptokyo.toml`, with environment variable overrides via the
//! `PTOKYO_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and unboxed

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::PtokyoConfig;

/// System-wide config file.
pub const SYSTEM_CONFIG_PATH: &str = "/etc/ptokyo/ptokyo.toml";

/// Config file looked up in the working directory.
pub const LOCAL_CONFIG_FILE: &str = "ptokyo.toml";

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/ptokyo/ptokyo.toml` (system-wide)
/// 3. `~/.config/ptokyo/ptokyo.toml` (user XDG config)
/// 4. `./ptokyo.toml` (local directory)
/// 5. `PTOKYO_*` environment variables
pub fn load_config() -> Result<PtokyoConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no XDG lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<PtokyoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PtokyoConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<PtokyoConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(PtokyoConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(PtokyoConfig::default()))
        .merge(Toml::file(SYSTEM_CONFIG_PATH))
        .merge(Toml::file(user_config_path().unwrap_or_default()))
        .merge(Toml::file(LOCAL_CONFIG_FILE))
        .merge(env_provider())
}

/// Path of the per-user config file, if a config dir exists on this platform.
pub fn user_config_path() -> Option<std::path::PathBuf> {
    dirs::config_dir().map(|d| d.join("ptokyo").join(LOCAL_CONFIG_FILE))
}

/// Create the environment variable provider using explicit `map()` for section-to-dot mapping.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `PTOKYO_SUPABASE_ANON_KEY` must map to `supabase.anon_key`,
/// not `supabase.anon.key`. Keys arrive with their environment spelling
/// (`SUPABASE_ANON_KEY`), so they are lowercased before mapping.
fn env_provider() -> Env {
    Env::prefixed("PTOKYO_").map(|key| {
        let mapped = key
            .as_str()
            .to_ascii_lowercase()
            .replacen("client_", "client.", 1)
            .replacen("supabase_", "supabase.", 1)
            .replacen("generation_", "generation.", 1)
            .replacen("openai_", "openai.", 1)
            .replacen("gemini_", "gemini.", 1)
            .replacen("presence_", "presence.", 1);
        mapped.into()
    })
}
