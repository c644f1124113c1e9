// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! API credential resolution: config file, then environment, then a hidden TTY prompt.

use ptokyo_core::PtokyoError;
use secrecy::SecretString;

use crate::model::PtokyoConfig;

/// Fallback variable for the OpenAI key.
pub const OPENAI_KEY_ENV_VAR: &str = "OPENAI_API_KEY";

/// Fallback variable for the Gemini key.
pub const GEMINI_KEY_ENV_VAR: &str = "GEMINI_API_KEY";

/// Fallback variable for the backend's public anon key.
pub const SUPABASE_ANON_KEY_ENV_VAR: &str = "SUPABASE_ANON_KEY";

/// Resolve one secret.
///
/// Priority:
/// 1. the value from configuration (which already includes `PTOKYO_*` overrides)
/// 2. the conventional `env_var`
/// 3. an interactive prompt labelled `label`, when stdin is a terminal
pub fn resolve_secret(
    configured: Option<&str>,
    env_var: &str,
    label: &str,
) -> Result<SecretString, PtokyoError> {
    if let Some(value) = configured
        && !value.trim().is_empty()
    {
        return Ok(SecretString::from(value.trim().to_string()));
    }

    if let Ok(value) = std::env::var(env_var)
        && !value.trim().is_empty()
    {
        tracing::debug!(env_var, "credential taken from environment");
        return Ok(SecretString::from(value.trim().to_string()));
    }

    if std::io::IsTerminal::is_terminal(&std::io::stdin()) {
        eprint!("{label}: ");
        let value = rpassword::read_password()
            .map_err(|e| PtokyoError::Config(format!("failed to read {label}: {e}")))?;
        if value.trim().is_empty() {
            return Err(PtokyoError::Config(format!("empty {label} not allowed")));
        }
        return Ok(SecretString::from(value.trim().to_string()));
    }

    Err(PtokyoError::Config(format!(
        "no {label} provided. Set it in ptokyo.toml, export {env_var}, or run interactively."
    )))
}

/// OpenAI API key for the configured account.
pub fn openai_api_key(config: &PtokyoConfig) -> Result<SecretString, PtokyoError> {
    resolve_secret(
        config.openai.api_key.as_deref(),
        OPENAI_KEY_ENV_VAR,
        "OpenAI API key",
    )
}

/// Gemini API key for the configured account.
pub fn gemini_api_key(config: &PtokyoConfig) -> Result<SecretString, PtokyoError> {
    resolve_secret(
        config.gemini.api_key.as_deref(),
        GEMINI_KEY_ENV_VAR,
        "Gemini API key",
    )
}

/// Public anon key of the backend project.
pub fn supabase_anon_key(config: &PtokyoConfig) -> Result<SecretString, PtokyoError> {
    resolve_secret(
        config.supabase.anon_key.as_deref(),
        SUPABASE_ANON_KEY_ENV_VAR,
        "Supabase anon key",
    )
}

#[cfg(test)]
mod tests {
    use secrecy::ExposeSecret;
    use serial_test::serial;

    use super::*;

    const TEST_VAR: &str = "PTOKYO_TEST_CREDENTIAL";

    #[test]
    #[serial]
    fn configured_value_wins_over_env() {
        // SAFETY: test-only env mutation, serialized with #[serial].
        unsafe { std::env::set_var(TEST_VAR, "from-env") };
        let result = resolve_secret(Some("from-config"), TEST_VAR, "test key");
        unsafe { std::env::remove_var(TEST_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "from-config");
    }

    #[test]
    #[serial]
    fn env_var_used_when_config_missing() {
        unsafe { std::env::set_var(TEST_VAR, " from-env ") };
        let result = resolve_secret(None, TEST_VAR, "test key");
        unsafe { std::env::remove_var(TEST_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn blank_config_value_falls_through_to_env() {
        unsafe { std::env::set_var(TEST_VAR, "from-env") };
        let result = resolve_secret(Some("   "), TEST_VAR, "test key");
        unsafe { std::env::remove_var(TEST_VAR) };

        assert_eq!(result.unwrap().expose_secret(), "from-env");
    }

    #[test]
    #[serial]
    fn missing_everywhere_is_a_config_error() {
        unsafe { std::env::remove_var(TEST_VAR) };
        // Test harness stdin is not a terminal, so no prompt is attempted.
        let err = resolve_secret(None, TEST_VAR, "test key").unwrap_err();
        assert!(matches!(err, PtokyoError::Config(_)));
        assert!(err.to_string().contains(TEST_VAR));
    }

    #[test]
    #[serial]
    fn openai_key_read_from_config() {
        let mut config = PtokyoConfig::default();
        config.openai.api_key = Some("sk-test".to_string());
        assert_eq!(openai_api_key(&config).unwrap().expose_secret(), "sk-test");
    }
}
