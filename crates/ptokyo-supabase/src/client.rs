// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shared HTTP client for the managed backend.
//!
//! Every request carries the project's `apikey` header. `Authorization`
//! carries the signed-in user's access token when there is one and the anon
//! key otherwise, so row-level security sees the right role.

use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use reqwest::header::{HeaderMap, HeaderValue};
use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

use ptokyo_config::PtokyoConfig;
use ptokyo_core::PtokyoError;

/// HTTP client bound to one backend project.
#[derive(Clone)]
pub struct SupabaseClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: SecretString,
    access_token: Arc<RwLock<Option<String>>>,
}

impl std::fmt::Debug for SupabaseClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SupabaseClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl SupabaseClient {
    /// Creates a client for the project at `base_url`.
    pub fn new(
        base_url: &str,
        anon_key: SecretString,
        timeout: Duration,
    ) -> Result<Self, PtokyoError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            "apikey",
            HeaderValue::from_str(anon_key.expose_secret())
                .map_err(|e| PtokyoError::Config(format!("invalid anon key header value: {e}")))?,
        );

        let http = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()
            .map_err(|e| PtokyoError::Remote {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            access_token: Arc::new(RwLock::new(None)),
        })
    }

    /// Creates a client from the `[supabase]` section.
    pub fn from_config(config: &PtokyoConfig, anon_key: SecretString) -> Result<Self, PtokyoError> {
        Self::new(
            &config.supabase.url,
            anon_key,
            Duration::from_secs(config.supabase.request_timeout_secs),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub(crate) fn anon_key(&self) -> &str {
        self.anon_key.expose_secret()
    }

    /// Set or clear the user access token used for subsequent requests.
    pub fn set_access_token(&self, token: Option<String>) {
        *self
            .access_token
            .write()
            .unwrap_or_else(PoisonError::into_inner) = token;
    }

    /// Token sent as the bearer credential: the user's, else the anon key.
    pub fn bearer(&self) -> String {
        self.access_token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
            .unwrap_or_else(|| self.anon_key().to_string())
    }

    pub(crate) fn rest_url(&self, table: &str) -> String {
        format!("{}/rest/v1/{table}", self.base_url)
    }

    pub(crate) fn auth_url(&self, path: &str) -> String {
        format!("{}/auth/v1/{path}", self.base_url)
    }

    /// Websocket endpoint for realtime, with the anon key in the query.
    pub(crate) fn realtime_url(&self) -> String {
        let ws_base = if let Some(rest) = self.base_url.strip_prefix("https://") {
            format!("wss://{rest}")
        } else if let Some(rest) = self.base_url.strip_prefix("http://") {
            format!("ws://{rest}")
        } else {
            self.base_url.clone()
        };
        format!(
            "{ws_base}/realtime/v1/websocket?apikey={}&vsn=1.0.0",
            self.anon_key()
        )
    }

    /// Starts a request with the bearer credential attached.
    pub(crate) fn request(&self, method: Method, url: &str) -> RequestBuilder {
        self.http.request(method, url).bearer_auth(self.bearer())
    }
}

/// Error fields the backend services put in failed responses.
#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    error_description: Option<String>,
    msg: Option<String>,
    message: Option<String>,
    error: Option<serde_json::Value>,
}

/// Best human-readable message from a failed response body.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .error_description
        .or(parsed.msg)
        .or(parsed.message)
        .or_else(|| match parsed.error {
            Some(serde_json::Value::String(s)) => Some(s),
            _ => None,
        })
}

/// Consume a non-2xx response into its status and best message.
pub(crate) async fn failure_text(response: Response) -> String {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    match error_message(&body) {
        Some(message) => message,
        None if body.is_empty() => format!("status {status}"),
        None => format!("status {status}: {body}"),
    }
}

pub(crate) fn transport_error(context: &str, e: reqwest::Error) -> PtokyoError {
    PtokyoError::Remote {
        message: format!("{context}: {e}"),
        source: Some(Box::new(e)),
    }
}
