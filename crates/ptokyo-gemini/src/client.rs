// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP client for the Gemini `generateContent` endpoint.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use tracing::{debug, warn};

use ptokyo_core::PtokyoError;

use crate::types::{ApiErrorResponse, GenerateRequest, GenerateResponse};

/// HTTP client for one Gemini model. The API key travels as the `key` query
/// parameter.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: SecretString, model: String, base_url: &str) -> Result<Self, PtokyoError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| PtokyoError::Generation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }

    /// Sends a generation request once. Any non-success status is a
    /// `Generation` error carrying the API's message; nothing is retried.
    pub async fn generate(
        &self,
        request: &GenerateRequest,
    ) -> Result<GenerateResponse, PtokyoError> {
        let response = self
            .client
            .post(self.generate_url())
            .query(&[("key", self.api_key.expose_secret())])
            .json(request)
            .send()
            .await
            .map_err(|e| PtokyoError::Generation {
                // Without the URL: it carries the key.
                message: format!("HTTP request failed: {}", e.without_url()),
                source: None,
            })?;

        let status = response.status();
        debug!(status = %status, model = %self.model, "generation response received");

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = %status, model = %self.model, "generation request rejected");
            let error_msg = match serde_json::from_str::<ApiErrorResponse>(&body) {
                Ok(api_err) => format!(
                    "Gemini API error ({}): {}",
                    api_err.error.status.as_deref().unwrap_or("UNKNOWN"),
                    api_err.error.message
                ),
                Err(_) => format!("API returned {status}: {body}"),
            };
            return Err(PtokyoError::generation(error_msg));
        }

        let body = response.text().await.map_err(|e| PtokyoError::Generation {
            message: format!("failed to read response body: {}", e.without_url()),
            source: None,
        })?;
        serde_json::from_str(&body).map_err(|e| PtokyoError::Generation {
            message: format!("failed to parse API response: {e}"),
            source: Some(Box::new(e)),
        })
    }
}
