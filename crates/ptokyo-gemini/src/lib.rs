// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Google Gemini generation adapter.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info};

use ptokyo_config::PtokyoConfig;
use ptokyo_config::credentials::gemini_api_key;
use ptokyo_core::{
    AdapterType, CompletionRequest, CompletionResponse, GenerationAdapter, HealthStatus,
    PluginAdapter, PtokyoError,
};

use crate::client::GeminiClient;
use crate::types::{Content, GenerateRequest, GenerationConfig};

/// Gemini provider implementing [`GenerationAdapter`].
///
/// API key resolution: `gemini.api_key` -> `GEMINI_API_KEY` -> hidden prompt.
pub struct GeminiProvider {
    client: GeminiClient,
}

impl GeminiProvider {
    pub fn new(config: &PtokyoConfig) -> Result<Self, PtokyoError> {
        let api_key = gemini_api_key(config)?;
        let client =
            GeminiClient::new(api_key, config.gemini.model.clone(), &config.gemini.base_url)?;
        info!(model = %config.gemini.model, "Gemini provider initialized");
        Ok(Self { client })
    }

    pub fn with_client(client: GeminiClient) -> Self {
        Self { client }
    }
}

fn to_generate_request(request: &CompletionRequest) -> GenerateRequest {
    let config = GenerationConfig {
        temperature: request.temperature,
        max_output_tokens: request.max_tokens,
        response_mime_type: request.json_mode.then(|| "application/json".to_string()),
    };
    GenerateRequest {
        contents: vec![Content::user(request.prompt.clone())],
        system_instruction: request.system.as_ref().map(|s| Content::instruction(s.clone())),
        generation_config: (!config.is_empty()).then_some(config),
    }
}

#[async_trait]
impl PluginAdapter for GeminiProvider {
    fn name(&self) -> &str {
        "gemini"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Generation
    }

    async fn health_check(&self) -> Result<HealthStatus, PtokyoError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), PtokyoError> {
        Ok(())
    }
}

#[async_trait]
impl GenerationAdapter for GeminiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PtokyoError> {
        let response = self.client.generate(&to_generate_request(&request)).await?;
        let candidate = response
            .candidates
            .into_iter()
            .next()
            .ok_or_else(|| PtokyoError::generation("Gemini response had no candidates"))?;
        let text = candidate.content.map(|c| c.text()).unwrap_or_default();
        if text.is_empty() {
            return Err(PtokyoError::generation(format!(
                "Gemini candidate had no text (finish reason {})",
                candidate.finish_reason.as_deref().unwrap_or("unknown")
            )));
        }
        let model = response
            .model_version
            .unwrap_or_else(|| self.client.model().to_string());
        debug!(%model, chars = text.chars().count(), "completion received");
        Ok(CompletionResponse { text, model })
    }
}
