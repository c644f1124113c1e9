// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! OpenAI generation adapter.
//!
//! Implements [`GenerationAdapter`] over the Chat Completions API: one
//! system message, one user message, no streaming.

pub mod client;
pub mod types;

use async_trait::async_trait;
use tracing::{debug, info};

use ptokyo_config::PtokyoConfig;
use ptokyo_config::credentials::openai_api_key;
use ptokyo_core::{
    AdapterType, CompletionRequest, CompletionResponse, GenerationAdapter, HealthStatus,
    PluginAdapter, PtokyoError,
};

use crate::client::OpenAiClient;
use crate::types::{ChatMessage, ChatRequest, ResponseFormat};

/// OpenAI provider implementing [`GenerationAdapter`].
///
/// API key resolution: `openai.api_key` -> `OPENAI_API_KEY` -> hidden prompt.
pub struct OpenAiProvider {
    client: OpenAiClient,
}

impl OpenAiProvider {
    pub fn new(config: &PtokyoConfig) -> Result<Self, PtokyoError> {
        let api_key = openai_api_key(config)?;
        let client = OpenAiClient::new(
            &api_key,
            config.openai.model.clone(),
            &config.openai.base_url,
        )?;
        info!(model = %config.openai.model, "OpenAI provider initialized");
        Ok(Self { client })
    }

    /// Creates a provider with an existing client.
    pub fn with_client(client: OpenAiClient) -> Self {
        Self { client }
    }

    fn to_chat_request(&self, request: &CompletionRequest) -> ChatRequest {
        let mut messages = Vec::with_capacity(2);
        if let Some(system) = &request.system {
            messages.push(ChatMessage::system(system.clone()));
        }
        messages.push(ChatMessage::user(request.prompt.clone()));
        ChatRequest {
            model: self.client.default_model().to_string(),
            messages,
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            response_format: request.json_mode.then(ResponseFormat::json_object),
        }
    }
}

#[async_trait]
impl PluginAdapter for OpenAiProvider {
    fn name(&self) -> &str {
        "openai"
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
impl GenerationAdapter for OpenAiProvider {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PtokyoError> {
        let chat = self.to_chat_request(&request);
        let response = self.client.complete(&chat).await?;
        let text = response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or_else(|| PtokyoError::generation("OpenAI response had no message content"))?;
        debug!(model = %response.model, chars = text.chars().count(), "completion received");
        Ok(CompletionResponse {
            text,
            model: response.model,
        })
    }
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;

    fn provider(uri: &str) -> OpenAiProvider {
        OpenAiProvider::with_client(
            OpenAiClient::new(&SecretString::from("sk-test"), "gpt-4o".into(), uri).unwrap(),
        )
    }

    #[test]
    fn request_maps_system_and_json_mode() {
        let p = provider("http://localhost");
        let chat = p.to_chat_request(&CompletionRequest {
            system: Some("be brief".into()),
            prompt: "organize".into(),
            temperature: Some(0.2),
            max_tokens: None,
            json_mode: true,
        });
        assert_eq!(chat.messages.len(), 2);
        assert_eq!(chat.messages[0].role, "system");
        assert_eq!(chat.response_format, Some(ResponseFormat::json_object()));

        let plain = p.to_chat_request(&CompletionRequest {
            prompt: "hi".into(),
            ..Default::default()
        });
        assert_eq!(plain.messages.len(), 1);
        let body = serde_json::to_value(&plain).unwrap();
        assert!(body.get("response_format").is_none());
        assert!(body.get("temperature").is_none());
    }

    #[tokio::test]
    async fn complete_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(body_partial_json(json!({
                "model": "gpt-4o",
                "temperature": 0.5,
                "max_tokens": 100,
                "messages": [{ "role": "user", "content": "tell me" }]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "gpt-4o",
                "choices": [{ "message": { "role": "assistant", "content": "A crow counts trains." } }]
            })))
            .mount(&server)
            .await;

        let response = provider(&server.uri())
            .complete(CompletionRequest {
                prompt: "tell me".into(),
                temperature: Some(0.5),
                max_tokens: Some(100),
                ..Default::default()
            })
            .await
            .unwrap();
        assert_eq!(response.text, "A crow counts trains.");
    }

    #[tokio::test]
    async fn empty_choices_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "model": "gpt-4o", "choices": [] })),
            )
            .mount(&server)
            .await;

        let err = provider(&server.uri())
            .complete(CompletionRequest::default())
            .await
            .unwrap_err();
        assert!(matches!(err, PtokyoError::Generation { .. }));
    }
}
