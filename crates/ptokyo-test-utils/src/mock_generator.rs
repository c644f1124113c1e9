// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock text generator for deterministic testing.
//!
//! Responses are popped from a FIFO queue. When the queue is empty a default
//! "mock response" text is returned, unless the generator was built with
//! [`MockGenerator::failing`].

use std::collections::VecDeque;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use ptokyo_core::types::{AdapterType, CompletionRequest, CompletionResponse, HealthStatus};
use ptokyo_core::{GenerationAdapter, PluginAdapter, PtokyoError};

/// A scripted [`GenerationAdapter`].
#[derive(Clone, Default)]
pub struct MockGenerator {
    responses: Arc<Mutex<VecDeque<Result<String, String>>>>,
    requests: Arc<Mutex<Vec<CompletionRequest>>>,
    always_fail: bool,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load successful responses.
    pub fn with_responses(responses: Vec<String>) -> Self {
        Self {
            responses: Arc::new(Mutex::new(responses.into_iter().map(Ok).collect())),
            ..Self::default()
        }
    }

    /// Every call fails as if the transport were down.
    pub fn failing() -> Self {
        Self {
            always_fail: true,
            ..Self::default()
        }
    }

    pub async fn add_response(&self, text: impl Into<String>) {
        self.responses.lock().await.push_back(Ok(text.into()));
    }

    /// Queue a single failure with `message`.
    pub async fn add_failure(&self, message: impl Into<String>) {
        self.responses.lock().await.push_back(Err(message.into()));
    }

    /// Requests received so far.
    pub async fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().await.clone()
    }
}

#[async_trait]
impl PluginAdapter for MockGenerator {
    fn name(&self) -> &str {
        "mock-generator"
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
impl GenerationAdapter for MockGenerator {
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PtokyoError> {
        self.requests.lock().await.push(request);

        if self.always_fail {
            return Err(PtokyoError::generation("forced transport failure"));
        }

        let next = self
            .responses
            .lock()
            .await
            .pop_front()
            .unwrap_or_else(|| Ok("mock response".to_string()));
        next.map(|text| CompletionResponse {
            text,
            model: "mock-model".to_string(),
        })
        .map_err(PtokyoError::generation)
    }
}
