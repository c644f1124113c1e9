// SPDX-FileCopyrightText: 2026 Parallel Tokyo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Generation adapter trait for hosted text-completion APIs (OpenAI, Gemini).

use async_trait::async_trait;

use crate::error::PtokyoError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{CompletionRequest, CompletionResponse};

/// Adapter for one-shot request/response text completion.
#[async_trait]
pub trait GenerationAdapter: PluginAdapter {
    /// Sends a completion request and returns the full response.
    async fn complete(
        &self,
        request: CompletionRequest,
    ) -> Result<CompletionResponse, PtokyoError>;
}
