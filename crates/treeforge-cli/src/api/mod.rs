//! HTTP generation adapter
//!
//! Thin client for any OpenAI-compatible chat-completions endpoint. The
//! pipeline only sees the `Generator` capability; everything
//! vendor-specific stays here.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use treeforge_core::{ChatMessage, ForgeConfig, ForgeError, Generator, Result};

pub struct HttpGenerator {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl HttpGenerator {
    pub fn from_config(config: &ForgeConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: config.endpoint.clone(),
            model: config.model.clone(),
            api_key: std::env::var(&config.api_key_env).ok(),
        }
    }
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Deserialize)]
struct ChoiceMessage {
    content: String,
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, messages: &[ChatMessage]) -> Result<String> {
        let mut request = self.client.post(&self.endpoint).json(&CompletionRequest {
            model: &self.model,
            messages,
        });
        if let Some(ref key) = self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ForgeError::Generation(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ForgeError::Generation(format!(
                "generation endpoint returned {}",
                status
            )));
        }

        let body: CompletionResponse = response
            .json()
            .await
            .map_err(|e| ForgeError::Generation(e.to_string()))?;

        body.choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| ForgeError::Generation("response contained no choices".to_string()))
    }
}
