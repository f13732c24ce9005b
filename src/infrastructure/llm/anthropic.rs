//! Anthropic/Claude provider 어댑터.

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::debug;

use crate::infrastructure::config::{Config, resolve_llm_api_key};

use super::LlmClient;
use super::api_runner::{build_api_client, collect_text, send_json};
use super::error::LlmError;

const PROVIDER: &str = "Claude";
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicClient {
    client: Client,
    base_url: String,
    model: String,
    credential: String,
    max_tokens: u32,
    temperature: f32,
}

impl AnthropicClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(credential) = resolve_llm_api_key(&config.llm).value else {
            bail!("missing Anthropic API key. Configure llm.api_key or llm.api_key_env");
        };

        Ok(Self {
            client: build_api_client(),
            base_url: config
                .llm
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.anthropic.com/v1".to_string()),
            model: config.llm.model()?,
            credential,
            max_tokens: config.llm.max_tokens(),
            temperature: config.llm.temperature(),
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        debug!(model = %self.model, prompt_length = prompt.len(), "requesting review from Anthropic");

        let endpoint = format!("{}/messages", self.base_url.trim_end_matches('/'));
        let payload = json!({
            "model": self.model,
            "max_tokens": self.max_tokens,
            "temperature": self.temperature,
            "messages": [
                { "role": "user", "content": prompt }
            ]
        });

        // API key(sk-ant-...)와 OAuth/Bearer 토큰을 모두 수용한다.
        let request = if self.credential.starts_with("sk-ant-") {
            self.client
                .post(endpoint)
                .header("x-api-key", &self.credential)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&payload)
        } else {
            self.client
                .post(endpoint)
                .bearer_auth(&self.credential)
                .header("anthropic-version", ANTHROPIC_VERSION)
                .json(&payload)
        };

        let response = send_json(PROVIDER, request).await?;
        let content = response
            .get("content")
            .map(collect_text)
            .unwrap_or_default()
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(LlmError::Protocol {
                provider: PROVIDER,
                detail: "empty response content".to_string(),
            });
        }
        Ok(content)
    }
}
