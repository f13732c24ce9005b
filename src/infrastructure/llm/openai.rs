//! OpenAI provider 어댑터.

use anyhow::{Result, bail};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::domain::chunk::CHARS_PER_TOKEN;
use crate::infrastructure::config::{Config, resolve_llm_api_key};

use super::LlmClient;
use super::api_runner::{build_api_client, send_json};
use super::error::LlmError;

const PROVIDER: &str = "OpenAI";
const SYSTEM_PROMPT: &str = "You are an expert code reviewer.";

pub struct OpenAiClient {
    client: Client,
    base_url: String,
    model: String,
    credential: String,
    max_tokens: u32,
    temperature: f32,
    max_context_tokens: usize,
}

impl OpenAiClient {
    pub fn from_config(config: &Config) -> Result<Self> {
        let Some(credential) = resolve_llm_api_key(&config.llm).value else {
            bail!("missing OpenAI API key. Configure llm.api_key or llm.api_key_env");
        };

        Ok(Self {
            client: build_api_client(),
            base_url: config
                .llm
                .api_base
                .clone()
                .unwrap_or_else(|| "https://api.openai.com/v1".to_string()),
            model: config.llm.model()?,
            credential,
            max_tokens: config.llm.max_tokens(),
            temperature: config.llm.temperature(),
            max_context_tokens: config.llm.max_context_tokens(),
        })
    }

    /// 추정 토큰이 컨텍스트 상한을 넘으면 프롬프트를 자르고 표식을 남긴다.
    fn truncate_prompt<'a>(&self, prompt: &'a str) -> std::borrow::Cow<'a, str> {
        let estimated_tokens = prompt.len() / CHARS_PER_TOKEN;
        if estimated_tokens <= self.max_context_tokens {
            return prompt.into();
        }

        warn!(
            estimated_tokens,
            max_context_tokens = self.max_context_tokens,
            "prompt exceeds max context tokens; truncating"
        );
        let mut cutoff = self.max_context_tokens * CHARS_PER_TOKEN;
        while cutoff > 0 && !prompt.is_char_boundary(cutoff) {
            cutoff -= 1;
        }
        format!("{}\n\n[Content truncated due to length]", &prompt[..cutoff]).into()
    }

    /// 모델별 요청 페이로드를 구성한다.
    /// o1-mini는 system 롤이 없고 `max_completion_tokens`/고정 temperature를 쓴다.
    fn build_payload(&self, prompt: &str) -> Value {
        if self.model == "o1-mini" {
            json!({
                "model": self.model,
                "messages": [
                    { "role": "user", "content": format!("{SYSTEM_PROMPT} {prompt}") }
                ],
                "temperature": 1.0,
                "max_completion_tokens": self.max_tokens,
            })
        } else {
            json!({
                "model": self.model,
                "messages": [
                    { "role": "system", "content": SYSTEM_PROMPT },
                    { "role": "user", "content": prompt }
                ],
                "temperature": self.temperature,
                "max_tokens": self.max_tokens,
            })
        }
    }
}

#[async_trait]
impl LlmClient for OpenAiClient {
    fn name(&self) -> &'static str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn complete(&self, prompt: &str) -> Result<String, LlmError> {
        let prompt = self.truncate_prompt(prompt);
        debug!(
            model = %self.model,
            prompt_length = prompt.len(),
            estimated_tokens = prompt.len() / CHARS_PER_TOKEN,
            "requesting review from OpenAI"
        );

        let endpoint = format!("{}/chat/completions", self.base_url.trim_end_matches('/'));
        let request = self
            .client
            .post(endpoint)
            .bearer_auth(&self.credential)
            .json(&self.build_payload(&prompt));

        let response = send_json(PROVIDER, request).await?;
        let content = response
            .pointer("/choices/0/message/content")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .trim()
            .to_string();

        if content.is_empty() {
            return Err(LlmError::Protocol {
                provider: PROVIDER,
                detail: "response is missing message content".to_string(),
            });
        }
        Ok(content)
    }
}
