//! LLM provider 어댑터 공통 모듈.
//! provider별 API 호출을 하나의 인터페이스로 표준화한다.

pub mod anthropic;
pub mod openai;
mod api_runner;
mod error;

use anyhow::Result;
use async_trait::async_trait;

use crate::infrastructure::config::{Config, LlmProvider};

pub use error::LlmError;

#[async_trait]
pub trait LlmClient: Send + Sync {
    /// 사용자 표시 이름
    fn name(&self) -> &'static str;
    /// 적용 중인 모델 식별자
    fn model(&self) -> &str;
    /// 프롬프트 한 건 실행
    async fn complete(&self, prompt: &str) -> Result<String, LlmError>;
}

/// 설정된 provider의 클라이언트를 생성한다.
pub fn build_llm_client(config: &Config) -> Result<Box<dyn LlmClient>> {
    match config.llm.provider()? {
        LlmProvider::OpenAi => Ok(Box::new(openai::OpenAiClient::from_config(config)?)),
        LlmProvider::Anthropic => Ok(Box::new(anthropic::AnthropicClient::from_config(config)?)),
    }
}
