//! LLM 게이트웨이 포트 구현 어댑터.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::{LlmGateway, LlmGatewayFactory};
use crate::infrastructure::config::Config;
use crate::infrastructure::llm::{self, LlmClient, LlmError};

/// LLM 팩토리 어댑터.
pub struct LlmFactoryAdapter;

impl LlmGatewayFactory for LlmFactoryAdapter {
    fn build(&self, config: &Config) -> Result<Box<dyn LlmGateway>> {
        let inner = llm::build_llm_client(config)?;
        Ok(Box::new(LlmGatewayAdapter { inner }))
    }
}

/// 인프라 LLM 클라이언트를 애플리케이션 포트로 감싸는 래퍼.
struct LlmGatewayAdapter {
    inner: Box<dyn LlmClient>,
}

#[async_trait]
impl LlmGateway for LlmGatewayAdapter {
    fn model(&self) -> &str {
        self.inner.model()
    }

    async fn review(&self, prompt: &str) -> Result<String, LlmError> {
        self.inner.complete(prompt).await
    }
}
