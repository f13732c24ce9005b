//! 설정 스키마와 병합 규칙.

use anyhow::{Result, bail};
use serde::{Deserialize, Serialize};

pub const DEFAULT_OPENAI_MODEL: &str = "o1-mini";
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-3-7-sonnet-latest";
pub const DEFAULT_MAX_TOKENS: u32 = 2_000;
pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_MAX_CONTEXT_TOKENS: usize = 6_000;
pub const DEFAULT_CHUNK_SIZE_TOKENS: usize = 4_000;

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 모델/토큰 예산 설정
    #[serde(default)]
    pub llm: LlmConfig,
    /// GitLab 인증/엔드포인트 설정
    #[serde(default)]
    pub gitlab: GitLabConfig,
    /// Jira 연동 설정(선택)
    #[serde(default)]
    pub jira: JiraConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct LlmConfig {
    /// provider 식별자(openai/anthropic)
    pub provider: Option<String>,
    /// 모델 식별자(미지정 시 provider별 기본값)
    pub model: Option<String>,
    /// API 베이스 URL(선택)
    pub api_base: Option<String>,
    /// API key 직접값
    pub api_key: Option<String>,
    /// API key를 읽을 환경변수 이름
    pub api_key_env: Option<String>,
    /// 응답 최대 토큰
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
    /// 프롬프트 컨텍스트 토큰 상한(초과 시 잘라낸다)
    pub max_context_tokens: Option<usize>,
    /// diff 분할 청크당 토큰 예산
    pub chunk_size_tokens: Option<usize>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct GitLabConfig {
    pub token: Option<String>,
    pub token_env: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct JiraConfig {
    /// Jira 베이스 URL. 비어 있으면 티켓 연동이 꺼진다.
    pub url: Option<String>,
    pub email: Option<String>,
    pub api_token: Option<String>,
    pub api_token_env: Option<String>,
}

/// 지원하는 LLM provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LlmProvider {
    OpenAi,
    Anthropic,
}

impl LlmProvider {
    /// 설정 문자열을 provider로 변환한다. 미지정은 openai 기본값.
    pub fn from_config(value: Option<&str>) -> Result<Self> {
        let Some(raw) = value else {
            return Ok(Self::OpenAi);
        };

        match raw.trim().to_ascii_lowercase().as_str() {
            "openai" => Ok(Self::OpenAi),
            "anthropic" => Ok(Self::Anthropic),
            other => bail!("unsupported LLM provider: {other} (expected openai or anthropic)"),
        }
    }

    /// inspection 출력용 코드값.
    pub fn code(self) -> &'static str {
        match self {
            Self::OpenAi => "openai",
            Self::Anthropic => "anthropic",
        }
    }

    pub fn default_model(self) -> &'static str {
        match self {
            Self::OpenAi => DEFAULT_OPENAI_MODEL,
            Self::Anthropic => DEFAULT_ANTHROPIC_MODEL,
        }
    }
}

impl LlmConfig {
    pub fn provider(&self) -> Result<LlmProvider> {
        LlmProvider::from_config(self.provider.as_deref())
    }

    /// 모델 이름을 해석한다(미지정 시 provider 기본 모델).
    pub fn model(&self) -> Result<String> {
        let provider = self.provider()?;
        Ok(self
            .model
            .clone()
            .unwrap_or_else(|| provider.default_model().to_string()))
    }

    pub fn max_tokens(&self) -> u32 {
        self.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS)
    }

    pub fn temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn max_context_tokens(&self) -> usize {
        self.max_context_tokens.unwrap_or(DEFAULT_MAX_CONTEXT_TOKENS)
    }

    pub fn chunk_size_tokens(&self) -> usize {
        self.chunk_size_tokens.unwrap_or(DEFAULT_CHUNK_SIZE_TOKENS)
    }

    pub(crate) fn merge_from(&mut self, other: LlmConfig) {
        if other.provider.is_some() {
            self.provider = other.provider;
        }
        if other.model.is_some() {
            self.model = other.model;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
        if other.api_key.is_some() {
            self.api_key = other.api_key;
        }
        if other.api_key_env.is_some() {
            self.api_key_env = other.api_key_env;
        }
        if other.max_tokens.is_some() {
            self.max_tokens = other.max_tokens;
        }
        if other.temperature.is_some() {
            self.temperature = other.temperature;
        }
        if other.max_context_tokens.is_some() {
            self.max_context_tokens = other.max_context_tokens;
        }
        if other.chunk_size_tokens.is_some() {
            self.chunk_size_tokens = other.chunk_size_tokens;
        }
    }
}

impl GitLabConfig {
    pub(crate) fn merge_from(&mut self, other: GitLabConfig) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.token_env.is_some() {
            self.token_env = other.token_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
    }
}

impl JiraConfig {
    /// 트래커 연동이 켜져 있는지(베이스 URL이 있는지) 여부.
    pub fn is_configured(&self) -> bool {
        self.url.as_deref().is_some_and(|u| !u.trim().is_empty())
    }

    pub(crate) fn merge_from(&mut self, other: JiraConfig) {
        if other.url.is_some() {
            self.url = other.url;
        }
        if other.email.is_some() {
            self.email = other.email;
        }
        if other.api_token.is_some() {
            self.api_token = other.api_token;
        }
        if other.api_token_env.is_some() {
            self.api_token_env = other.api_token_env;
        }
    }
}

impl Config {
    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.llm.merge_from(other.llm);
        self.gitlab.merge_from(other.gitlab);
        self.jira.merge_from(other.jira);
    }
}
