//! 적용 설정 진단(inspection) 뷰 모델. 비밀값은 출처 라벨로만 노출한다.

use serde::Serialize;

use super::loader::LoadedConfig;
use super::resolve::{resolve_gitlab_token, resolve_jira_token, resolve_llm_api_key};

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub llm: LlmInspection,
    pub gitlab: GitLabInspection,
    pub jira: JiraInspection,
}

#[derive(Debug, Clone, Serialize)]
pub struct LlmInspection {
    pub provider: String,
    pub model: String,
    pub api_base: Option<String>,
    pub api_key_source: Option<String>,
    pub api_key_resolved: bool,
    pub max_tokens: u32,
    pub temperature: f32,
    pub max_context_tokens: usize,
    pub chunk_size_tokens: usize,
}

#[derive(Debug, Clone, Serialize)]
pub struct GitLabInspection {
    pub api_base: Option<String>,
    pub token_source: Option<String>,
    pub token_resolved: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct JiraInspection {
    pub configured: bool,
    pub url: Option<String>,
    pub token_source: Option<String>,
    pub token_resolved: bool,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig) -> Self {
        let config = &loaded.config;
        let llm_key = resolve_llm_api_key(&config.llm);
        let gitlab_token = resolve_gitlab_token(&config.gitlab);
        let jira_token = resolve_jira_token(&config.jira);

        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            llm: LlmInspection {
                provider: config
                    .llm
                    .provider()
                    .map(|p| p.code().to_string())
                    .unwrap_or_else(|_| "invalid".to_string()),
                model: config
                    .llm
                    .model()
                    .unwrap_or_else(|_| "invalid".to_string()),
                api_base: config.llm.api_base.clone(),
                api_key_source: llm_key.source,
                api_key_resolved: llm_key.value.is_some(),
                max_tokens: config.llm.max_tokens(),
                temperature: config.llm.temperature(),
                max_context_tokens: config.llm.max_context_tokens(),
                chunk_size_tokens: config.llm.chunk_size_tokens(),
            },
            gitlab: GitLabInspection {
                api_base: config.gitlab.api_base.clone(),
                token_source: gitlab_token.source,
                token_resolved: gitlab_token.value.is_some(),
            },
            jira: JiraInspection {
                configured: config.jira.is_configured(),
                url: config.jira.url.clone(),
                token_source: jira_token.source,
                token_resolved: jira_token.value.is_some(),
            },
        }
    }
}
