//! 설정 값(token/env)을 실제 런타임 값으로 해석하는 유틸리티.
//!
//! - 환경변수 조회는 인프라 계층에서만 수행한다.

use std::env;

use super::types::{GitLabConfig, JiraConfig, LlmConfig};

/// 자격 증명 해석 결과. `source`는 inspection 출력용 라벨이다.
#[derive(Debug, Clone)]
pub struct CredentialResolution {
    pub value: Option<String>,
    pub source: Option<String>,
}

/// GitLab 토큰은 `token` 우선, 없으면 `token_env`를 조회한다.
pub fn resolve_gitlab_token(cfg: &GitLabConfig) -> CredentialResolution {
    resolve_pair(cfg.token.as_deref(), cfg.token_env.as_deref())
}

/// LLM API key는 `api_key` 우선, 없으면 `api_key_env`를 조회한다.
pub fn resolve_llm_api_key(cfg: &LlmConfig) -> CredentialResolution {
    resolve_pair(cfg.api_key.as_deref(), cfg.api_key_env.as_deref())
}

/// Jira API 토큰은 `api_token` 우선, 없으면 `api_token_env`를 조회한다.
pub fn resolve_jira_token(cfg: &JiraConfig) -> CredentialResolution {
    resolve_pair(cfg.api_token.as_deref(), cfg.api_token_env.as_deref())
}

fn resolve_pair(inline: Option<&str>, env_name: Option<&str>) -> CredentialResolution {
    if let Some(value) = inline.map(str::trim).filter(|v| !v.is_empty()) {
        return CredentialResolution {
            value: Some(value.to_string()),
            source: Some("inline".to_string()),
        };
    }

    let Some(env_name) = env_name.map(str::trim).filter(|v| !v.is_empty()) else {
        return CredentialResolution {
            value: None,
            source: None,
        };
    };

    match env::var(env_name).ok().map(|v| v.trim().to_string()) {
        Some(value) if !value.is_empty() => CredentialResolution {
            value: Some(value),
            source: Some(format!("env:{env_name}")),
        },
        _ => CredentialResolution {
            value: None,
            source: Some(format!("env:{env_name} (missing)")),
        },
    }
}
