//! Provider HTTP API 호출 공용 유틸리티.

use std::time::Duration;

use reqwest::{Client, RequestBuilder};
use serde_json::Value;

use super::error::LlmError;

/// Provider API 호출용 기본 HTTP 클라이언트를 생성한다.
pub fn build_api_client() -> Client {
    // TLS 설정 실패 등 예외 상황에서는 기본 클라이언트로 폴백한다.
    Client::builder()
        .timeout(Duration::from_secs(120))
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// JSON 응답을 기대하는 요청을 전송하고 실패를 분류한다.
pub async fn send_json(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<Value, LlmError> {
    let response = request.send().await.map_err(|err| {
        if err.is_timeout() {
            LlmError::Timeout { provider }
        } else {
            LlmError::Transport {
                provider,
                detail: err.to_string(),
            }
        }
    })?;

    let status = response.status();
    let body = response.text().await.map_err(|err| LlmError::Transport {
        provider,
        detail: err.to_string(),
    })?;

    if !status.is_success() {
        return Err(classify_status(provider, status.as_u16(), body));
    }

    serde_json::from_str(&body).map_err(|err| LlmError::Protocol {
        provider,
        detail: format!("invalid JSON response: {err}"),
    })
}

fn classify_status(provider: &'static str, status: u16, detail: String) -> LlmError {
    match status {
        429 => LlmError::RateLimited { provider, detail },
        408 => LlmError::Timeout { provider },
        401 | 403 => LlmError::Auth {
            provider,
            status,
            detail,
        },
        500..=599 => LlmError::Server {
            provider,
            status,
            detail,
        },
        _ => LlmError::InvalidRequest {
            provider,
            status,
            detail,
        },
    }
}

/// API 응답 구조에서 텍스트를 재귀적으로 추출한다.
pub fn collect_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.to_string(),
        Value::Array(items) => items
            .iter()
            .map(collect_text)
            .filter(|text| !text.is_empty())
            .collect::<Vec<_>>()
            .join(""),
        Value::Object(map) => {
            if let Some(text) = map.get("text").and_then(Value::as_str) {
                return text.to_string();
            }
            if let Some(message) = map.get("message") {
                let text = collect_text(message);
                if !text.is_empty() {
                    return text;
                }
            }
            if let Some(content) = map.get("content") {
                let text = collect_text(content);
                if !text.is_empty() {
                    return text;
                }
            }
            String::new()
        }
        _ => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn status_classification_matches_retry_policy() {
        assert!(classify_status("p", 429, String::new()).is_transient());
        assert!(classify_status("p", 503, String::new()).is_transient());
        assert!(!classify_status("p", 401, String::new()).is_transient());
        assert!(!classify_status("p", 400, String::new()).is_transient());
    }

    #[test]
    fn collect_text_walks_anthropic_content_shape() {
        let value = json!([{ "type": "text", "text": "hello " }, { "type": "text", "text": "world" }]);
        assert_eq!(collect_text(&value), "hello world");
    }
}
