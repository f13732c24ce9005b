//! LLM 호출 오류 분류.
//!
//! 오케스트레이터가 재시도 여부를 오류 종류로 판단하므로, 이 경계만큼은
//! anyhow 대신 타입화된 에러를 쓴다.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LlmError {
    #[error("{provider}: rate limited: {detail}")]
    RateLimited { provider: &'static str, detail: String },

    #[error("{provider}: request timed out")]
    Timeout { provider: &'static str },

    #[error("{provider}: transport error: {detail}")]
    Transport { provider: &'static str, detail: String },

    #[error("{provider}: server error ({status}): {detail}")]
    Server {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{provider}: authentication failed ({status}): {detail}")]
    Auth {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{provider}: invalid request ({status}): {detail}")]
    InvalidRequest {
        provider: &'static str,
        status: u16,
        detail: String,
    },

    #[error("{provider}: unexpected response: {detail}")]
    Protocol { provider: &'static str, detail: String },
}

impl LlmError {
    /// 백오프 재시도 대상인지 여부. 인증/요청 형식 오류는 재시도하지 않는다.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RateLimited { .. }
                | Self::Timeout { .. }
                | Self::Transport { .. }
                | Self::Server { .. }
        )
    }
}
