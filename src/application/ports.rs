//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::review::{MergeRequestDetails, ResolvedPosition};
use crate::domain::target::MergeRequestTarget;
use crate::domain::ticket::TicketContext;
use crate::infrastructure::config::{Config, GitLabConfig};
use crate::infrastructure::llm::LlmError;

/// 설정 로딩/점검을 담당하는 저장소 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// URL 입력값을 도메인 대상 식별자로 변환하는 포트.
pub trait TargetResolver: Send + Sync {
    fn parse(&self, input: &str) -> Result<MergeRequestTarget>;
}

/// GitLab MR 연동 추상화 포트.
#[async_trait]
pub trait MergeRequestGateway: Send + Sync {
    /// MR 메타데이터 + 변경 목록 + diff_refs 조회
    async fn fetch_details(&self) -> Result<MergeRequestDetails>;
    /// 일반 코멘트(노트) 생성, 생성된 노트 ID 반환
    async fn post_note(&self, body: &str) -> Result<String>;
    /// 포지션 코멘트 생성, 생성된 디스커션 ID 반환
    async fn post_positioned_note(
        &self,
        body: &str,
        position: &ResolvedPosition,
    ) -> Result<String>;
}

/// 대상/설정에 맞는 MR 게이트웨이를 생성하는 팩토리 포트.
pub trait MergeRequestGatewayFactory: Send + Sync {
    fn build(
        &self,
        target: &MergeRequestTarget,
        gitlab_cfg: &GitLabConfig,
        token: Option<String>,
    ) -> Box<dyn MergeRequestGateway>;
}

/// 이슈 트래커(티켓) 조회 포트.
#[async_trait]
pub trait TicketGateway: Send + Sync {
    async fn fetch_ticket(&self, ticket_id: &str) -> Result<TicketContext>;
}

/// 트래커 설정이 있을 때만 게이트웨이를 내주는 팩토리 포트.
pub trait TicketGatewayFactory: Send + Sync {
    fn build(&self, config: &Config) -> Option<Box<dyn TicketGateway>>;
}

/// LLM 호출 포트.
/// 오류는 일시적(재시도 대상)/종결 구분이 필요해 타입화된 에러를 쓴다.
#[async_trait]
pub trait LlmGateway: Send + Sync {
    fn model(&self) -> &str;
    async fn review(&self, prompt: &str) -> Result<String, LlmError>;
}

/// 설정에서 활성 LLM 게이트웨이를 구성하는 팩토리 포트.
pub trait LlmGatewayFactory: Send + Sync {
    fn build(&self, config: &Config) -> Result<Box<dyn LlmGateway>>;
}

/// 콘솔/로그 출력 추상화 포트.
pub trait Reporter: Send + Sync {
    fn section(&self, name: &str);
    fn kv(&self, key: &str, value: &str);
    fn status(&self, scope: &str, message: &str);
    fn chunk_status(&self, chunk_number: usize, total_chunks: usize, status: &str, extra: Option<&str>);
    fn raw(&self, line: &str);
}
