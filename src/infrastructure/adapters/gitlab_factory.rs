//! MR 게이트웨이 포트 구현 어댑터.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::{MergeRequestGateway, MergeRequestGatewayFactory};
use crate::domain::review::{MergeRequestDetails, ResolvedPosition};
use crate::domain::target::MergeRequestTarget;
use crate::infrastructure::config::GitLabConfig;
use crate::infrastructure::gitlab::GitLabClient;

/// GitLab 게이트웨이 팩토리 어댑터.
pub struct GitLabGatewayFactory;

impl MergeRequestGatewayFactory for GitLabGatewayFactory {
    fn build(
        &self,
        target: &MergeRequestTarget,
        gitlab_cfg: &GitLabConfig,
        token: Option<String>,
    ) -> Box<dyn MergeRequestGateway> {
        Box::new(GitLabGatewayAdapter {
            inner: GitLabClient::new(
                target.host.clone(),
                target.project_path.clone(),
                target.iid,
                token,
                gitlab_cfg.api_base.clone(),
            ),
        })
    }
}

/// 인프라 GitLab 클라이언트를 애플리케이션 포트로 감싸는 래퍼.
struct GitLabGatewayAdapter {
    inner: GitLabClient,
}

#[async_trait]
impl MergeRequestGateway for GitLabGatewayAdapter {
    async fn fetch_details(&self) -> Result<MergeRequestDetails> {
        self.inner.fetch_merge_request_details().await
    }

    async fn post_note(&self, body: &str) -> Result<String> {
        self.inner.create_note(body).await
    }

    async fn post_positioned_note(
        &self,
        body: &str,
        position: &ResolvedPosition,
    ) -> Result<String> {
        self.inner.create_positioned_note(body, position).await
    }
}
