//! 티켓 게이트웨이 포트 구현 어댑터.

use anyhow::Result;
use async_trait::async_trait;

use crate::application::ports::{TicketGateway, TicketGatewayFactory};
use crate::domain::ticket::TicketContext;
use crate::infrastructure::config::{Config, resolve_jira_token};
use crate::infrastructure::jira::JiraClient;

/// Jira 게이트웨이 팩토리 어댑터.
/// 트래커 설정이 없으면 게이트웨이 없이(None) 진행한다.
pub struct JiraGatewayFactory;

impl TicketGatewayFactory for JiraGatewayFactory {
    fn build(&self, config: &Config) -> Option<Box<dyn TicketGateway>> {
        if !config.jira.is_configured() {
            return None;
        }

        let url = config.jira.url.clone()?;
        let email = config.jira.email.clone().unwrap_or_default();
        let token = resolve_jira_token(&config.jira).value?;

        Some(Box::new(JiraGatewayAdapter {
            inner: JiraClient::new(url, email, token),
        }))
    }
}

/// 인프라 Jira 클라이언트를 애플리케이션 포트로 감싸는 래퍼.
struct JiraGatewayAdapter {
    inner: JiraClient,
}

#[async_trait]
impl TicketGateway for JiraGatewayAdapter {
    async fn fetch_ticket(&self, ticket_id: &str) -> Result<TicketContext> {
        self.inner.fetch_issue(ticket_id).await
    }
}
