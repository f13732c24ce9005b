//! Jira API 연동 구현.

use anyhow::{Context, Result};
use reqwest::Client;
use serde_json::Value;
use tracing::debug;

use crate::domain::ticket::TicketContext;

pub struct JiraClient {
    client: Client,
    base_url: String,
    email: String,
    api_token: String,
}

impl JiraClient {
    pub fn new(base_url: String, email: String, api_token: String) -> Self {
        Self {
            client: Client::new(),
            base_url,
            email,
            api_token,
        }
    }

    fn issue_endpoint(&self, ticket_id: &str) -> String {
        format!(
            "{}/rest/api/2/issue/{}",
            self.base_url.trim_end_matches('/'),
            ticket_id
        )
    }

    /// 티켓 상세를 조회해 리뷰 컨텍스트로 변환한다.
    pub async fn fetch_issue(&self, ticket_id: &str) -> Result<TicketContext> {
        let resp = self
            .client
            .get(self.issue_endpoint(ticket_id))
            .basic_auth(&self.email, Some(&self.api_token))
            .send()
            .await
            .context("jira: failed to fetch issue")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("jira: failed to read issue body")?;

        if !status.is_success() {
            anyhow::bail!("jira: failed to fetch issue {ticket_id} ({status}): {body}");
        }

        let value: Value = serde_json::from_str(&body).context("jira: invalid issue JSON")?;
        let ticket = TicketContext {
            id: Some(ticket_id.to_string()),
            summary: value
                .pointer("/fields/summary")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            description: value
                .pointer("/fields/description")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            issue_type: value
                .pointer("/fields/issuetype/name")
                .and_then(Value::as_str)
                .unwrap_or("Unknown")
                .to_string(),
        };

        debug!(ticket_id, issue_type = %ticket.issue_type, "fetched jira issue");
        Ok(ticket)
    }
}
