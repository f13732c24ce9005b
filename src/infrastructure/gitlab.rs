//! GitLab API 연동 구현.

use anyhow::{Context, Result};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::debug;

use crate::domain::review::{
    DiffRefs, FileChange, MergeRequestDetails, PositionSide, ResolvedPosition,
};

pub struct GitLabClient {
    client: Client,
    host: String,
    project_path: String,
    iid: u64,
    token: Option<String>,
    api_base: Option<String>,
}

impl GitLabClient {
    /// GitLab 대상 클라이언트를 생성한다.
    pub fn new(
        host: String,
        project_path: String,
        iid: u64,
        token: Option<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            host,
            project_path,
            iid,
            token,
            api_base,
        }
    }

    fn api_base(&self) -> String {
        // gitlab.com은 공개 API, 그 외는 self-hosted 기본 경로를 사용한다.
        if let Some(base) = &self.api_base {
            return base.trim_end_matches('/').to_string();
        }
        if self.host == "gitlab.com" {
            "https://gitlab.com/api/v4".to_string()
        } else {
            format!("https://{}/api/v4", self.host)
        }
    }

    fn encoded_project_path(&self) -> String {
        // /projects/{path} API 규격에 맞춰 경로를 URL 인코딩한다.
        utf8_percent_encode(&self.project_path, NON_ALPHANUMERIC).to_string()
    }

    fn merge_request_endpoint(&self) -> String {
        format!(
            "{}/projects/{}/merge_requests/{}",
            self.api_base(),
            self.encoded_project_path(),
            self.iid
        )
    }

    fn merge_request_changes_endpoint(&self) -> String {
        format!("{}/changes", self.merge_request_endpoint())
    }

    fn notes_endpoint(&self) -> String {
        format!("{}/notes", self.merge_request_endpoint())
    }

    fn discussions_endpoint(&self) -> String {
        format!("{}/discussions", self.merge_request_endpoint())
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        // GitLab 토큰 헤더(`PRIVATE-TOKEN`)를 공통 적용한다.
        let req = self.client.request(method, url);
        if let Some(token) = &self.token {
            req.header("PRIVATE-TOKEN", token)
        } else {
            req
        }
    }

    /// MR 메타데이터와 변경 목록을 조회한다.
    pub async fn fetch_merge_request_details(&self) -> Result<MergeRequestDetails> {
        let resp = self
            .request(Method::GET, self.merge_request_changes_endpoint())
            .send()
            .await
            .context("gitlab: failed to fetch MR changes")?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .context("gitlab: failed to read MR changes body")?;

        if !status.is_success() {
            anyhow::bail!("gitlab: failed to fetch MR changes ({status}): {body}");
        }

        let parsed: MergeRequestChangesResponse =
            serde_json::from_str(&body).context("gitlab: invalid MR changes JSON")?;

        debug!(
            iid = self.iid,
            num_changes = parsed.changes.len(),
            has_diff_refs = parsed.diff_refs.is_some(),
            "fetched merge request changes"
        );

        Ok(MergeRequestDetails {
            title: parsed.title,
            description: parsed.description.unwrap_or_default(),
            source_branch: parsed.source_branch,
            target_branch: parsed.target_branch,
            changes: parsed.changes.into_iter().map(ChangeEntry::into_domain).collect(),
            diff_refs: parsed.diff_refs.and_then(DiffRefsResponse::into_domain),
        })
    }

    /// 일반 노트를 생성한다.
    pub async fn create_note(&self, body: &str) -> Result<String> {
        let resp = self
            .request(Method::POST, self.notes_endpoint())
            .json(&json!({ "body": body }))
            .send()
            .await
            .context("gitlab: failed to create note")?;

        let status = resp.status();
        let response_body = resp
            .text()
            .await
            .context("gitlab: failed to read create-note body")?;

        if !status.is_success() {
            anyhow::bail!("gitlab: failed to create note ({status}): {response_body}");
        }

        let note: NoteResponse =
            serde_json::from_str(&response_body).context("gitlab: invalid create-note JSON")?;

        Ok(note.id.to_string())
    }

    /// diff 포지션이 달린 노트(디스커션)를 생성한다.
    pub async fn create_positioned_note(
        &self,
        body: &str,
        position: &ResolvedPosition,
    ) -> Result<String> {
        let resp = self
            .request(Method::POST, self.discussions_endpoint())
            .json(&json!({
                "body": body,
                "position": position_payload(position),
            }))
            .send()
            .await
            .context("gitlab: failed to create positioned note")?;

        let status = resp.status();
        let response_body = resp
            .text()
            .await
            .context("gitlab: failed to read create-discussion body")?;

        if !status.is_success() {
            anyhow::bail!("gitlab: failed to create positioned note ({status}): {response_body}");
        }

        let discussion: DiscussionResponse = serde_json::from_str(&response_body)
            .context("gitlab: invalid create-discussion JSON")?;

        Ok(discussion.id)
    }
}

/// GitLab discussions API의 position 파라미터를 구성한다.
/// 삭제 파일 코멘트는 old 면으로, 그 외는 new 면으로 주소를 지정한다.
fn position_payload(position: &ResolvedPosition) -> Value {
    match position.side {
        PositionSide::New => json!({
            "base_sha": position.base_sha,
            "head_sha": position.head_sha,
            "start_sha": position.start_sha,
            "position_type": "text",
            "new_path": position.path,
            "new_line": position.line_in_hunk,
        }),
        PositionSide::Old => json!({
            "base_sha": position.base_sha,
            "head_sha": position.head_sha,
            "start_sha": position.start_sha,
            "position_type": "text",
            "old_path": position.path,
            "old_line": position.line_in_hunk,
        }),
    }
}

#[derive(Debug, Deserialize)]
struct MergeRequestChangesResponse {
    title: String,
    description: Option<String>,
    source_branch: String,
    target_branch: String,
    changes: Vec<ChangeEntry>,
    diff_refs: Option<DiffRefsResponse>,
}

#[derive(Debug, Deserialize)]
struct ChangeEntry {
    old_path: String,
    new_path: String,
    diff: String,
    #[serde(default)]
    new_file: bool,
    #[serde(default)]
    renamed_file: bool,
    #[serde(default)]
    deleted_file: bool,
}

impl ChangeEntry {
    fn into_domain(self) -> FileChange {
        FileChange {
            old_path: self.old_path,
            new_path: self.new_path,
            diff: self.diff,
            new_file: self.new_file,
            renamed_file: self.renamed_file,
            deleted_file: self.deleted_file,
        }
    }
}

#[derive(Debug, Deserialize)]
struct DiffRefsResponse {
    base_sha: Option<String>,
    head_sha: Option<String>,
    start_sha: Option<String>,
}

impl DiffRefsResponse {
    /// 세 SHA가 모두 있어야 포지션 코멘트를 만들 수 있다.
    fn into_domain(self) -> Option<DiffRefs> {
        Some(DiffRefs {
            base_sha: self.base_sha?,
            head_sha: self.head_sha?,
            start_sha: self.start_sha?,
        })
    }
}

#[derive(Debug, Deserialize)]
struct NoteResponse {
    id: u64,
}

#[derive(Debug, Deserialize)]
struct DiscussionResponse {
    id: String,
}
