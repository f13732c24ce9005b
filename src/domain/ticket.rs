//! 티켓 컨텍스트 추출 규칙(티켓 ID / 수용 기준).

use std::sync::LazyLock;

use regex::Regex;
use tracing::debug;

/// 리뷰 프롬프트에 들어가는 티켓/MR 컨텍스트.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TicketContext {
    /// 티켓을 못 찾았거나 조회에 실패하면 `None` — MR 폴백 컨텍스트.
    pub id: Option<String>,
    pub summary: String,
    pub description: String,
    pub issue_type: String,
}

impl TicketContext {
    /// 티켓 없이 MR 제목/설명으로 구성한 기본 컨텍스트.
    pub fn from_merge_request(title: &str, description: &str) -> Self {
        Self {
            id: None,
            summary: title.to_string(),
            description: description.to_string(),
            issue_type: "Merge Request".to_string(),
        }
    }
}

// PROJ-123 / feature/PROJ-123 / bugfix/PROJ-123 형태를 모두 잡는다.
static TICKET_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[A-Z]+-\d+").expect("ticket id pattern is valid"));

/// MR 제목에서 먼저, 없으면 브랜치 이름에서 티켓 ID를 찾는다.
pub fn extract_ticket_id(mr_title: &str, branch_name: &str) -> Option<String> {
    if let Some(found) = TICKET_ID_PATTERN.find(mr_title) {
        debug!(ticket_id = found.as_str(), source = "title", "found ticket id");
        return Some(found.as_str().to_string());
    }
    if let Some(found) = TICKET_ID_PATTERN.find(branch_name) {
        debug!(ticket_id = found.as_str(), source = "branch", "found ticket id");
        return Some(found.as_str().to_string());
    }
    None
}

/// 티켓 설명에서 `AC:` / `Acceptance Criteria:`로 시작하는 라인을 수집한다.
pub fn extract_acceptance_criteria(description: &str) -> Vec<String> {
    let mut criteria = Vec::new();
    for line in description.lines() {
        let line = line.trim();
        let lowered = line.to_lowercase();
        if lowered.starts_with("ac:") || lowered.starts_with("acceptance criteria:") {
            criteria.push(line.to_string());
        }
    }
    criteria
}
