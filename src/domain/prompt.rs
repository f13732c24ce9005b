//! 청크 리뷰 프롬프트 조립 모듈. 입력이 같으면 출력도 같다.

use crate::domain::ticket::TicketContext;

/// 청크 하나에 대한 리뷰 지시 프롬프트를 만든다.
///
/// 컨텍스트 블록(티켓 또는 MR 폴백), 선택적 수용 기준, 분할 안내("part K of N"),
/// 변경 내용, 고정 섹션 템플릿과 기계 파싱용 인라인 코멘트 포맷 순서로 쌓는다.
pub fn build_review_prompt(
    chunk: &str,
    ticket: &TicketContext,
    acceptance_criteria: &[String],
    chunk_number: usize,
    total_chunks: usize,
) -> String {
    let mut context_sections: Vec<String> = Vec::new();

    match &ticket.id {
        Some(id) => {
            context_sections.push(format!("Jira Ticket: {id}"));
            context_sections.push(format!("Summary: {}", ticket.summary));
            context_sections.push(format!("Type: {}", ticket.issue_type));
        }
        None => {
            context_sections.push(format!("Merge Request Title: {}", or_na(&ticket.summary)));
            context_sections.push(format!("Description: {}", or_na(&ticket.description)));
        }
    }

    if !acceptance_criteria.is_empty() {
        context_sections.push("\nAcceptance Criteria:".to_string());
        for criterion in acceptance_criteria {
            context_sections.push(format!("- {criterion}"));
        }
    }

    if total_chunks > 1 {
        context_sections.push(format!(
            "\nNote: This is part {chunk_number} of {total_chunks} of the complete review."
        ));
    }

    let mut out = String::new();
    out.push_str(
        "You are an expert code reviewer. Please review the following code changes and provide feedback.\n\n",
    );
    out.push_str(&context_sections.join("\n"));
    out.push_str("\n\nCode Changes:\n");
    out.push_str(chunk);
    out.push_str("\n\nPlease provide a code review that:\n");
    out.push_str("1. Analyzes the code changes for quality and best practices\n");
    out.push_str("2. Identifies potential bugs or issues\n");
    out.push_str("3. Suggests improvements for code quality\n");
    out.push_str("4. Notes any security concerns\n");
    out.push_str("5. Provides specific, actionable feedback\n");
    out.push_str("6. Includes inline comments for specific lines that need attention");
    if !acceptance_criteria.is_empty() {
        out.push_str("\n7. Verifies implementation against acceptance criteria");
    }

    out.push_str("\n\nFormat your review as follows:\n");
    out.push_str("## Summary\n");
    out.push_str("[Brief summary of the changes and overall assessment]\n\n");
    out.push_str("## Code Quality\n");
    out.push_str("[Feedback on code structure, readability, and best practices]\n\n");
    out.push_str("## Potential Issues\n");
    out.push_str("[List any bugs, edge cases, or concerns]\n\n");
    out.push_str("## Security\n");
    out.push_str("[Any security-related observations]\n\n");
    out.push_str("## Suggestions\n");
    out.push_str("[Specific recommendations for improvement]\n\n");
    out.push_str("## Inline Comments\n");
    out.push_str("For each file that needs attention, provide inline comments in this format:\n");
    out.push_str("```\n");
    out.push_str("File: path/to/file\n");
    out.push_str("Line X: [Comment about this specific line]\n");
    out.push_str("Line Y-Z: [Comment about this block of code]\n");
    out.push_str("```\n");
    out.push_str("Focus on:\n");
    out.push_str("- Lines with potential bugs or issues\n");
    out.push_str("- Code that could be improved\n");
    out.push_str("- Security concerns\n");
    out.push_str("- Best practices violations\n");
    out.push_str("- Complex or unclear code that needs explanation");

    if !acceptance_criteria.is_empty() {
        out.push_str("\n\n## Acceptance Criteria Check\n");
        out.push_str("[Verification of each acceptance criterion]");
    }

    out
}

fn or_na(value: &str) -> &str {
    if value.trim().is_empty() { "N/A" } else { value }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mr_ticket() -> TicketContext {
        TicketContext::from_merge_request("Add retry logic", "Retries transient failures")
    }

    #[test]
    fn single_chunk_prompt_has_no_part_note() {
        let prompt = build_review_prompt("+code", &mr_ticket(), &[], 1, 1);
        assert!(!prompt.contains("of the complete review"));
        assert!(prompt.contains("Merge Request Title: Add retry logic"));
        assert!(prompt.contains("Code Changes:\n+code"));
    }

    #[test]
    fn multi_chunk_prompt_declares_part_number() {
        let prompt = build_review_prompt("+code", &mr_ticket(), &[], 2, 3);
        assert!(prompt.contains("This is part 2 of 3 of the complete review."));
    }

    #[test]
    fn ticket_context_wins_over_mr_fallback() {
        let ticket = TicketContext {
            id: Some("PROJ-42".to_string()),
            summary: "Fix the thing".to_string(),
            description: String::new(),
            issue_type: "Bug".to_string(),
        };
        let prompt = build_review_prompt("+code", &ticket, &[], 1, 1);
        assert!(prompt.contains("Jira Ticket: PROJ-42"));
        assert!(prompt.contains("Type: Bug"));
        assert!(!prompt.contains("Merge Request Title"));
    }

    #[test]
    fn acceptance_criteria_add_bullets_and_check_section() {
        let criteria = vec!["AC: retries three times".to_string()];
        let prompt = build_review_prompt("+code", &mr_ticket(), &criteria, 1, 1);
        assert!(prompt.contains("- AC: retries three times"));
        assert!(prompt.contains("7. Verifies implementation against acceptance criteria"));
        assert!(prompt.contains("## Acceptance Criteria Check"));
    }

    #[test]
    fn no_criteria_means_no_check_section() {
        let prompt = build_review_prompt("+code", &mr_ticket(), &[], 1, 1);
        assert!(!prompt.contains("## Acceptance Criteria Check"));
    }

    #[test]
    fn inline_comment_format_is_always_requested() {
        let prompt = build_review_prompt("+code", &mr_ticket(), &[], 1, 1);
        assert!(prompt.contains("File: path/to/file"));
        assert!(prompt.contains("Line X: [Comment about this specific line]"));
    }
}
