//! 모델 리뷰 응답 파서.
//!
//! 자유 텍스트 응답을 한 줄씩 걷는 상태 기계로 구조화 리뷰와 인라인 코멘트
//! 요청을 복원한다. 어떤 입력에서도 에러를 던지지 않는다 — 형식이 깨진
//! 응답은 폴백 경로(전체 텍스트를 summary로, 라인 지정은 원문 문자열로)로
//! 흡수된다.

use tracing::warn;

use crate::domain::review::{InlineComment, LineSpec, ParsedReview, StructuredReview};

const FENCE: &str = "```";
const INLINE_COMMENTS_HEADING: &str = "## Inline Comments";

/// 라인 단위 전이로 옮겨 다니는 파서 상태.
enum ParserState {
    /// 코드 블록 밖. `section`은 현재 열린 섹션 키.
    Body { section: Option<String> },
    /// 인라인 코멘트 코드 블록 안.
    CodeBlock(CommentAccumulator),
}

/// 코드 블록 내부에서 조립 중인 코멘트 한 건.
#[derive(Default)]
struct CommentAccumulator {
    file: Option<String>,
    line: LineSpec,
    buffer: Vec<String>,
}

impl CommentAccumulator {
    /// 버퍼에 내용이 있으면 코멘트로 확정한다. 파일 스코프는 유지된다.
    fn flush(&mut self, comments: &mut Vec<InlineComment>) {
        let text = self.buffer.join("\n").trim().to_string();
        self.buffer.clear();
        let line = std::mem::take(&mut self.line);
        if let Some(file) = &self.file
            && !text.is_empty()
        {
            comments.push(InlineComment {
                file: file.clone(),
                line,
                text,
            });
        }
    }
}

/// 모델 응답을 구조화 리뷰 + 인라인 코멘트 목록으로 파싱한다.
///
/// 빈 응답은 모든 섹션이 채워진 "no review content" 리뷰로 끝난다(재시도
/// 대상이 아니다). 코멘트 순서는 응답에 나타난 순서를 그대로 따른다.
pub fn parse_review_response(raw: &str) -> ParsedReview {
    if raw.trim().is_empty() {
        warn!("empty review response received from model");
        return ParsedReview::no_content();
    }

    let mut review = StructuredReview::default();
    let mut comments: Vec<InlineComment> = Vec::new();
    let mut section_buffer: Vec<&str> = Vec::new();
    let mut state = ParserState::Body { section: None };

    for line in raw.lines() {
        state = match state {
            ParserState::Body { mut section } => {
                if line.trim() == FENCE {
                    // 코드 블록 진입은 열린 섹션을 닫는다.
                    flush_section(&mut review, section.take(), &mut section_buffer);
                    ParserState::CodeBlock(CommentAccumulator::default())
                } else if let Some(heading) = line.strip_prefix("## ") {
                    flush_section(&mut review, section.take(), &mut section_buffer);
                    let next = if line.trim() == INLINE_COMMENTS_HEADING {
                        // 인라인 코멘트 헤딩은 섹션을 열지 않는다.
                        // 내용은 뒤따르는 코드 블록에만 존재한다.
                        None
                    } else {
                        Some(section_key(heading))
                    };
                    ParserState::Body { section: next }
                } else {
                    if section.is_some() {
                        section_buffer.push(line);
                    }
                    ParserState::Body { section }
                }
            }
            ParserState::CodeBlock(mut acc) => {
                let trimmed = line.trim();
                if trimmed == FENCE {
                    acc.flush(&mut comments);
                    ParserState::Body { section: None }
                } else if let Some(file) = trimmed.strip_prefix("File: ") {
                    acc.flush(&mut comments);
                    acc.file = Some(file.trim().to_string());
                    ParserState::CodeBlock(acc)
                } else if acc.file.is_some()
                    && let Some(rest) = line_header(trimmed)
                {
                    acc.flush(&mut comments);
                    let (spec, seed) = match rest.split_once(':') {
                        Some((spec, seed)) => (spec, Some(seed.trim())),
                        None => (rest, None),
                    };
                    acc.line = LineSpec::parse(spec);
                    if let Some(seed) = seed.filter(|s| !s.is_empty()) {
                        acc.buffer.push(seed.to_string());
                    }
                    ParserState::CodeBlock(acc)
                } else {
                    if acc.file.is_some() {
                        acc.buffer.push(line.to_string());
                    }
                    ParserState::CodeBlock(acc)
                }
            }
        };
    }

    // 입력 끝: 열린 섹션/미종결 코드 블록의 잔여분을 확정한다.
    match state {
        ParserState::Body { section } => {
            flush_section(&mut review, section, &mut section_buffer);
        }
        ParserState::CodeBlock(mut acc) => acc.flush(&mut comments),
    }

    if review.is_empty() {
        warn!("no structured sections found in review response; using full text as summary");
        review.summary = text_outside_inline_block(raw);
    }

    ParsedReview {
        review,
        raw_response: raw.to_string(),
        inline_comments: comments,
    }
}

/// `Line `/`Lines ` 헤더면 나머지 부분을 돌려준다.
fn line_header(trimmed: &str) -> Option<&str> {
    trimmed
        .strip_prefix("Lines ")
        .or_else(|| trimmed.strip_prefix("Line "))
}

/// 헤딩 텍스트를 snake_case 섹션 키로 정규화한다.
fn section_key(heading: &str) -> String {
    heading.trim().to_lowercase().replace(' ', "_")
}

fn flush_section(
    review: &mut StructuredReview,
    section: Option<String>,
    buffer: &mut Vec<&str>,
) {
    let content = buffer.join("\n").trim().to_string();
    buffer.clear();
    if let Some(key) = section
        && !content.is_empty()
        && let Some(slot) = review.section_mut(&key)
    {
        *slot = content;
    }
}

/// summary 폴백용: `## Inline Comments` 헤딩부터 닫는 펜스까지를 제외한 텍스트.
fn text_outside_inline_block(raw: &str) -> String {
    let mut kept: Vec<&str> = Vec::new();
    let mut skipping = false;
    let mut fences_seen = 0;

    for line in raw.lines() {
        if skipping {
            if line.trim() == FENCE {
                fences_seen += 1;
                if fences_seen == 2 {
                    skipping = false;
                }
            }
            continue;
        }
        if line.trim() == INLINE_COMMENTS_HEADING {
            skipping = true;
            fences_seen = 0;
            continue;
        }
        kept.push(line);
    }

    kept.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::NO_CONTENT_NOTICE;

    const FULL_RESPONSE: &str = "\
## Summary
Adds retry handling to the HTTP client.

## Code Quality
Well factored.

## Potential Issues
Retry loop never caps attempts.

## Inline Comments
```
File: src/client.rs
Line 12: Cap the retry count.
Line 30-35: This block swallows the original error.
File: src/config.rs
Line 4: Default timeout is zero.
```

## Suggestions
Add jitter to the backoff.";

    #[test]
    fn sections_are_parsed_into_named_slots() {
        let parsed = parse_review_response(FULL_RESPONSE);
        assert_eq!(parsed.review.summary, "Adds retry handling to the HTTP client.");
        assert_eq!(parsed.review.quality, "Well factored.");
        assert_eq!(parsed.review.issues, "Retry loop never caps attempts.");
        assert_eq!(parsed.review.suggestions, "Add jitter to the backoff.");
        assert!(parsed.review.security.is_empty());
    }

    #[test]
    fn inline_comments_keep_declaration_order_and_file_scopes() {
        let parsed = parse_review_response(FULL_RESPONSE);
        let comments = &parsed.inline_comments;
        assert_eq!(comments.len(), 3);

        assert_eq!(comments[0].file, "src/client.rs");
        assert_eq!(comments[0].line, LineSpec::Line(12));
        assert_eq!(comments[0].text, "Cap the retry count.");

        assert_eq!(comments[1].file, "src/client.rs");
        assert_eq!(comments[1].line, LineSpec::Range("30-35".to_string()));

        assert_eq!(comments[2].file, "src/config.rs");
        assert_eq!(comments[2].line, LineSpec::Line(4));
    }

    #[test]
    fn two_file_groups_yield_two_distinct_scopes_in_order() {
        let response = "## Inline Comments\n```\nFile: a.rs\nLine 1: first\nFile: b.rs\nLine 2: second\n```";
        let parsed = parse_review_response(response);
        let files: Vec<&str> = parsed
            .inline_comments
            .iter()
            .map(|c| c.file.as_str())
            .collect();
        assert_eq!(files, vec!["a.rs", "b.rs"]);
    }

    #[test]
    fn multi_line_comment_bodies_accumulate_until_next_header() {
        let response =
            "## Inline Comments\n```\nFile: a.rs\nLine 3: first line\nsecond line\nLine 9: next\n```";
        let parsed = parse_review_response(response);
        assert_eq!(parsed.inline_comments[0].text, "first line\nsecond line");
        assert_eq!(parsed.inline_comments[1].text, "next");
    }

    #[test]
    fn lines_prefix_is_accepted() {
        let response = "## Inline Comments\n```\nFile: a.rs\nLines 4-6: tidy this up\n```";
        let parsed = parse_review_response(response);
        assert_eq!(parsed.inline_comments[0].line, LineSpec::Range("4-6".to_string()));
    }

    #[test]
    fn unparsable_line_spec_keeps_raw_string() {
        let response = "## Inline Comments\n```\nFile: a.rs\nLine whole file: rework\n```";
        let parsed = parse_review_response(response);
        assert_eq!(
            parsed.inline_comments[0].line,
            LineSpec::Text("whole file".to_string())
        );
    }

    #[test]
    fn unterminated_code_block_still_flushes_last_comment() {
        let response = "## Inline Comments\n```\nFile: a.rs\nLine 2: dangling";
        let parsed = parse_review_response(response);
        assert_eq!(parsed.inline_comments.len(), 1);
        assert_eq!(parsed.inline_comments[0].text, "dangling");
    }

    #[test]
    fn empty_response_yields_canned_review() {
        let parsed = parse_review_response("   \n  ");
        assert_eq!(parsed.review.summary, NO_CONTENT_NOTICE);
        assert_eq!(parsed.review.security, NO_CONTENT_NOTICE);
        assert!(parsed.inline_comments.is_empty());
    }

    #[test]
    fn unstructured_response_falls_back_to_summary() {
        let response = "Looks fine overall, nothing blocking.";
        let parsed = parse_review_response(response);
        assert_eq!(parsed.review.summary, response);
    }

    #[test]
    fn summary_fallback_excludes_inline_comment_block() {
        let response =
            "Looks fine overall.\n\n## Inline Comments\n```\nFile: a.rs\nLine 1: nit\n```";
        let parsed = parse_review_response(response);
        assert_eq!(parsed.review.summary, "Looks fine overall.");
        assert_eq!(parsed.inline_comments.len(), 1);
    }

    #[test]
    fn inline_comments_heading_opens_no_section() {
        let parsed = parse_review_response(FULL_RESPONSE);
        // 코드 블록 밖 어느 섹션에도 인라인 코멘트 본문이 새지 않는다.
        for key in StructuredReview::SECTION_KEYS {
            let content = parsed.review.section(key).unwrap_or_default();
            assert!(!content.contains("Cap the retry count."));
        }
    }
}
