//! 청크별 부분 리뷰를 최종 리뷰 하나로 병합하는 모듈.

use tracing::warn;

use crate::domain::review::{ParsedReview, StructuredReview};

/// 어떤 청크도 내용을 내지 않은 섹션에 들어가는 문구.
pub const NO_FEEDBACK_PLACEHOLDER: &str = "No specific feedback provided.";

/// 청크 순서대로 섹션을 이어 붙이고 인라인 코멘트를 평탄화한다.
///
/// 섹션은 빈 문자열로 남는 일이 없다 — 기여가 없으면 플레이스홀더가 들어간다.
/// 청크가 둘 이상이면 summary 앞에 분할 안내 배너를 붙인다. 청크 경계를 넘는
/// 중복 인라인 코멘트는 제거하지 않는다(알려진 한계). 원소 하나짜리 병합은
/// 플레이스홀더 채움을 제외하면 항등 변환이다.
pub fn merge_chunk_reviews(reviews: &[ParsedReview]) -> ParsedReview {
    if reviews.is_empty() {
        warn!("no chunk reviews to merge");
        return ParsedReview::no_content();
    }

    let mut merged = StructuredReview::default();
    for key in StructuredReview::SECTION_KEYS {
        let contributions: Vec<&str> = reviews
            .iter()
            .filter_map(|chunk| chunk.review.section(key))
            .filter(|content| !content.is_empty())
            .collect();

        let content = if contributions.is_empty() {
            NO_FEEDBACK_PLACEHOLDER.to_string()
        } else {
            contributions.join("\n\n")
        };
        if let Some(slot) = merged.section_mut(key) {
            *slot = content;
        }
    }

    if reviews.len() > 1 {
        merged.summary = format!(
            "## Complete Review Summary ({} parts)\n\
             This review was split into multiple parts due to size. \
             Below is a combined analysis of all changes.\n\n{}",
            reviews.len(),
            merged.summary
        );
    }

    let raw_response = if reviews.len() > 1 {
        let bodies: Vec<&str> = reviews
            .iter()
            .map(|chunk| chunk.raw_response.as_str())
            .collect();
        format!("## Complete Review\n\n{}", bodies.join("\n\n---\n\n"))
    } else {
        reviews[0].raw_response.clone()
    };

    let inline_comments = reviews
        .iter()
        .flat_map(|chunk| chunk.inline_comments.iter().cloned())
        .collect();

    ParsedReview {
        review: merged,
        raw_response,
        inline_comments,
    }
}
