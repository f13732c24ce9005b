//! 병합 리뷰 게시 단계(요약 노트 + 인라인 코멘트).
//!
//! 인라인 코멘트 게시는 건별로 격리된다 — 한 건의 실패가 나머지 게시를
//! 막지 않는다.

use anyhow::{Context, Result};
use tracing::warn;

use crate::application::usecases::review_mr::{ReviewMrUseCase, context::ExecutionContext};
use crate::domain::position::resolve_position_in_hunk;
use crate::domain::review::{
    InlineComment, MergeRequestDetails, ParsedReview, PositionSide, ResolvedPosition, RunOptions,
};

/// 게시 단계의 관측 수치.
#[derive(Debug, Default)]
pub(super) struct CommentStats {
    pub attempted: usize,
    pub positioned: usize,
    pub general: usize,
}

/// 코멘트 한 건의 최종 게시 형태.
pub(super) enum CommentPayload {
    Positioned { position: ResolvedPosition, body: String },
    General { body: String },
}

/// 인라인 코멘트를 포지션/일반 코멘트로 분류한다.
///
/// 파일이 diff에 없거나, diff_refs가 없거나, 라인 지정이 범위/문자열이거나,
/// hunk 안에서 라인을 못 찾으면 일반 코멘트로 강등된다.
pub(super) fn build_comment_payload(
    details: &MergeRequestDetails,
    comment: &InlineComment,
) -> CommentPayload {
    let change = details
        .changes
        .iter()
        .find(|c| c.new_path == comment.file || c.old_path == comment.file);

    let Some(change) = change else {
        warn!(file = %comment.file, "file not found in diff; falling back to general comment");
        return general_payload(comment);
    };
    let Some(refs) = &details.diff_refs else {
        return general_payload(comment);
    };
    // 범위("X-Y")와 문자열 지정은 이 버전에서는 포지션으로 해석하지 않는다.
    let Some(requested_line) = comment.line.line_number() else {
        return general_payload(comment);
    };

    let is_old_file_comment = change.deleted_file;
    match resolve_position_in_hunk(&change.diff, requested_line, is_old_file_comment) {
        Some(line_in_hunk) => CommentPayload::Positioned {
            position: ResolvedPosition {
                base_sha: refs.base_sha.clone(),
                head_sha: refs.head_sha.clone(),
                start_sha: refs.start_sha.clone(),
                path: if is_old_file_comment {
                    change.old_path.clone()
                } else {
                    change.new_path.clone()
                },
                line_in_hunk,
                side: if is_old_file_comment {
                    PositionSide::Old
                } else {
                    PositionSide::New
                },
            },
            body: comment.text.clone(),
        },
        None => {
            warn!(file = %comment.file, line = %comment.line, "line not found in diff hunk; falling back to general comment");
            general_payload(comment)
        }
    }
}

fn general_payload(comment: &InlineComment) -> CommentPayload {
    CommentPayload::General {
        body: format!(
            "Inline comment on {} (Line: {}):\n\n{}",
            comment.file, comment.line, comment.text
        ),
    }
}

/// 요약 노트와 인라인 코멘트를 게시(또는 dry-run 출력)한다.
pub(super) async fn publish_review(
    use_case: &ReviewMrUseCase<'_>,
    options: &RunOptions,
    ctx: &ExecutionContext,
    merged: &ParsedReview,
) -> Result<CommentStats> {
    if options.dry_run {
        return Ok(render_dry_run(use_case, ctx, merged));
    }

    use_case.reporter.section("Post Review");
    if merged.raw_response.trim().is_empty() {
        use_case.reporter.status("Summary", "no overall review content to post");
    } else {
        let note_id = ctx
            .mr
            .post_note(&merged.raw_response)
            .await
            .context("failed to post overall review note")?;
        use_case
            .reporter
            .status("Summary", &format!("posted note {note_id}"));
    }

    let mut stats = CommentStats::default();
    for comment in &merged.inline_comments {
        if comment.file.is_empty() || comment.text.is_empty() {
            warn!(?comment, "skipping invalid inline comment");
            continue;
        }
        stats.attempted += 1;

        match build_comment_payload(&ctx.details, comment) {
            CommentPayload::Positioned { position, body } => {
                match ctx.mr.post_positioned_note(&body, &position).await {
                    Ok(_) => stats.positioned += 1,
                    Err(err) => {
                        // 건별 격리: 기록만 남기고 다음 코멘트로 넘어간다.
                        warn!(file = %comment.file, line = %comment.line, error = %err, "failed to post positioned comment");
                        use_case.reporter.status(
                            "Inline",
                            &format!("failed to post positioned comment on {}", comment.file),
                        );
                    }
                }
            }
            CommentPayload::General { body } => match ctx.mr.post_note(&body).await {
                Ok(_) => stats.general += 1,
                Err(err) => {
                    warn!(file = %comment.file, line = %comment.line, error = %err, "failed to post general comment");
                    use_case.reporter.status(
                        "Inline",
                        &format!("failed to post general comment on {}", comment.file),
                    );
                }
            },
        }
    }

    Ok(stats)
}

/// dry-run: 게시 대신 분류 결과를 콘솔로 보여준다. 수치 집계는 동일하다.
fn render_dry_run(
    use_case: &ReviewMrUseCase<'_>,
    ctx: &ExecutionContext,
    merged: &ParsedReview,
) -> CommentStats {
    use_case.reporter.section("Dry Run: Review Note");
    use_case.reporter.raw(&merged.raw_response);

    let mut stats = CommentStats::default();
    if !merged.inline_comments.is_empty() {
        use_case.reporter.section("Dry Run: Inline Comments");
    }
    for comment in &merged.inline_comments {
        if comment.file.is_empty() || comment.text.is_empty() {
            continue;
        }
        stats.attempted += 1;
        match build_comment_payload(&ctx.details, comment) {
            CommentPayload::Positioned { position, body } => {
                stats.positioned += 1;
                use_case.reporter.raw(&format!(
                    "--- positioned: {} (hunk line {}) ---\n{}",
                    position.path, position.line_in_hunk, body
                ));
            }
            CommentPayload::General { body } => {
                stats.general += 1;
                use_case.reporter.raw(&format!("--- general ---\n{body}"));
            }
        }
    }

    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::review::{DiffRefs, FileChange, LineSpec};

    fn details_with(changes: Vec<FileChange>, diff_refs: Option<DiffRefs>) -> MergeRequestDetails {
        MergeRequestDetails {
            title: "change".to_string(),
            description: String::new(),
            source_branch: "feature/change".to_string(),
            target_branch: "main".to_string(),
            changes,
            diff_refs,
        }
    }

    fn refs() -> DiffRefs {
        DiffRefs {
            base_sha: "base".to_string(),
            head_sha: "head".to_string(),
            start_sha: "start".to_string(),
        }
    }

    fn deleted_file_change() -> FileChange {
        FileChange {
            old_path: "src/old.rs".to_string(),
            new_path: "src/old.rs".to_string(),
            diff: "@@ -1,2 +0,0 @@\n-first\n-second".to_string(),
            new_file: false,
            renamed_file: false,
            deleted_file: true,
        }
    }

    fn comment(file: &str, line: LineSpec) -> InlineComment {
        InlineComment {
            file: file.to_string(),
            line,
            text: "note".to_string(),
        }
    }

    #[test]
    fn deleted_file_comment_resolves_on_old_side() {
        let details = details_with(vec![deleted_file_change()], Some(refs()));
        let payload = build_comment_payload(&details, &comment("src/old.rs", LineSpec::Line(2)));

        let CommentPayload::Positioned { position, .. } = payload else {
            panic!("expected positioned payload");
        };
        assert_eq!(position.side, PositionSide::Old);
        assert_eq!(position.path, "src/old.rs");
        assert_eq!(position.line_in_hunk, 3);
    }

    #[test]
    fn unknown_file_falls_back_to_general() {
        let details = details_with(vec![deleted_file_change()], Some(refs()));
        let payload = build_comment_payload(&details, &comment("src/other.rs", LineSpec::Line(1)));

        let CommentPayload::General { body } = payload else {
            panic!("expected general payload");
        };
        assert!(body.starts_with("Inline comment on src/other.rs (Line: 1):"));
    }

    #[test]
    fn textual_line_spec_never_resolves() {
        let details = details_with(vec![deleted_file_change()], Some(refs()));
        let payload = build_comment_payload(
            &details,
            &comment("src/old.rs", LineSpec::Text("the whole file".to_string())),
        );
        assert!(matches!(payload, CommentPayload::General { .. }));
    }

    #[test]
    fn line_past_hunk_end_falls_back_to_general() {
        let details = details_with(vec![deleted_file_change()], Some(refs()));
        let payload = build_comment_payload(&details, &comment("src/old.rs", LineSpec::Line(9)));
        assert!(matches!(payload, CommentPayload::General { .. }));
    }
}
