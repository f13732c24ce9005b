//! MR 리뷰 실행의 전체 오케스트레이션 유스케이스.

mod chunks;
mod comments;
mod context;

use anyhow::Result;
use tokio::time::{Duration, Instant};

use crate::application::ports::{
    ConfigRepository, LlmGatewayFactory, MergeRequestGatewayFactory, Reporter, TargetResolver,
    TicketGatewayFactory,
};
use crate::domain::chunk::{format_diff_text, split_diff_into_chunks};
use crate::domain::merge::merge_chunk_reviews;
use crate::domain::review::{ReviewOutcome, RunOptions};

use chunks::run_chunk_reviews;
use comments::publish_review;
use context::load_execution_context;

/// URL 입력부터 diff 분할, 모델 호출, 코멘트 게시까지 전체 흐름을 조율한다.
pub struct ReviewMrUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub target_resolver: &'a dyn TargetResolver,
    pub mr_gateway_factory: &'a dyn MergeRequestGatewayFactory,
    pub ticket_gateway_factory: &'a dyn TicketGatewayFactory,
    pub llm_gateway_factory: &'a dyn LlmGatewayFactory,
    pub reporter: &'a dyn Reporter,
}

impl<'a> ReviewMrUseCase<'a> {
    /// 리뷰 본 실행 진입점.
    pub async fn execute(&self, options: RunOptions) -> Result<ReviewOutcome> {
        self.reporter.section("Session");
        self.reporter.kv("Target", &options.url);
        self.reporter.kv(
            "Mode",
            if options.dry_run { "dry-run" } else { "post-comment" },
        );
        if let Some(secs) = options.deadline_secs {
            self.reporter.kv("Deadline", &format!("{secs}s"));
        }

        let ctx = load_execution_context(self, &options).await?;

        let diff_text = format_diff_text(&ctx.details.changes);
        let chunks =
            split_diff_into_chunks(&diff_text, ctx.config.llm.chunk_size_tokens());

        if chunks.is_empty() {
            // 변경이 없으면 모델 호출 없이 종료한다.
            self.reporter.status("Review", "no changes to review");
            return Ok(ReviewOutcome::no_changes());
        }

        let llm = self.llm_gateway_factory.build(&ctx.config)?;
        self.reporter.section("Review Chunks");
        self.reporter.kv("Model", llm.model());
        self.reporter.kv("Chunks", &chunks.len().to_string());

        let deadline = options
            .deadline_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));
        let run = run_chunk_reviews(self, llm.as_ref(), &chunks, &ctx, deadline).await;

        if run.aborted() {
            self.reporter.status(
                "Review",
                &format!(
                    "partial result: aborted after {}/{} chunks",
                    run.chunks_reviewed(),
                    run.chunks_total
                ),
            );
        }

        let merged = merge_chunk_reviews(&run.reviews);
        let stats = publish_review(self, &options, &ctx, &merged).await?;

        let outcome = ReviewOutcome {
            summary: merged.review.summary.clone(),
            chunks_total: run.chunks_total,
            chunks_reviewed: run.chunks_reviewed(),
            aborted: run.aborted(),
            inline_comments_attempted: stats.attempted,
            inline_comments_positioned: stats.positioned,
            inline_comments_general: stats.general,
        };

        self.reporter.section("Result");
        self.reporter.kv(
            "Chunks",
            &format!("{}/{} reviewed", outcome.chunks_reviewed, outcome.chunks_total),
        );
        self.reporter.kv(
            "Inline",
            &format!(
                "{} attempted, {} positioned, {} general",
                outcome.inline_comments_attempted,
                outcome.inline_comments_positioned,
                outcome.inline_comments_general
            ),
        );

        Ok(outcome)
    }
}
