//! 청크별 모델 호출 단계.
//!
//! 청크 리뷰는 동시에 실행하되 병합 전에 청크 인덱스 순서로 재정렬한다.
//! 마감(deadline) 또는 종결성 오류가 나면 남은 청크만 중단하고, 완료된
//! 청크 결과는 그대로 살려 부분 결과로 보고한다.

use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::time::{Duration, Instant as TokioInstant, sleep, sleep_until};
use tracing::warn;

use crate::application::ports::LlmGateway;
use crate::application::usecases::review_mr::{ReviewMrUseCase, context::ExecutionContext};
use crate::domain::parse::parse_review_response;
use crate::domain::prompt::build_review_prompt;
use crate::domain::review::ParsedReview;
use crate::infrastructure::llm::LlmError;

/// 일시적 오류에 대한 청크당 최대 시도 횟수.
const MAX_ATTEMPTS_PER_CHUNK: u32 = 3;
const RETRY_BASE_DELAY: Duration = Duration::from_secs(1);

/// 청크 실행 결과 묶음.
pub(super) struct ChunkRunReport {
    /// 완료된 리뷰, 청크 인덱스 순서
    pub reviews: Vec<ParsedReview>,
    pub chunks_total: usize,
}

impl ChunkRunReport {
    pub fn chunks_reviewed(&self) -> usize {
        self.reviews.len()
    }

    pub fn aborted(&self) -> bool {
        self.reviews.len() < self.chunks_total
    }
}

/// 모든 청크를 동시 실행하고 인덱스 순서로 수집한다.
pub(super) async fn run_chunk_reviews(
    use_case: &ReviewMrUseCase<'_>,
    llm: &dyn LlmGateway,
    chunks: &[String],
    ctx: &ExecutionContext,
    deadline: Option<TokioInstant>,
) -> ChunkRunReport {
    let total = chunks.len();
    let mut review_futures = FuturesUnordered::new();

    for (index, chunk) in chunks.iter().enumerate() {
        let prompt = build_review_prompt(
            chunk,
            &ctx.ticket,
            &ctx.acceptance_criteria,
            index + 1,
            total,
        );
        use_case.reporter.chunk_status(index + 1, total, "running", None);

        review_futures.push(async move {
            let started = Instant::now();
            let result = review_with_retry(llm, &prompt).await;
            (index, result, started.elapsed().as_secs_f32())
        });
    }

    // 인덱스 슬롯에 모아 두면 완료 순서와 무관하게 청크 순서가 유지된다.
    let mut slots: Vec<Option<ParsedReview>> = (0..total).map(|_| None).collect();

    let deadline_wait = async {
        match deadline {
            Some(at) => sleep_until(at).await,
            None => std::future::pending().await,
        }
    };
    tokio::pin!(deadline_wait);

    loop {
        tokio::select! {
            _ = &mut deadline_wait => {
                use_case.reporter.status("Review", "deadline reached; aborting remaining chunks");
                break;
            }
            completed = review_futures.next() => {
                let Some((index, result, elapsed)) = completed else {
                    break;
                };
                match result {
                    Ok(text) => {
                        use_case.reporter.chunk_status(
                            index + 1,
                            total,
                            "done",
                            Some(&format!("{elapsed:.1}s")),
                        );
                        slots[index] = Some(parse_review_response(&text));
                    }
                    Err(err) => {
                        use_case.reporter.chunk_status(
                            index + 1,
                            total,
                            "error",
                            Some(&format!("{elapsed:.1}s")),
                        );
                        warn!(chunk = index + 1, total, error = %err, "chunk review failed; aborting remaining chunks");
                        break;
                    }
                }
            }
        }
    }
    // 루프를 빠져나오며 남은 future는 드롭되어 실행이 중단된다.
    drop(review_futures);

    ChunkRunReport {
        reviews: slots.into_iter().flatten().collect(),
        chunks_total: total,
    }
}

/// 일시적 오류(레이트 리밋/타임아웃 등)만 지수 백오프로 재시도한다.
async fn review_with_retry(llm: &dyn LlmGateway, prompt: &str) -> Result<String, LlmError> {
    let mut attempt: u32 = 1;
    loop {
        match llm.review(prompt).await {
            Ok(text) => return Ok(text),
            Err(err) if err.is_transient() && attempt < MAX_ATTEMPTS_PER_CHUNK => {
                let backoff = RETRY_BASE_DELAY * 2u32.pow(attempt - 1);
                warn!(attempt, error = %err, "transient model error; retrying after backoff");
                sleep(backoff).await;
                attempt += 1;
            }
            Err(err) => return Err(err),
        }
    }
}
