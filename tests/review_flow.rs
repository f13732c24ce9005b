//! 오케스트레이터 종단 시나리오 테스트(모의 게이트웨이 사용).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;

use mergemate::application::ports::{
    ConfigRepository, LlmGateway, LlmGatewayFactory, MergeRequestGateway,
    MergeRequestGatewayFactory, Reporter, TicketGateway, TicketGatewayFactory,
};
use mergemate::application::usecases::review_mr::ReviewMrUseCase;
use mergemate::domain::review::{
    DiffRefs, FileChange, MergeRequestDetails, NO_CONTENT_BODY, PositionSide, ResolvedPosition,
    RunOptions,
};
use mergemate::domain::target::MergeRequestTarget;
use mergemate::infrastructure::adapters::UrlTargetResolver;
use mergemate::infrastructure::config::{Config, GitLabConfig};
use mergemate::infrastructure::llm::LlmError;

const MR_URL: &str = "https://gitlab.com/acme/widget/-/merge_requests/5";

#[derive(Debug, Clone)]
enum Post {
    Note(String),
    Positioned {
        body: String,
        path: String,
        line_in_hunk: u64,
        side: PositionSide,
    },
}

struct RecordingGateway {
    details: MergeRequestDetails,
    posts: Arc<Mutex<Vec<Post>>>,
}

#[async_trait]
impl MergeRequestGateway for RecordingGateway {
    async fn fetch_details(&self) -> Result<MergeRequestDetails> {
        Ok(self.details.clone())
    }

    async fn post_note(&self, body: &str) -> Result<String> {
        self.posts.lock().unwrap().push(Post::Note(body.to_string()));
        Ok("1".to_string())
    }

    async fn post_positioned_note(
        &self,
        body: &str,
        position: &ResolvedPosition,
    ) -> Result<String> {
        self.posts.lock().unwrap().push(Post::Positioned {
            body: body.to_string(),
            path: position.path.clone(),
            line_in_hunk: position.line_in_hunk,
            side: position.side,
        });
        Ok("d1".to_string())
    }
}

struct RecordingGatewayFactory {
    details: MergeRequestDetails,
    posts: Arc<Mutex<Vec<Post>>>,
}

impl MergeRequestGatewayFactory for RecordingGatewayFactory {
    fn build(
        &self,
        _target: &MergeRequestTarget,
        _gitlab_cfg: &GitLabConfig,
        _token: Option<String>,
    ) -> Box<dyn MergeRequestGateway> {
        Box::new(RecordingGateway {
            details: self.details.clone(),
            posts: self.posts.clone(),
        })
    }
}

#[derive(Clone)]
enum LlmMode {
    Respond(String),
    AuthError,
    RateLimitOnceThen(String),
    Hang,
}

struct ScriptedLlm {
    mode: LlmMode,
    calls: Arc<AtomicUsize>,
    failures_injected: Arc<AtomicUsize>,
}

#[async_trait]
impl LlmGateway for ScriptedLlm {
    fn model(&self) -> &str {
        "test-model"
    }

    async fn review(&self, _prompt: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match &self.mode {
            LlmMode::Respond(text) => Ok(text.clone()),
            LlmMode::AuthError => Err(LlmError::Auth {
                provider: "Test",
                status: 401,
                detail: "bad key".to_string(),
            }),
            LlmMode::RateLimitOnceThen(text) => {
                if self.failures_injected.fetch_add(1, Ordering::SeqCst) == 0 {
                    Err(LlmError::RateLimited {
                        provider: "Test",
                        detail: "slow down".to_string(),
                    })
                } else {
                    Ok(text.clone())
                }
            }
            LlmMode::Hang => {
                tokio::time::sleep(Duration::from_secs(3600)).await;
                Ok(String::new())
            }
        }
    }
}

struct ScriptedLlmFactory {
    mode: LlmMode,
    calls: Arc<AtomicUsize>,
    failures_injected: Arc<AtomicUsize>,
}

impl ScriptedLlmFactory {
    fn new(mode: LlmMode) -> Self {
        Self {
            mode,
            calls: Arc::new(AtomicUsize::new(0)),
            failures_injected: Arc::new(AtomicUsize::new(0)),
        }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl LlmGatewayFactory for ScriptedLlmFactory {
    fn build(&self, _config: &Config) -> Result<Box<dyn LlmGateway>> {
        Ok(Box::new(ScriptedLlm {
            mode: self.mode.clone(),
            calls: self.calls.clone(),
            failures_injected: self.failures_injected.clone(),
        }))
    }
}

struct NoTicketFactory;

impl TicketGatewayFactory for NoTicketFactory {
    fn build(&self, _config: &Config) -> Option<Box<dyn TicketGateway>> {
        None
    }
}

struct StaticConfigRepo(Config);

impl ConfigRepository for StaticConfigRepo {
    fn load(&self) -> Result<Config> {
        Ok(self.0.clone())
    }

    fn inspect_pretty_json(&self) -> Result<String> {
        Ok("{}".to_string())
    }
}

struct SilentReporter;

impl Reporter for SilentReporter {
    fn section(&self, _name: &str) {}
    fn kv(&self, _key: &str, _value: &str) {}
    fn status(&self, _scope: &str, _message: &str) {}
    fn chunk_status(&self, _chunk: usize, _total: usize, _status: &str, _extra: Option<&str>) {}
    fn raw(&self, _line: &str) {}
}

struct Harness {
    config_repo: StaticConfigRepo,
    target_resolver: UrlTargetResolver,
    mr_factory: RecordingGatewayFactory,
    ticket_factory: NoTicketFactory,
    llm_factory: ScriptedLlmFactory,
    reporter: SilentReporter,
    posts: Arc<Mutex<Vec<Post>>>,
}

impl Harness {
    fn new(details: MergeRequestDetails, mode: LlmMode) -> Self {
        let posts = Arc::new(Mutex::new(Vec::new()));
        let mut config = Config::default();
        config.gitlab.token = Some("glpat-test".to_string());

        Self {
            config_repo: StaticConfigRepo(config),
            target_resolver: UrlTargetResolver,
            mr_factory: RecordingGatewayFactory {
                details,
                posts: posts.clone(),
            },
            ticket_factory: NoTicketFactory,
            llm_factory: ScriptedLlmFactory::new(mode),
            reporter: SilentReporter,
            posts,
        }
    }

    fn usecase(&self) -> ReviewMrUseCase<'_> {
        ReviewMrUseCase {
            config_repo: &self.config_repo,
            target_resolver: &self.target_resolver,
            mr_gateway_factory: &self.mr_factory,
            ticket_gateway_factory: &self.ticket_factory,
            llm_gateway_factory: &self.llm_factory,
            reporter: &self.reporter,
        }
    }

    fn posts(&self) -> Vec<Post> {
        self.posts.lock().unwrap().clone()
    }
}

fn run_options() -> RunOptions {
    RunOptions {
        url: MR_URL.to_string(),
        dry_run: false,
        deadline_secs: None,
    }
}

fn two_file_details() -> MergeRequestDetails {
    MergeRequestDetails {
        title: "Tidy up alpha".to_string(),
        description: "General cleanup".to_string(),
        source_branch: "feature/tidy".to_string(),
        target_branch: "main".to_string(),
        changes: vec![
            FileChange {
                old_path: "src/alpha.rs".to_string(),
                new_path: "src/alpha.rs".to_string(),
                diff: "@@ -1,2 +1,5 @@\n context\n+added one\n+added two\n+added three\n context"
                    .to_string(),
                new_file: false,
                renamed_file: false,
                deleted_file: false,
            },
            FileChange {
                old_path: "src/beta.rs".to_string(),
                new_path: "src/beta.rs".to_string(),
                diff: "@@ -1,3 +0,0 @@\n-gone a\n-gone b\n-gone c".to_string(),
                new_file: false,
                renamed_file: false,
                deleted_file: true,
            },
        ],
        diff_refs: Some(DiffRefs {
            base_sha: "base".to_string(),
            head_sha: "head".to_string(),
            start_sha: "start".to_string(),
        }),
    }
}

const TWO_FILE_RESPONSE: &str = "\
## Summary
Solid cleanup overall.

## Potential Issues
The beta removal may leave dangling call sites.

## Inline Comments
```
File: src/alpha.rs
Line 2: Fix the null check before using the value.
File: src/beta.rs
Lines 10-12: Double-check call sites after this removal.
```";

#[tokio::test]
async fn positioned_and_general_comments_are_posted_for_two_files() {
    let harness = Harness::new(
        two_file_details(),
        LlmMode::Respond(TWO_FILE_RESPONSE.to_string()),
    );

    let outcome = harness.usecase().execute(run_options()).await.unwrap();

    assert_eq!(outcome.chunks_total, 1);
    assert_eq!(outcome.chunks_reviewed, 1);
    assert!(!outcome.aborted);
    assert_eq!(outcome.inline_comments_attempted, 2);
    assert_eq!(outcome.inline_comments_positioned, 1);
    assert_eq!(outcome.inline_comments_general, 1);

    let posts = harness.posts();
    assert_eq!(posts.len(), 3);

    // 첫 게시물은 전체 리뷰 노트다.
    let Post::Note(summary_note) = &posts[0] else {
        panic!("expected overall note first, got {:?}", posts[0]);
    };
    assert!(summary_note.contains("Solid cleanup overall."));

    // alpha의 라인 2는 hunk 물리 오프셋 3(+added two 아님: context=1, added one=2)이다.
    let Post::Positioned {
        path,
        line_in_hunk,
        side,
        body,
    } = &posts[1]
    else {
        panic!("expected positioned comment, got {:?}", posts[1]);
    };
    assert_eq!(path, "src/alpha.rs");
    assert_eq!(*line_in_hunk, 3);
    assert_eq!(*side, PositionSide::New);
    assert_eq!(body, "Fix the null check before using the value.");

    // 범위 지정은 포지션으로 해석되지 않는다.
    let Post::Note(general_note) = &posts[2] else {
        panic!("expected general note fallback, got {:?}", posts[2]);
    };
    assert!(general_note.starts_with("Inline comment on src/beta.rs (Line: 10-12):"));
    assert!(general_note.contains("Double-check call sites after this removal."));
}

#[tokio::test]
async fn missing_diff_refs_degrade_every_comment_to_general() {
    let mut details = two_file_details();
    details.diff_refs = None;
    let harness = Harness::new(details, LlmMode::Respond(TWO_FILE_RESPONSE.to_string()));

    let outcome = harness.usecase().execute(run_options()).await.unwrap();

    assert_eq!(outcome.inline_comments_positioned, 0);
    assert_eq!(outcome.inline_comments_general, 2);
    assert!(harness
        .posts()
        .iter()
        .all(|post| matches!(post, Post::Note(_))));
}

#[tokio::test]
async fn empty_diff_short_circuits_without_model_call() {
    let mut details = two_file_details();
    details.changes.clear();
    let harness = Harness::new(details, LlmMode::Respond(TWO_FILE_RESPONSE.to_string()));

    let outcome = harness.usecase().execute(run_options()).await.unwrap();

    assert_eq!(outcome.summary, "No changes to review.");
    assert_eq!(outcome.chunks_total, 0);
    assert_eq!(harness.llm_factory.calls(), 0);
    assert!(harness.posts().is_empty());
}

#[tokio::test(start_paused = true)]
async fn transient_error_is_retried_with_backoff() {
    let harness = Harness::new(
        two_file_details(),
        LlmMode::RateLimitOnceThen("## Summary\nFine.".to_string()),
    );

    let outcome = harness.usecase().execute(run_options()).await.unwrap();

    assert_eq!(harness.llm_factory.calls(), 2);
    assert_eq!(outcome.chunks_reviewed, 1);
    assert!(!outcome.aborted);
}

#[tokio::test]
async fn terminal_error_aborts_but_still_posts_a_summary() {
    let harness = Harness::new(two_file_details(), LlmMode::AuthError);

    let outcome = harness.usecase().execute(run_options()).await.unwrap();

    assert_eq!(outcome.chunks_reviewed, 0);
    assert!(outcome.aborted);
    assert_eq!(outcome.inline_comments_attempted, 0);

    // 구조화 내용이 하나도 없어도 사람이 읽을 요약 노트는 게시된다.
    let posts = harness.posts();
    assert_eq!(posts.len(), 1);
    let Post::Note(note) = &posts[0] else {
        panic!("expected summary note, got {:?}", posts[0]);
    };
    assert_eq!(note, NO_CONTENT_BODY);
}

#[tokio::test(start_paused = true)]
async fn deadline_aborts_remaining_chunks() {
    let harness = Harness::new(two_file_details(), LlmMode::Hang);

    let options = RunOptions {
        deadline_secs: Some(1),
        ..run_options()
    };
    let outcome = harness.usecase().execute(options).await.unwrap();

    assert!(outcome.aborted);
    assert_eq!(outcome.chunks_reviewed, 0);
    assert_eq!(outcome.chunks_total, 1);
}
