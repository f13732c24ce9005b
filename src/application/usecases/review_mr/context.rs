//! 리뷰 실행 컨텍스트(설정/대상/MR 상세/티켓 컨텍스트) 준비 단계.

use anyhow::{Context, Result, bail};
use tracing::warn;

use crate::application::ports::MergeRequestGateway;
use crate::application::usecases::review_mr::ReviewMrUseCase;
use crate::domain::review::{MergeRequestDetails, RunOptions};
use crate::domain::ticket::{TicketContext, extract_acceptance_criteria, extract_ticket_id};
use crate::infrastructure::config::{Config, resolve_gitlab_token};

/// 리뷰 유스케이스 전 구간에서 공유되는 실행 상태.
pub(super) struct ExecutionContext {
    pub config: Config,
    pub mr: Box<dyn MergeRequestGateway>,
    pub details: MergeRequestDetails,
    pub ticket: TicketContext,
    pub acceptance_criteria: Vec<String>,
}

/// 설정 로딩, 대상 파싱, MR 상세 조회, 티켓 컨텍스트 구성까지 선행한다.
pub(super) async fn load_execution_context(
    use_case: &ReviewMrUseCase<'_>,
    options: &RunOptions,
) -> Result<ExecutionContext> {
    use_case.reporter.section("Load Config");
    let config = use_case
        .config_repo
        .load()
        .context("failed to load mergemate config")?;

    let target = use_case
        .target_resolver
        .parse(&options.url)
        .context("failed to parse merge request URL")?;

    let token = resolve_gitlab_token(&config.gitlab).value;
    if !options.dry_run && token.is_none() {
        bail!(
            "missing GitLab token. Configure gitlab.token or gitlab.token_env in config, or use --dry-run"
        );
    }

    let mr = use_case
        .mr_gateway_factory
        .build(&target, &config.gitlab, token);

    use_case.reporter.section("Fetch Merge Request");
    use_case.reporter.kv("Host", &target.host);
    use_case.reporter.kv("Project", &target.project_path);
    use_case.reporter.kv("IID", &target.iid.to_string());

    let details = mr.fetch_details().await?;
    use_case.reporter.kv("Title", &details.title);
    use_case
        .reporter
        .kv("Files", &details.changes.len().to_string());
    if details.diff_refs.is_none() {
        // 포지션 코멘트의 전제 조건이 빠졌다. 전부 일반 코멘트로 내려간다.
        use_case.reporter.status(
            "MR",
            "diff_refs missing; inline comments will be posted as general notes",
        );
    }

    let ticket = load_ticket_context(use_case, &config, &details).await;
    let acceptance_criteria = if ticket.id.is_some() {
        extract_acceptance_criteria(&ticket.description)
    } else {
        Vec::new()
    };
    if !acceptance_criteria.is_empty() {
        use_case
            .reporter
            .kv("Criteria", &acceptance_criteria.len().to_string());
    }

    Ok(ExecutionContext {
        config,
        mr,
        details,
        ticket,
        acceptance_criteria,
    })
}

/// MR 제목/브랜치에서 티켓 ID를 찾아 조회한다.
/// 조회 실패는 치명적이지 않다 — MR 제목/설명 폴백 컨텍스트로 내려간다.
async fn load_ticket_context(
    use_case: &ReviewMrUseCase<'_>,
    config: &Config,
    details: &MergeRequestDetails,
) -> TicketContext {
    let fallback = TicketContext::from_merge_request(&details.title, &details.description);

    let Some(ticket_id) = extract_ticket_id(&details.title, &details.source_branch) else {
        use_case
            .reporter
            .status("Ticket", "no ticket id found; using MR context");
        return fallback;
    };

    let Some(gateway) = use_case.ticket_gateway_factory.build(config) else {
        use_case
            .reporter
            .status("Ticket", "tracker not configured; using MR context");
        return fallback;
    };

    match gateway.fetch_ticket(&ticket_id).await {
        Ok(ticket) => {
            use_case.reporter.kv("Ticket", &ticket_id);
            ticket
        }
        Err(err) => {
            warn!(ticket_id = %ticket_id, error = %err, "failed to fetch ticket details; using MR context");
            use_case
                .reporter
                .status("Ticket", "fetch failed; using MR context");
            fallback
        }
    }
}
