//! 애플리케이션 조립(composition root) 모듈.

use crate::application::usecases::inspect_config::InspectConfigUseCase;
use crate::application::usecases::review_mr::ReviewMrUseCase;
use crate::infrastructure::adapters::{
    ConsoleReporter, GitLabGatewayFactory, JiraGatewayFactory, JsonConfigRepository,
    LlmFactoryAdapter, UrlTargetResolver,
};

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
pub struct AppComposition {
    config_repo: JsonConfigRepository,
    target_resolver: UrlTargetResolver,
    mr_gateway_factory: GitLabGatewayFactory,
    ticket_gateway_factory: JiraGatewayFactory,
    llm_gateway_factory: LlmFactoryAdapter,
    reporter: ConsoleReporter,
}

impl Default for AppComposition {
    fn default() -> Self {
        Self {
            config_repo: JsonConfigRepository,
            target_resolver: UrlTargetResolver,
            mr_gateway_factory: GitLabGatewayFactory,
            ticket_gateway_factory: JiraGatewayFactory,
            llm_gateway_factory: LlmFactoryAdapter,
            reporter: ConsoleReporter::new(),
        }
    }
}

impl AppComposition {
    /// 설정 점검 유스케이스를 생성한다.
    pub fn inspect_config_usecase(&self) -> InspectConfigUseCase<'_> {
        InspectConfigUseCase {
            config_repo: &self.config_repo,
        }
    }

    /// 리뷰 실행 유스케이스를 생성한다.
    pub fn review_usecase(&self) -> ReviewMrUseCase<'_> {
        ReviewMrUseCase {
            config_repo: &self.config_repo,
            target_resolver: &self.target_resolver,
            mr_gateway_factory: &self.mr_gateway_factory,
            ticket_gateway_factory: &self.ticket_gateway_factory,
            llm_gateway_factory: &self.llm_gateway_factory,
            reporter: &self.reporter,
        }
    }
}
