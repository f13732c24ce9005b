//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod config_repository;
mod gitlab_factory;
mod jira_factory;
mod llm_factory;
mod reporter;
mod target_resolver;

pub use config_repository::JsonConfigRepository;
pub use gitlab_factory::GitLabGatewayFactory;
pub use jira_factory::JiraGatewayFactory;
pub use llm_factory::LlmFactoryAdapter;
pub use reporter::ConsoleReporter;
pub use target_resolver::UrlTargetResolver;
