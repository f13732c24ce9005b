//! Infrastructure layer
//! 외부 시스템(GitLab/Jira/LLM API/파일시스템)과 직접 통신하는 구현체 집합.

pub mod adapters;
pub mod config;
pub mod gitlab;
pub mod jira;
pub mod llm;
