//! Interface layer
//! CLI 입력 파싱과 애플리케이션 조립을 담당한다.

pub mod cli;
pub mod composition;
