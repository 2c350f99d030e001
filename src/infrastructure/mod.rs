//! Infrastructure layer
//! 외부 시스템(git/렌더 도구/HTTP API/파일시스템)과 직접 통신하는 구현체 집합.

pub mod adapters;
pub mod config;
pub mod imgur;
pub mod map_tool;
pub mod process;
pub mod render;
pub mod repository;
pub mod vcs;
