//! 애플리케이션 포트를 실제 인프라 구현체로 연결하는 어댑터 계층.

mod config_repository;
mod markdown_renderer;
mod region_calculator;
mod vcs_factory;

pub use config_repository::JsonConfigRepository;
pub use markdown_renderer::MarkdownRendererAdapter;
pub use region_calculator::FullMapRegion;
pub use vcs_factory::VcsFactoryAdapter;
