//! 애플리케이션 조립(composition root) 모듈.

use anyhow::Result;

use crate::application::usecases::dispatch_event::DispatchEventUseCase;
use crate::application::usecases::inspect_config::InspectConfigUseCase;
use crate::application::usecases::rolling_build::{OperationRegistry, RollingBuildUseCase};
use crate::infrastructure::adapters::{
    FullMapRegion, JsonConfigRepository, MarkdownRendererAdapter, VcsFactoryAdapter,
};
use crate::infrastructure::config::Config;
use crate::infrastructure::imgur::ImgurUploader;
use crate::infrastructure::map_tool::MapToolRenderer;
use crate::infrastructure::repository::GitRepositoryManager;

/// 실행 시점 의존성을 한 곳에서 조립하는 컨테이너.
/// 레지스트리와 저장소 관리자는 프로세스 전체에서 하나만 존재해야 한다.
pub struct AppComposition {
    config_repo: JsonConfigRepository,
    registry: OperationRegistry,
    repositories: GitRepositoryManager,
    vcs_factory: VcsFactoryAdapter,
    renderer: MapToolRenderer,
    regions: FullMapRegion,
    uploader: ImgurUploader,
    markdown: MarkdownRendererAdapter,
}

impl AppComposition {
    /// 시작 시점 설정으로 장기 실행 구성요소를 만든다.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            config_repo: JsonConfigRepository,
            registry: OperationRegistry::new(),
            repositories: GitRepositoryManager::new(
                config.repositories_dir(),
                config.clone_base_url(),
            )?,
            vcs_factory: VcsFactoryAdapter,
            renderer: MapToolRenderer::new(config.render_command_spec()),
            regions: FullMapRegion,
            uploader: ImgurUploader::new(config.upload.api_base()),
            markdown: MarkdownRendererAdapter,
        })
    }

    /// 설정 파일을 읽어 조립한다.
    pub fn load() -> Result<Self> {
        Self::new(&Config::load()?)
    }

    /// 설정 점검 유스케이스를 생성한다.
    pub fn inspect_config_usecase(&self) -> InspectConfigUseCase<'_> {
        InspectConfigUseCase {
            config_repo: &self.config_repo,
        }
    }

    /// 이벤트 분기 유스케이스를 생성한다.
    pub fn dispatch_usecase(&self) -> DispatchEventUseCase<'_> {
        DispatchEventUseCase {
            config_repo: &self.config_repo,
            rolling_build: RollingBuildUseCase {
                registry: &self.registry,
                repositories: &self.repositories,
                vcs_factory: &self.vcs_factory,
                renderer: &self.renderer,
                regions: &self.regions,
                uploader: &self.uploader,
                markdown: &self.markdown,
            },
        }
    }
}
