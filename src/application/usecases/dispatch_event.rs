//! pull_request 이벤트를 액션별로 분기하는 진입 유스케이스.

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::ports::ConfigRepository;
use crate::application::usecases::rolling_build::RollingBuildUseCase;
use crate::domain::errors::UnsupportedAction;
use crate::domain::map_diff::BuildOutcome;
use crate::domain::target::{EventAction, PullRequestEvent};

/// `opened`/`synchronize`만 롤링 빌드로 넘기고 나머지는 거부한다.
pub struct DispatchEventUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
    pub rolling_build: RollingBuildUseCase<'a>,
}

impl<'a> DispatchEventUseCase<'a> {
    pub async fn execute(
        &self,
        event: &PullRequestEvent,
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome> {
        match event.action {
            EventAction::Opened | EventAction::Synchronize => {}
            EventAction::Other(ref action) => {
                debug!(key = %event.key, %action, "ignoring pull_request action");
                return Err(UnsupportedAction(action.clone()).into());
            }
        }

        let config = self.config_repo.load().context("failed to load config")?;
        self.rolling_build.execute(event, &config, cancel).await
    }

    /// 원본 웹훅 JSON을 파싱한 뒤 [`Self::execute`]로 넘긴다.
    pub async fn execute_json(&self, raw: &str, cancel: &CancellationToken) -> Result<BuildOutcome> {
        let event = PullRequestEvent::from_json(raw)?;
        self.execute(&event, cancel).await
    }
}

#[cfg(test)]
mod tests {
    use std::path::{Path, PathBuf};
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;

    use super::*;
    use crate::application::ports::{
        ImageUploader, MapRenderer, RepositoryLease, RepositoryManager, VcsFactory, VcsGateway,
    };
    use crate::application::usecases::rolling_build::OperationRegistry;
    use crate::domain::errors::{RepositoryError, ToolExecutionError};
    use crate::domain::map_diff::DiffRegion;
    use crate::domain::target::PullRequestKey;
    use crate::infrastructure::adapters::{FullMapRegion, MarkdownRendererAdapter};
    use crate::infrastructure::config::{Config, HostConfig};

    /// 설정 로딩 횟수를 세고, 토큰이 없는 설정을 돌려준다.
    #[derive(Default)]
    struct CountingConfig {
        loads: AtomicUsize,
    }

    impl ConfigRepository for CountingConfig {
        fn load(&self) -> Result<Config> {
            self.loads.fetch_add(1, Ordering::SeqCst);
            Ok(Config::default())
        }

        fn inspect_pretty_json(&self) -> Result<String> {
            Ok("{}".into())
        }
    }

    struct Unreachable;

    impl VcsFactory for Unreachable {
        fn build(
            &self,
            _: &PullRequestKey,
            _: Option<&HostConfig>,
            _: Option<String>,
        ) -> Box<dyn VcsGateway> {
            unreachable!("no gateway expected")
        }
    }

    #[async_trait]
    impl RepositoryManager for Unreachable {
        async fn lease(
            &self,
            _: &str,
            _: &str,
            _: &CancellationToken,
        ) -> Result<Box<dyn RepositoryLease>, RepositoryError> {
            unreachable!("no lease expected")
        }
    }

    #[async_trait]
    impl MapRenderer for Unreachable {
        async fn render(
            &self,
            _: &Path,
            _: Option<DiffRegion>,
            _: &Path,
            _: &CancellationToken,
        ) -> Result<PathBuf, ToolExecutionError> {
            unreachable!("no render expected")
        }
    }

    #[async_trait]
    impl ImageUploader for Unreachable {
        async fn upload(&self, _: &Path, _: &str, _: &CancellationToken) -> Result<String> {
            unreachable!("no upload expected")
        }
    }

    fn payload(action: &str) -> String {
        format!(
            r#"{{
                "action": "{action}",
                "pull_request": {{
                    "number": 3,
                    "mergeable": true,
                    "base": {{ "sha": "aaa" }},
                    "head": {{ "sha": "bbb" }}
                }},
                "repository": {{ "name": "station", "owner": {{ "login": "space" }} }}
            }}"#
        )
    }

    fn dispatcher<'a>(
        config_repo: &'a CountingConfig,
        registry: &'a OperationRegistry,
    ) -> DispatchEventUseCase<'a> {
        DispatchEventUseCase {
            config_repo,
            rolling_build: RollingBuildUseCase {
                registry,
                repositories: &Unreachable,
                vcs_factory: &Unreachable,
                renderer: &Unreachable,
                regions: &FullMapRegion,
                uploader: &Unreachable,
                markdown: &MarkdownRendererAdapter,
            },
        }
    }

    #[tokio::test]
    async fn rejects_unsupported_actions_without_loading_config() {
        let config_repo = CountingConfig::default();
        let registry = OperationRegistry::new();
        let dispatcher = dispatcher(&config_repo, &registry);

        let err = dispatcher
            .execute_json(&payload("closed"), &CancellationToken::new())
            .await
            .unwrap_err();

        let unsupported = err.downcast_ref::<UnsupportedAction>().unwrap();
        assert_eq!(unsupported.0, "closed");
        assert_eq!(config_repo.loads.load(Ordering::SeqCst), 0);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn routes_synchronize_to_rolling_build() {
        let config_repo = CountingConfig::default();
        let registry = OperationRegistry::new();
        let dispatcher = dispatcher(&config_repo, &registry);

        // 토큰이 없는 기본 설정이라 빌드는 인증 단계에서 멈춘다.
        let err = dispatcher
            .execute_json(&payload("synchronize"), &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("missing VCS token"));
        assert_eq!(config_repo.loads.load(Ordering::SeqCst), 1);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn malformed_payload_is_rejected() {
        let config_repo = CountingConfig::default();
        let registry = OperationRegistry::new();
        let dispatcher = dispatcher(&config_repo, &registry);

        let err = dispatcher
            .execute_json("{\"action\": \"opened\"}", &CancellationToken::new())
            .await
            .unwrap_err();

        assert!(err.to_string().contains("invalid pull_request payload JSON"));
        assert_eq!(config_repo.loads.load(Ordering::SeqCst), 0);
    }
}
