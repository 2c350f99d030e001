//! PR 하나에 대한 롤링 빌드 오케스트레이션 유스케이스.
//!
//! 같은 PR에 새 이벤트가 오면 진행 중이던 빌드는 취소되고, 취소된 빌드는
//! 아무것도 게시하지 않은 채 조용히 종료된다.

mod mergeability;
mod pipeline;
mod publish;
mod registry;

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::application::ports::{
    ImageUploader, MapRenderer, MarkdownRenderer, RegionCalculator, RepositoryManager, VcsFactory,
};
use crate::domain::errors::{Cancelled, is_cancellation};
use crate::domain::map_diff::{BuildOutcome, MapDiff};
use crate::domain::policy::{before_snapshot_name, is_map_file};
use crate::domain::target::PullRequestEvent;
use crate::infrastructure::config::Config;

use mergeability::{Mergeability, resolve_mergeability};
use publish::publish_map_diffs;

pub use pipeline::DiffPipeline;
pub use registry::{OperationGuard, OperationRegistry};

const GITHUB_HOST: &str = "github.com";

/// 이벤트 하나를 받아 렌더링부터 코멘트 게시까지 조율한다.
pub struct RollingBuildUseCase<'a> {
    pub registry: &'a OperationRegistry,
    pub repositories: &'a dyn RepositoryManager,
    pub vcs_factory: &'a dyn VcsFactory,
    pub renderer: &'a dyn MapRenderer,
    pub regions: &'a dyn RegionCalculator,
    pub uploader: &'a dyn ImageUploader,
    pub markdown: &'a dyn MarkdownRenderer,
}

impl<'a> RollingBuildUseCase<'a> {
    /// 롤링 빌드 진입점.
    /// 취소는 오류가 아니라 `BuildOutcome::Cancelled`로 돌아온다.
    pub async fn execute(
        &self,
        event: &PullRequestEvent,
        config: &Config,
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome> {
        let operation = self.registry.register(&event.key, cancel);
        let token = operation.token().clone();
        info!(key = %event.key, head = %event.head_sha, "rolling build started");

        let result = self.run(event, config, &token).await;
        drop(operation);

        match result {
            Ok(outcome) => {
                info!(key = %event.key, ?outcome, "rolling build finished");
                Ok(outcome)
            }
            Err(err) if token.is_cancelled() || is_cancellation(&err) => {
                info!(key = %event.key, "rolling build abandoned after cancellation");
                Ok(BuildOutcome::Cancelled)
            }
            Err(err) => Err(err),
        }
    }

    async fn run(
        &self,
        event: &PullRequestEvent,
        config: &Config,
        cancel: &CancellationToken,
    ) -> Result<BuildOutcome> {
        let host_cfg = config.host_config(GITHUB_HOST);
        let Some(token) = host_cfg.and_then(|h| h.resolve_token()) else {
            bail!(
                "missing VCS token for host '{GITHUB_HOST}'. Configure hosts.{GITHUB_HOST}.token or hosts.{GITHUB_HOST}.token_env"
            );
        };
        let vcs = self.vcs_factory.build(&event.key, host_cfg, Some(token));

        let mergeability = resolve_mergeability(
            event.mergeable,
            vcs.as_ref(),
            config.mergeability_retries(),
            config.mergeability_delay(),
            cancel,
        )
        .await?;
        match mergeability {
            Mergeability::Mergeable => {}
            Mergeability::NotMergeable => {
                info!(key = %event.key, "pull request is not mergeable; skipping");
                return Ok(BuildOutcome::NotMergeable);
            }
            Mergeability::Unknown => {
                info!(key = %event.key, "mergeability still unknown after retries; skipping");
                return Ok(BuildOutcome::MergeabilityUnknown);
            }
        }

        let maps: Vec<String> = vcs
            .list_changed_files()
            .await?
            .into_iter()
            .filter(|f| is_map_file(&f.path, config.map_extension()))
            .map(|f| {
                info!(map = %f.path, status = %f.status, "changed map");
                f.path
            })
            .collect();
        if maps.is_empty() {
            return Ok(BuildOutcome::NoMapChanges);
        }

        let credentials = config.upload.resolve_credentials().context(
            "missing upload credentials. Configure upload.client_id(_env) and upload.client_secret(_env)",
        )?;

        let output_dir = config
            .output_dir()
            .join(&event.key.owner)
            .join(&event.key.repo)
            .join(event.key.number.to_string());
        let diffs = self.render_maps(event, &maps, &output_dir, cancel).await?;
        if diffs.is_empty() {
            return Ok(BuildOutcome::NoMapChanges);
        }

        ensure_not_cancelled(cancel)?;
        let comment_id =
            publish_map_diffs(self, vcs.as_ref(), &diffs, &credentials, cancel).await?;

        Ok(BuildOutcome::Published {
            comment_id,
            maps: diffs.len(),
        })
    }

    /// 저장소를 임대해 파일마다 base 체크아웃 → 스냅샷 → head 머지 → 렌더링을 수행한다.
    /// 임대는 반환 시(오류 포함) 해제된다.
    async fn render_maps(
        &self,
        event: &PullRequestEvent,
        maps: &[String],
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Vec<MapDiff>> {
        let key = &event.key;
        let mut lease = self.repositories.lease(&key.owner, &key.repo, cancel).await?;

        if !lease.contains_commit(&event.base_sha).await? {
            info!(%key, base = %event.base_sha, "base commit missing locally; fetching");
            lease.fetch().await?;
        }
        lease.fetch_revision(&event.head_ref()).await?;

        reset_dir(output_dir).await?;

        let pipeline = DiffPipeline {
            renderer: self.renderer,
            regions: self.regions,
        };

        let mut diffs = Vec::new();
        for (index, map) in maps.iter().enumerate() {
            ensure_not_cancelled(cancel)?;

            lease.checkout(&event.base_sha).await?;
            let map_path = lease.working_dir().join(map);
            let before = snapshot_before(&map_path).await?;

            lease.merge(&event.head_sha).await?;
            let after = exists(&map_path).await?.then(|| map_path.clone());

            if before.is_none() && after.is_none() {
                warn!(%key, %map, "map missing on both revisions; skipping");
                continue;
            }

            let diff = pipeline
                .generate_diff(
                    before.as_deref(),
                    after.as_deref(),
                    lease.working_dir(),
                    &output_dir.join(index.to_string()),
                    cancel,
                )
                .await
                .with_context(|| format!("failed to render {map}"))?;
            diffs.push(diff);
        }

        Ok(diffs)
    }
}

fn ensure_not_cancelled(cancel: &CancellationToken) -> Result<()> {
    if cancel.is_cancelled() {
        return Err(Cancelled.into());
    }
    Ok(())
}

async fn exists(path: &Path) -> Result<bool> {
    tokio::fs::try_exists(path)
        .await
        .with_context(|| format!("failed to stat {}", path.display()))
}

/// base 리비전에 파일이 있으면 옆에 복사해 두고 그 경로를 반환한다.
async fn snapshot_before(map_path: &Path) -> Result<Option<PathBuf>> {
    if !exists(map_path).await? {
        return Ok(None);
    }
    let name = before_snapshot_name(map_path)
        .with_context(|| format!("invalid map path {}", map_path.display()))?;
    let snapshot = map_path.with_file_name(name);
    tokio::fs::copy(map_path, &snapshot)
        .await
        .with_context(|| format!("failed to snapshot {}", map_path.display()))?;
    Ok(Some(snapshot))
}

/// 이전 실행의 산출물이 섞이지 않도록 지우고 다시 만든다.
async fn reset_dir(dir: &Path) -> Result<()> {
    match tokio::fs::remove_dir_all(dir).await {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => {
            return Err(err).with_context(|| format!("failed to clear {}", dir.display()));
        }
    }
    tokio::fs::create_dir_all(dir)
        .await
        .with_context(|| format!("failed to create {}", dir.display()))
}
