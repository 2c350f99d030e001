//! 산출물 업로드와 집계 코멘트 게시 단계.

use std::path::Path;

use anyhow::{Context, Result, bail};
use futures::future::try_join_all;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::application::ports::VcsGateway;
use crate::application::usecases::rolling_build::RollingBuildUseCase;
use crate::domain::errors::Cancelled;
use crate::domain::map_diff::{MapDiff, MapDiffStatus, RenderedMapDiff};
use crate::domain::policy::find_bot_comment;

/// 업로드 전 행 구성. 이미지 칸은 업로드 결과 목록의 인덱스를 가리킨다.
struct RowTemplate<'a> {
    name: &'a str,
    before: Option<usize>,
    after: Option<usize>,
    status: MapDiffStatus,
}

fn queue_upload<'a>(uploads: &mut Vec<&'a Path>, path: Option<&'a Path>) -> Option<usize> {
    let path = path?;
    uploads.push(path);
    Some(uploads.len() - 1)
}

/// 업로드 전에 산출물이 모두 있는지 확인한다. stat 자체의 실패는 그대로 전달한다.
async fn ensure_artifacts_exist(paths: &[&Path]) -> Result<()> {
    for path in paths {
        let exists = tokio::fs::try_exists(path)
            .await
            .with_context(|| format!("failed to stat rendered artifact {}", path.display()))?;
        if !exists {
            bail!("rendered artifact is missing: {}", path.display());
        }
    }
    Ok(())
}

/// 모든 산출물을 한꺼번에 업로드하고, 기존 봇 코멘트를 교체(없으면 생성)한다.
pub(super) async fn publish_map_diffs(
    use_case: &RollingBuildUseCase<'_>,
    vcs: &dyn VcsGateway,
    diffs: &[MapDiff],
    credentials: &str,
    cancel: &CancellationToken,
) -> Result<String> {
    let mut uploads: Vec<&Path> = Vec::new();
    let mut templates = Vec::with_capacity(diffs.len());

    for diff in diffs {
        let status = diff
            .status()
            .with_context(|| format!("map diff '{}' has no artifacts", diff.name))?;
        let before = queue_upload(&mut uploads, diff.before.as_deref());
        let after = queue_upload(&mut uploads, diff.after.as_deref());
        templates.push(RowTemplate {
            name: &diff.name,
            before,
            after,
            status,
        });
    }

    ensure_artifacts_exist(&uploads).await?;

    let urls = try_join_all(
        uploads
            .iter()
            .map(|path| use_case.uploader.upload(path, credentials, cancel)),
    )
    .await
    .context("failed to upload rendered maps")?;

    let rows: Vec<RenderedMapDiff> = templates
        .into_iter()
        .map(|t| RenderedMapDiff {
            name: t.name.to_string(),
            before_url: t.before.map(|i| urls[i].clone()),
            after_url: t.after.map(|i| urls[i].clone()),
            status: t.status,
        })
        .collect();
    let body = use_case.markdown.render_map_diffs(&rows);

    if cancel.is_cancelled() {
        return Err(Cancelled.into());
    }

    let existing = vcs.list_comments().await?;
    let posted = match find_bot_comment(&existing) {
        Some(comment) => {
            info!(comment_id = %comment.id, "updating map diff comment");
            vcs.update_comment(&comment.id, &body).await?
        }
        None => {
            info!("creating map diff comment");
            vcs.create_comment(&body).await?
        }
    };

    Ok(posted.id)
}
