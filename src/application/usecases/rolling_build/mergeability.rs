//! PR 병합 가능 여부 확인 단계.

use std::time::Duration;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::ports::VcsGateway;
use crate::domain::errors::Cancelled;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Mergeability {
    Mergeable,
    NotMergeable,
    Unknown,
}

impl From<bool> for Mergeability {
    fn from(value: bool) -> Self {
        if value {
            Self::Mergeable
        } else {
            Self::NotMergeable
        }
    }
}

/// 페이로드 값이 미정이면 `retries`번까지 `delay` 간격으로 다시 조회한다.
pub(super) async fn resolve_mergeability(
    initial: Option<bool>,
    vcs: &dyn VcsGateway,
    retries: u32,
    delay: Duration,
    cancel: &CancellationToken,
) -> Result<Mergeability> {
    if let Some(value) = initial {
        return Ok(value.into());
    }

    for attempt in 1..=retries {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(Cancelled.into()),
            _ = tokio::time::sleep(delay) => {}
        }

        let info = vcs.fetch_pull_request().await?;
        if let Some(value) = info.mergeable {
            return Ok(value.into());
        }
        debug!(attempt, retries, "mergeability still unknown");
    }

    Ok(Mergeability::Unknown)
}
