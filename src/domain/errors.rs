//! 호출자가 구분해야 하는 오류 종류.

use thiserror::Error;

/// 취소 신호로 중단된 작업. 사용자에게 노출되는 실패가 아니다.
#[derive(Debug, Error)]
#[error("operation cancelled")]
pub struct Cancelled;

/// 지원하지 않는 pull_request action.
#[derive(Debug, Error)]
#[error("unsupported pull_request action: {0}")]
pub struct UnsupportedAction(pub String);

#[derive(Debug, Error)]
pub enum RepositoryError {
    #[error("git {command} failed ({status}): {output}")]
    Command {
        command: String,
        status: String,
        output: String,
    },
    #[error("merge of {sha} conflicted: {output}")]
    MergeConflict { sha: String, output: String },
    #[error("repository I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("repository operation cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum ToolExecutionError {
    #[error("failed to spawn render tool '{command}': {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
    #[error("render tool exited with {status}: {output}")]
    Failed { status: String, output: String },
    #[error("render tool output did not name a .png artifact: {output}")]
    MissingArtifact { output: String },
    #[error("render tool I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("render cancelled")]
    Cancelled,
}

/// 오류 체인 어딘가에 취소가 있으면 true.
pub fn is_cancellation(err: &anyhow::Error) -> bool {
    err.chain().any(|cause| {
        cause.is::<Cancelled>()
            || matches!(
                cause.downcast_ref::<RepositoryError>(),
                Some(RepositoryError::Cancelled)
            )
            || matches!(
                cause.downcast_ref::<ToolExecutionError>(),
                Some(ToolExecutionError::Cancelled)
            )
    })
}

#[cfg(test)]
mod tests {
    use anyhow::Context;

    use super::*;

    #[test]
    fn detects_cancellation_through_context() {
        let err = Err::<(), _>(ToolExecutionError::Cancelled)
            .context("rendering after")
            .unwrap_err();
        assert!(is_cancellation(&err));

        let err = anyhow::Error::new(Cancelled).context("uploading");
        assert!(is_cancellation(&err));

        let err = anyhow::Error::new(RepositoryError::MergeConflict {
            sha: "abc".into(),
            output: "CONFLICT".into(),
        });
        assert!(!is_cancellation(&err));
    }
}
