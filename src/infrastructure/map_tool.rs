//! 외부 맵 렌더 도구(dmm-tools minimap) 실행기.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use crate::application::ports::MapRenderer;
use crate::domain::errors::ToolExecutionError;
use crate::domain::map_diff::DiffRegion;
use crate::infrastructure::config::RenderCommandSpec;
use crate::infrastructure::process::run_captured;

/// 도구가 산출물 파일명 바로 앞에 출력하는 토큰.
const SAVING_MARKER: &str = "saving";
const ARTIFACT_EXTENSION: &str = ".png";

pub struct MapToolRenderer {
    spec: RenderCommandSpec,
}

impl MapToolRenderer {
    pub fn new(spec: RenderCommandSpec) -> Self {
        Self { spec }
    }
}

/// 렌더 도구 인자를 구성한다.
///
/// 영역이 있으면 `--min <minX>,<maxX> --max <maxX>,<maxY>` 순서를 그대로 따른다.
/// 두 번째 자리에 maxX가 두 번 들어가는 것은 기존 도구 호출 규약이다.
pub fn render_args(region: Option<DiffRegion>, map: &Path) -> Vec<String> {
    let mut args = Vec::new();
    if let Some(r) = region {
        args.push("--min".to_string());
        args.push(format!("{},{}", r.min_x, r.max_x));
        args.push("--max".to_string());
        args.push(format!("{},{}", r.max_x, r.max_y));
    }
    args.push("--disable".to_string());
    args.push("hide-space".to_string());
    args.push("--minimap".to_string());
    args.push(map.display().to_string());
    args
}

/// stdout에서 `saving <file>.png` 패턴을 찾아 파일명을 반환한다.
pub fn parse_saved_artifact(stdout: &str) -> Option<&str> {
    let tokens: Vec<&str> = stdout.split_whitespace().collect();
    tokens
        .windows(2)
        .find(|pair| pair[0] == SAVING_MARKER && pair[1].ends_with(ARTIFACT_EXTENSION))
        .map(|pair| pair[1])
}

#[async_trait]
impl MapRenderer for MapToolRenderer {
    async fn render(
        &self,
        map: &Path,
        region: Option<DiffRegion>,
        working_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ToolExecutionError> {
        let mut cmd = Command::new(&self.spec.command);
        cmd.args(&self.spec.args)
            .args(render_args(region, map))
            .current_dir(working_dir);

        debug!(map = %map.display(), ?region, "running render tool");
        let output = run_captured(cmd, cancel)
            .await
            .map_err(|source| ToolExecutionError::Spawn {
                command: self.spec.command.clone(),
                source,
            })?
            .ok_or(ToolExecutionError::Cancelled)?;

        if !output.status.success() {
            return Err(ToolExecutionError::Failed {
                status: output.status.to_string(),
                output: output.combined(),
            });
        }

        let artifact =
            parse_saved_artifact(&output.stdout).ok_or_else(|| ToolExecutionError::MissingArtifact {
                output: output.combined(),
            })?;

        Ok(working_dir.join(artifact))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_map_arguments() {
        assert_eq!(
            render_args(None, Path::new("_maps/box.dmm")),
            vec!["--disable", "hide-space", "--minimap", "_maps/box.dmm"]
        );
    }

    #[test]
    fn bounded_arguments_reuse_max_x() {
        let region = DiffRegion {
            min_x: 1,
            max_x: 20,
            min_y: 3,
            max_y: 40,
        };
        assert_eq!(
            render_args(Some(region), Path::new("box.dmm")),
            vec![
                "--min", "1,20", "--max", "20,40", "--disable", "hide-space", "--minimap",
                "box.dmm"
            ]
        );
    }

    #[test]
    fn finds_saved_artifact() {
        assert_eq!(
            parse_saved_artifact("loading box.dmm\nsaving out.png\ndone"),
            Some("out.png")
        );
        assert_eq!(
            parse_saved_artifact("saving data/minimaps/box-1.png"),
            Some("data/minimaps/box-1.png")
        );
    }

    #[test]
    fn missing_or_malformed_marker_is_none() {
        assert_eq!(parse_saved_artifact("rendered out.png"), None);
        assert_eq!(parse_saved_artifact("saving out.jpg"), None);
        assert_eq!(parse_saved_artifact("out.png saving"), None);
        assert_eq!(parse_saved_artifact(""), None);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_carries_output() {
        let renderer = MapToolRenderer::new(RenderCommandSpec {
            command: "sh".into(),
            args: vec!["-c".into(), "echo broken map; exit 2".into(), "sh".into()],
        });
        let dir = tempfile::tempdir().unwrap();
        let err = renderer
            .render(Path::new("box.dmm"), None, dir.path(), &CancellationToken::new())
            .await
            .unwrap_err();

        match err {
            ToolExecutionError::Failed { output, .. } => assert!(output.contains("broken map")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn resolves_artifact_against_working_dir() {
        let renderer = MapToolRenderer::new(RenderCommandSpec {
            command: "sh".into(),
            args: vec!["-c".into(), "echo saving minimap.png".into(), "sh".into()],
        });
        let dir = tempfile::tempdir().unwrap();
        let artifact = renderer
            .render(Path::new("box.dmm"), None, dir.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(artifact, dir.path().join("minimap.png"));
    }
}
