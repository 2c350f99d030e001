//! 파일 한 쌍을 렌더링해 diff 레코드로 만드는 파이프라인.

use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MapRenderer, RegionCalculator};
use crate::domain::errors::ToolExecutionError;
use crate::domain::map_diff::{DiffRegion, MapDiff};
use crate::domain::policy::artifact_stem;

pub struct DiffPipeline<'a> {
    pub renderer: &'a dyn MapRenderer,
    pub regions: &'a dyn RegionCalculator,
}

impl DiffPipeline<'_> {
    /// 있는 쪽만 렌더링하고 산출물을 `output_dir`로 옮긴다.
    /// 두 렌더링은 동시에 실행되며, 한쪽이 실패하면 다른 쪽 프로세스도 정리된다.
    pub async fn generate_diff(
        &self,
        before: Option<&Path>,
        after: Option<&Path>,
        working_dir: &Path,
        output_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<MapDiff> {
        let name = artifact_stem(before, after).context("no map file to render")?;
        let region = self.regions.calculate(before, after);

        let (rendered_before, rendered_after) = tokio::try_join!(
            self.render_side(before, region, working_dir, cancel),
            self.render_side(after, region, working_dir, cancel),
        )?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .with_context(|| format!("failed to create {}", output_dir.display()))?;

        let before = match rendered_before {
            Some(src) => {
                Some(relocate(&src, &output_dir.join(format!("{name}.before.png"))).await?)
            }
            None => None,
        };
        let after = match rendered_after {
            Some(src) => Some(relocate(&src, &output_dir.join(format!("{name}.after.png"))).await?),
            None => None,
        };

        Ok(MapDiff::new(name, before, after))
    }

    async fn render_side(
        &self,
        map: Option<&Path>,
        region: Option<DiffRegion>,
        working_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<Option<PathBuf>, ToolExecutionError> {
        match map {
            Some(map) => self
                .renderer
                .render(map, region, working_dir, cancel)
                .await
                .map(Some),
            None => Ok(None),
        }
    }
}

/// 같은 파일시스템이면 rename, 아니면 복사 후 삭제한다.
async fn relocate(src: &Path, dst: &Path) -> Result<PathBuf> {
    if tokio::fs::rename(src, dst).await.is_err() {
        tokio::fs::copy(src, dst).await.with_context(|| {
            format!("failed to move {} to {}", src.display(), dst.display())
        })?;
        match tokio::fs::remove_file(src).await {
            Ok(()) => {}
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => {
                return Err(err).with_context(|| format!("failed to remove {}", src.display()));
            }
        }
    }
    Ok(dst.to_path_buf())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::domain::map_diff::MapDiffStatus;

    /// 맵 이름을 본뜬 png를 작업 디렉터리에 쓰는 렌더러.
    #[derive(Default)]
    struct WritingRenderer {
        calls: Mutex<Vec<PathBuf>>,
        fail_on: Option<&'static str>,
    }

    #[async_trait]
    impl MapRenderer for WritingRenderer {
        async fn render(
            &self,
            map: &Path,
            _region: Option<DiffRegion>,
            working_dir: &Path,
            _cancel: &CancellationToken,
        ) -> Result<PathBuf, ToolExecutionError> {
            self.calls.lock().unwrap().push(map.to_path_buf());
            let stem = map.file_stem().unwrap().to_string_lossy().into_owned();
            if self.fail_on == Some(stem.as_str()) {
                return Err(ToolExecutionError::MissingArtifact {
                    output: "no saving line".into(),
                });
            }
            let artifact = working_dir.join(format!("{stem}-1.png"));
            std::fs::write(&artifact, stem.as_bytes())?;
            Ok(artifact)
        }
    }

    struct NoRegion;

    impl RegionCalculator for NoRegion {
        fn calculate(&self, _: Option<&Path>, _: Option<&Path>) -> Option<DiffRegion> {
            None
        }
    }

    #[tokio::test]
    async fn renders_both_sides_and_names_by_shorter_stem() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let before = work.path().join("box.before.dmm");
        let after = work.path().join("box.dmm");

        let renderer = WritingRenderer::default();
        let pipeline = DiffPipeline {
            renderer: &renderer,
            regions: &NoRegion,
        };
        let diff = pipeline
            .generate_diff(
                Some(&before),
                Some(&after),
                work.path(),
                out.path(),
                &CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(diff.name, "box");
        assert_eq!(diff.status(), Some(MapDiffStatus::Modified));
        let before_png = diff.before.unwrap();
        let after_png = diff.after.unwrap();
        assert_eq!(before_png, out.path().join("box.before.png"));
        assert_eq!(after_png, out.path().join("box.after.png"));
        assert_eq!(std::fs::read_to_string(before_png).unwrap(), "box.before");
        assert_eq!(std::fs::read_to_string(after_png).unwrap(), "box");
        assert!(!work.path().join("box-1.png").exists());
        assert_eq!(renderer.calls.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn created_map_renders_after_only() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let after = work.path().join("new.dmm");

        let renderer = WritingRenderer::default();
        let pipeline = DiffPipeline {
            renderer: &renderer,
            regions: &NoRegion,
        };
        let diff = pipeline
            .generate_diff(None, Some(&after), work.path(), out.path(), &CancellationToken::new())
            .await
            .unwrap();

        assert!(diff.before.is_none());
        assert_eq!(diff.status(), Some(MapDiffStatus::Created));
        assert_eq!(renderer.calls.lock().unwrap().as_slice(), &[after]);
    }

    #[tokio::test]
    async fn tool_failure_fails_the_diff() {
        let work = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let renderer = WritingRenderer {
            fail_on: Some("box"),
            ..Default::default()
        };
        let pipeline = DiffPipeline {
            renderer: &renderer,
            regions: &NoRegion,
        };

        let err = pipeline
            .generate_diff(
                None,
                Some(&work.path().join("box.dmm")),
                work.path(),
                out.path(),
                &CancellationToken::new(),
            )
            .await
            .unwrap_err();
        assert!(format!("{err:#}").contains("no saving line"));
    }

    #[tokio::test]
    async fn nothing_to_render_is_an_error() {
        let work = tempfile::tempdir().unwrap();
        let renderer = WritingRenderer::default();
        let pipeline = DiffPipeline {
            renderer: &renderer,
            regions: &NoRegion,
        };
        assert!(
            pipeline
                .generate_diff(None, None, work.path(), work.path(), &CancellationToken::new())
                .await
                .is_err()
        );
    }
}
