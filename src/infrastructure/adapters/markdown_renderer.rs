//! 마크다운 렌더링 포트 구현 어댑터.

use crate::application::ports::MarkdownRenderer;
use crate::domain::map_diff::RenderedMapDiff;
use crate::infrastructure::render;

/// 마크다운 렌더링 어댑터.
pub struct MarkdownRendererAdapter;

impl MarkdownRenderer for MarkdownRendererAdapter {
    fn render_map_diffs(&self, rows: &[RenderedMapDiff]) -> String {
        render::render_map_diffs_markdown(rows)
    }
}
