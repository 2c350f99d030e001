//! PR 코멘트용 Markdown 렌더링 모듈.

use crate::domain::map_diff::RenderedMapDiff;
use crate::domain::policy::BOT_MARKER;

/// 맵 변경 요약 코멘트 본문을 생성한다.
/// 한쪽 이미지가 없으면 해당 칸을 비워 둔다.
pub fn render_map_diffs_markdown(rows: &[RenderedMapDiff]) -> String {
    let mut out = String::new();
    out.push_str(BOT_MARKER);
    out.push_str("\n<details><summary>Rendered Map Changes</summary>\n\n");
    out.push_str("Map | Old | New | Status\n");
    out.push_str("--- | --- | --- | ---\n");
    for row in rows {
        out.push_str(&format!(
            "{} | {} | {} | {}\n",
            row.name,
            image_cell(row.before_url.as_deref()),
            image_cell(row.after_url.as_deref()),
            row.status
        ));
    }
    out.push_str("\n</details>\n");
    out
}

fn image_cell(url: Option<&str>) -> String {
    url.map(|u| format!("![]({u})")).unwrap_or_default()
}
