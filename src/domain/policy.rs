//! 도메인 정책(봇 코멘트 식별, 맵 파일 판별, 산출물 명명 규칙).

use std::path::Path;

use crate::domain::pull_request::ReviewComment;

/// 봇 코멘트를 식별하는 숨김 마커.
pub const BOT_MARKER: &str = "<!-- mapdiffbot -->";

pub fn find_bot_comment(comments: &[ReviewComment]) -> Option<&ReviewComment> {
    comments.iter().find(|c| c.body.contains(BOT_MARKER))
}

/// 변경 파일 경로가 맵 파일인지 확장자로 판별한다(대소문자 무시).
pub fn is_map_file(path: &str, extension: &str) -> bool {
    let ext = extension.trim_start_matches('.');
    Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(ext))
}

/// 베이스 리비전 파일을 옮겨둘 때 쓰는 이름. 확장자는 유지해야 렌더 도구가 인식한다.
pub fn before_snapshot_name(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_str()?;
    Some(match path.extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{stem}.before.{ext}"),
        None => format!("{stem}.before"),
    })
}

/// 두 입력 파일 중 더 짧은 stem을 산출물 이름으로 쓴다.
/// `foo.before.dmm`와 `foo.dmm`이면 `foo`가 된다.
pub fn artifact_stem(before: Option<&Path>, after: Option<&Path>) -> Option<String> {
    let stem = |p: &Path| p.file_stem().and_then(|s| s.to_str()).map(ToString::to_string);
    match (before.and_then(stem), after.and_then(stem)) {
        (Some(a), Some(b)) => Some(if b.len() <= a.len() { b } else { a }),
        (Some(a), None) => Some(a.trim_end_matches(".before").to_string()),
        (None, Some(b)) => Some(b),
        (None, None) => None,
    }
}
