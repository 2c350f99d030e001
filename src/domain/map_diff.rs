//! 맵 diff 도메인 값 객체.

use std::fmt;
use std::path::PathBuf;

/// 렌더 영역 제한. 없으면 맵 전체를 렌더링한다.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiffRegion {
    pub min_x: u32,
    pub max_x: u32,
    pub min_y: u32,
    pub max_y: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MapDiffStatus {
    Created,
    Modified,
    Deleted,
}

impl MapDiffStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "Created",
            Self::Modified => "Modified",
            Self::Deleted => "Deleted",
        }
    }
}

impl fmt::Display for MapDiffStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 파일 하나에 대한 파이프라인 결과.
/// 상태는 직접 지정하지 않고 채워진 경로로부터 계산한다.
#[derive(Debug, Clone)]
pub struct MapDiff {
    pub name: String,
    pub before: Option<PathBuf>,
    pub after: Option<PathBuf>,
}

impl MapDiff {
    pub fn new(name: impl Into<String>, before: Option<PathBuf>, after: Option<PathBuf>) -> Self {
        Self {
            name: name.into(),
            before,
            after,
        }
    }

    /// 양쪽 모두 없는 레코드는 게시 대상이 아니므로 None.
    pub fn status(&self) -> Option<MapDiffStatus> {
        match (self.before.is_some(), self.after.is_some()) {
            (true, true) => Some(MapDiffStatus::Modified),
            (false, true) => Some(MapDiffStatus::Created),
            (true, false) => Some(MapDiffStatus::Deleted),
            (false, false) => None,
        }
    }
}

/// 업로드 후 코멘트 한 행에 들어갈 값.
#[derive(Debug, Clone)]
pub struct RenderedMapDiff {
    pub name: String,
    pub before_url: Option<String>,
    pub after_url: Option<String>,
    pub status: MapDiffStatus,
}

/// 롤링 빌드 한 번의 결과.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildOutcome {
    Published { comment_id: String, maps: usize },
    NoMapChanges,
    NotMergeable,
    MergeabilityUnknown,
    Cancelled,
}
