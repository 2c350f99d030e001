//! 렌더 영역 계산 포트 구현 어댑터.

use std::path::Path;

use crate::application::ports::RegionCalculator;
use crate::domain::map_diff::DiffRegion;

/// 항상 맵 전체를 렌더링하도록 영역을 비워 두는 계산기.
pub struct FullMapRegion;

impl RegionCalculator for FullMapRegion {
    fn calculate(&self, _before: Option<&Path>, _after: Option<&Path>) -> Option<DiffRegion> {
        None
    }
}
