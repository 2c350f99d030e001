//! 호스팅 API가 돌려주는 PR 메타데이터/코멘트 값 객체.

#[derive(Debug, Clone)]
pub struct ReviewComment {
    pub id: String,
    pub body: String,
}

/// 호스팅 API 기준 PR 상태.
#[derive(Debug, Clone)]
pub struct PullRequestInfo {
    /// null이면 GitHub이 아직 병합 가능 여부를 계산 중이다.
    pub mergeable: Option<bool>,
    pub base_sha: String,
    pub head_sha: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangedFile {
    pub path: String,
    pub status: String,
}
