//! 애플리케이션 계층이 의존하는 포트(추상 인터페이스) 모음.

use std::path::{Path, PathBuf};

use anyhow::Result;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

use crate::domain::errors::{RepositoryError, ToolExecutionError};
use crate::domain::map_diff::{DiffRegion, RenderedMapDiff};
use crate::domain::pull_request::{ChangedFile, PullRequestInfo, ReviewComment};
use crate::domain::target::PullRequestKey;
use crate::infrastructure::config::{Config, HostConfig};

/// 설정 로딩/점검을 담당하는 저장소 포트.
pub trait ConfigRepository: Send + Sync {
    fn load(&self) -> Result<Config>;
    fn inspect_pretty_json(&self) -> Result<String>;
}

/// 원격 저장소 호스팅 API(GitHub) 연동 포트.
#[async_trait]
pub trait VcsGateway: Send + Sync {
    async fn fetch_pull_request(&self) -> Result<PullRequestInfo>;
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>>;
    async fn list_comments(&self) -> Result<Vec<ReviewComment>>;
    async fn create_comment(&self, body: &str) -> Result<ReviewComment>;
    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<ReviewComment>;
}

/// PR 대상에 맞는 VCS 게이트웨이를 생성하는 팩토리 포트.
pub trait VcsFactory: Send + Sync {
    fn build(
        &self,
        key: &PullRequestKey,
        host_cfg: Option<&HostConfig>,
        token: Option<String>,
    ) -> Box<dyn VcsGateway>;
}

/// 원격 저장소별 로컬 미러를 관리하는 포트.
/// 같은 (owner, name)에 대해 동시에 하나의 임대만 존재한다.
#[async_trait]
pub trait RepositoryManager: Send + Sync {
    /// 임대가 풀릴 때까지 대기한다. 반환된 핸들을 drop하면 반납된다.
    async fn lease(
        &self,
        owner: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn RepositoryLease>, RepositoryError>;
}

/// 임대 중인 로컬 미러 하나에 대한 배타적 접근.
#[async_trait]
pub trait RepositoryLease: Send {
    fn working_dir(&self) -> &Path;
    async fn fetch(&mut self) -> Result<(), RepositoryError>;
    async fn fetch_revision(&mut self, reference: &str) -> Result<(), RepositoryError>;
    async fn contains_commit(&mut self, sha: &str) -> Result<bool, RepositoryError>;
    /// 머지 상태가 남지 않은 깨끗한 작업 트리로 체크아웃한다.
    async fn checkout(&mut self, sha: &str) -> Result<(), RepositoryError>;
    async fn merge(&mut self, sha: &str) -> Result<(), RepositoryError>;
}

/// 외부 맵 렌더 도구 실행 포트.
#[async_trait]
pub trait MapRenderer: Send + Sync {
    /// 렌더링 후 도구가 저장한 산출물 경로를 반환한다.
    async fn render(
        &self,
        map: &Path,
        region: Option<DiffRegion>,
        working_dir: &Path,
        cancel: &CancellationToken,
    ) -> Result<PathBuf, ToolExecutionError>;
}

/// 두 맵 파일로부터 렌더 영역을 계산하는 포트. None이면 전체 렌더.
pub trait RegionCalculator: Send + Sync {
    fn calculate(&self, before: Option<&Path>, after: Option<&Path>) -> Option<DiffRegion>;
}

/// 이미지 호스팅 업로드 포트.
#[async_trait]
pub trait ImageUploader: Send + Sync {
    /// `credentials`는 `"<id>/<secret>"` 형식이다.
    async fn upload(
        &self,
        path: &Path,
        credentials: &str,
        cancel: &CancellationToken,
    ) -> Result<String>;
}

/// 맵 diff 코멘트 마크다운 렌더링 포트.
pub trait MarkdownRenderer: Send + Sync {
    fn render_map_diffs(&self, rows: &[RenderedMapDiff]) -> String;
}
