//! 호스팅 API 추상화 계층.

pub mod github;

use anyhow::Result;
use async_trait::async_trait;

use crate::domain::pull_request::{ChangedFile, PullRequestInfo, ReviewComment};
use crate::domain::target::PullRequestKey;
use crate::infrastructure::config::HostConfig;

#[async_trait]
pub trait VcsProvider: Send + Sync {
    /// PR 병합 가능 여부와 base/head SHA 조회
    async fn fetch_pull_request(&self) -> Result<PullRequestInfo>;
    /// PR에서 변경된 파일 목록
    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>>;
    /// 기존 코멘트 조회
    async fn list_comments(&self) -> Result<Vec<ReviewComment>>;
    /// 코멘트 생성
    async fn create_comment(&self, body: &str) -> Result<ReviewComment>;
    /// 코멘트 수정
    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<ReviewComment>;
}

pub fn build_vcs_client(
    key: &PullRequestKey,
    host_cfg: Option<&HostConfig>,
    token: Option<String>,
) -> Box<dyn VcsProvider> {
    let api_base = host_cfg.and_then(|h| h.api_base.clone());
    Box::new(github::GitHubClient::new(
        key.owner.clone(),
        key.repo.clone(),
        key.number,
        token,
        api_base,
    ))
}
