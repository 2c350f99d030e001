//! GitHub API 연동 구현.

use anyhow::{Context, Result};
use async_trait::async_trait;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};
use reqwest::{Client, Method, RequestBuilder};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use super::VcsProvider;
use crate::domain::pull_request::{ChangedFile, PullRequestInfo, ReviewComment};

/// URL 경로 세그먼트에서 이스케이프할 문자.
const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'/')
    .add(b'?')
    .add(b'%');

const FILES_PER_PAGE: usize = 100;

pub struct GitHubClient {
    client: Client,
    owner: String,
    repo: String,
    number: u64,
    token: Option<String>,
    api_base: Option<String>,
}

impl GitHubClient {
    /// GitHub 대상 클라이언트를 생성한다.
    pub fn new(
        owner: String,
        repo: String,
        number: u64,
        token: Option<String>,
        api_base: Option<String>,
    ) -> Self {
        Self {
            client: Client::new(),
            owner,
            repo,
            number,
            token,
            api_base,
        }
    }

    fn api_base(&self) -> String {
        self.api_base
            .as_deref()
            .map(|base| base.trim_end_matches('/').to_string())
            .unwrap_or_else(|| "https://api.github.com".to_string())
    }

    fn repo_endpoint(&self) -> String {
        format!(
            "{}/repos/{}/{}",
            self.api_base(),
            utf8_percent_encode(&self.owner, SEGMENT),
            utf8_percent_encode(&self.repo, SEGMENT)
        )
    }

    fn pulls_endpoint(&self) -> String {
        format!("{}/pulls/{}", self.repo_endpoint(), self.number)
    }

    fn issue_comments_endpoint(&self) -> String {
        format!("{}/issues/{}/comments", self.repo_endpoint(), self.number)
    }

    fn issue_comment_endpoint(&self, comment_id: &str) -> String {
        format!(
            "{}/issues/comments/{}",
            self.repo_endpoint(),
            utf8_percent_encode(comment_id, SEGMENT)
        )
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        // 공통 헤더/인증 적용.
        let req = self
            .client
            .request(method, url)
            .header("User-Agent", "mapdiffbot")
            .header("Accept", "application/vnd.github+json");

        if let Some(token) = &self.token {
            req.bearer_auth(token)
        } else {
            req
        }
    }

    async fn send<T: DeserializeOwned>(&self, action: &str, request: RequestBuilder) -> Result<T> {
        let resp = request
            .send()
            .await
            .with_context(|| format!("github: failed to {action}"))?;

        let status = resp.status();
        let body = resp
            .text()
            .await
            .with_context(|| format!("github: failed to read {action} body"))?;

        if !status.is_success() {
            anyhow::bail!("github: failed to {action} ({status}): {body}");
        }

        serde_json::from_str(&body).with_context(|| format!("github: invalid {action} JSON"))
    }
}

#[derive(Debug, Deserialize)]
struct PullResponse {
    mergeable: Option<bool>,
    base: CommitRef,
    head: CommitRef,
}

#[derive(Debug, Deserialize)]
struct CommitRef {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct PullFileResponse {
    filename: String,
    status: String,
}

#[derive(Debug, Deserialize)]
struct IssueCommentResponse {
    id: u64,
    #[serde(default)]
    body: String,
}

impl From<IssueCommentResponse> for ReviewComment {
    fn from(c: IssueCommentResponse) -> Self {
        ReviewComment {
            id: c.id.to_string(),
            body: c.body,
        }
    }
}

#[async_trait]
impl VcsProvider for GitHubClient {
    async fn fetch_pull_request(&self) -> Result<PullRequestInfo> {
        let pr: PullResponse = self
            .send("fetch PR", self.request(Method::GET, self.pulls_endpoint()))
            .await?;

        Ok(PullRequestInfo {
            mergeable: pr.mergeable,
            base_sha: pr.base.sha,
            head_sha: pr.head.sha,
        })
    }

    async fn list_changed_files(&self) -> Result<Vec<ChangedFile>> {
        // 페이지가 가득 차지 않을 때까지 순회한다.
        let mut files = Vec::new();
        let mut page = 1;
        loop {
            let url = format!(
                "{}/files?per_page={FILES_PER_PAGE}&page={page}",
                self.pulls_endpoint()
            );
            let batch: Vec<PullFileResponse> = self
                .send("list PR files", self.request(Method::GET, url))
                .await?;
            let len = batch.len();
            files.extend(batch.into_iter().map(|f| ChangedFile {
                path: f.filename,
                status: f.status,
            }));
            if len < FILES_PER_PAGE {
                break;
            }
            page += 1;
        }
        Ok(files)
    }

    async fn list_comments(&self) -> Result<Vec<ReviewComment>> {
        let url = format!("{}?per_page=100", self.issue_comments_endpoint());
        let comments: Vec<IssueCommentResponse> = self
            .send("list comments", self.request(Method::GET, url))
            .await?;
        Ok(comments.into_iter().map(Into::into).collect())
    }

    async fn create_comment(&self, body: &str) -> Result<ReviewComment> {
        let comment: IssueCommentResponse = self
            .send(
                "create comment",
                self.request(Method::POST, self.issue_comments_endpoint())
                    .json(&json!({ "body": body })),
            )
            .await?;
        Ok(comment.into())
    }

    async fn update_comment(&self, comment_id: &str, body: &str) -> Result<ReviewComment> {
        let comment: IssueCommentResponse = self
            .send(
                "update comment",
                self.request(Method::PATCH, self.issue_comment_endpoint(comment_id))
                    .json(&json!({ "body": body })),
            )
            .await?;
        Ok(comment.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_use_configured_base() {
        let client = GitHubClient::new(
            "space".into(),
            "station".into(),
            7,
            None,
            Some("https://ghe.example/api/v3/".into()),
        );
        assert_eq!(
            client.pulls_endpoint(),
            "https://ghe.example/api/v3/repos/space/station/pulls/7"
        );
        assert_eq!(
            client.issue_comment_endpoint("99"),
            "https://ghe.example/api/v3/repos/space/station/issues/comments/99"
        );
    }

    #[test]
    fn defaults_to_public_api() {
        let client = GitHubClient::new("a b".into(), "r".into(), 1, None, None);
        assert_eq!(
            client.issue_comments_endpoint(),
            "https://api.github.com/repos/a%20b/r/issues/1/comments"
        );
    }
}
