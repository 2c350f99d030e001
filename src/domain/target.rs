//! pull_request 웹훅 페이로드를 롤링 빌드 대상으로 해석하는 모듈.

use std::fmt;

use anyhow::{Context, Result};
use serde::Deserialize;

/// 롤링 빌드 대상 식별자(owner, repo, PR 번호).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PullRequestKey {
    pub owner: String,
    pub repo: String,
    pub number: u64,
}

impl PullRequestKey {
    pub fn new(owner: impl Into<String>, repo: impl Into<String>, number: u64) -> Self {
        Self {
            owner: owner.into(),
            repo: repo.into(),
            number,
        }
    }
}

impl fmt::Display for PullRequestKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}#{}", self.owner, self.repo, self.number)
    }
}

/// 처리 대상 액션 분류.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventAction {
    Opened,
    Synchronize,
    Other(String),
}

impl EventAction {
    pub fn parse(raw: &str) -> Self {
        match raw {
            "opened" => Self::Opened,
            "synchronize" => Self::Synchronize,
            other => Self::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Opened => "opened",
            Self::Synchronize => "synchronize",
            Self::Other(raw) => raw,
        }
    }
}

/// 디스패처/코디네이터가 사용하는 정규화된 PR 이벤트.
#[derive(Debug, Clone)]
pub struct PullRequestEvent {
    pub action: EventAction,
    pub key: PullRequestKey,
    pub base_sha: String,
    pub head_sha: String,
    /// 페이로드 시점의 mergeable 값. GitHub은 계산 전이면 null을 보낸다.
    pub mergeable: Option<bool>,
}

impl PullRequestEvent {
    /// GitHub `pull_request` 웹훅 JSON을 파싱한다.
    pub fn from_json(raw: &str) -> Result<Self> {
        let payload: WebhookPayload =
            serde_json::from_str(raw).context("invalid pull_request payload JSON")?;
        Ok(payload.into())
    }

    /// PR head 커밋을 가리키는 원격 ref.
    pub fn head_ref(&self) -> String {
        format!("pull/{}/head", self.key.number)
    }
}

#[derive(Debug, Deserialize)]
struct WebhookPayload {
    action: String,
    pull_request: PullPayload,
    repository: RepositoryPayload,
}

#[derive(Debug, Deserialize)]
struct PullPayload {
    number: u64,
    #[serde(default)]
    mergeable: Option<bool>,
    base: CommitPayload,
    head: CommitPayload,
}

#[derive(Debug, Deserialize)]
struct CommitPayload {
    sha: String,
}

#[derive(Debug, Deserialize)]
struct RepositoryPayload {
    name: String,
    owner: OwnerPayload,
}

#[derive(Debug, Deserialize)]
struct OwnerPayload {
    login: String,
}

impl From<WebhookPayload> for PullRequestEvent {
    fn from(payload: WebhookPayload) -> Self {
        Self {
            action: EventAction::parse(&payload.action),
            key: PullRequestKey::new(
                payload.repository.owner.login,
                payload.repository.name,
                payload.pull_request.number,
            ),
            base_sha: payload.pull_request.base.sha,
            head_sha: payload.pull_request.head.sha,
            mergeable: payload.pull_request.mergeable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = r#"{
        "action": "synchronize",
        "number": 42,
        "pull_request": {
            "number": 42,
            "mergeable": null,
            "base": { "sha": "aaa", "ref": "master" },
            "head": { "sha": "bbb", "ref": "feature" }
        },
        "repository": {
            "name": "station",
            "owner": { "login": "space" },
            "clone_url": "https://github.com/space/station.git"
        }
    }"#;

    #[test]
    fn parses_webhook_payload() {
        let event = PullRequestEvent::from_json(PAYLOAD).unwrap();
        assert_eq!(event.action, EventAction::Synchronize);
        assert_eq!(event.key, PullRequestKey::new("space", "station", 42));
        assert_eq!(event.base_sha, "aaa");
        assert_eq!(event.head_sha, "bbb");
        assert_eq!(event.mergeable, None);
        assert_eq!(event.head_ref(), "pull/42/head");
        assert_eq!(event.key.to_string(), "space/station#42");
    }

    #[test]
    fn keys_differ_per_pull_request() {
        let a = PullRequestKey::new("space", "station", 1);
        let b = PullRequestKey::new("space", "station", 2);
        assert_ne!(a, b);
        assert_eq!(a, PullRequestKey::new("space", "station", 1));
    }

    #[test]
    fn unknown_actions_are_kept_verbatim() {
        assert_eq!(EventAction::parse("closed"), EventAction::Other("closed".into()));
        assert_eq!(EventAction::parse("closed").as_str(), "closed");
    }
}
