//! git CLI 기반 로컬 미러 관리자.
//!
//! 저장소마다 미러 하나를 `<root>/<owner>/<name>`에 두고 재사용한다.
//! 임대는 저장소별 `tokio::sync::Mutex`로 직렬화되며, 대기 순서는 FIFO다.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::process::Command;
use tokio::sync::{Mutex as AsyncMutex, OwnedMutexGuard};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};
use url::Url;

use crate::application::ports::{RepositoryLease, RepositoryManager};
use crate::domain::errors::RepositoryError;
use crate::infrastructure::process::{CapturedOutput, run_captured};

const GIT_USER_NAME: &str = "mapdiffbot";
const GIT_USER_EMAIL: &str = "mapdiffbot@users.noreply.github.com";

type Slot = Arc<AsyncMutex<()>>;

pub struct GitRepositoryManager {
    root: PathBuf,
    clone_base: Url,
    slots: Mutex<HashMap<(String, String), Slot>>,
}

impl GitRepositoryManager {
    /// `clone_base`는 `https://github.com` 같은 owner/name 앞부분이다.
    pub fn new(root: impl Into<PathBuf>, clone_base: &str) -> Result<Self> {
        let base = format!("{}/", clone_base.trim_end_matches('/'));
        let clone_base =
            Url::parse(&base).with_context(|| format!("invalid clone base URL: {clone_base}"))?;
        Ok(Self {
            root: root.into(),
            clone_base,
            slots: Mutex::new(HashMap::new()),
        })
    }

    fn slot(&self, owner: &str, name: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(PoisonError::into_inner);
        slots
            .entry((owner.to_string(), name.to_string()))
            .or_default()
            .clone()
    }

    fn remote_url(&self, owner: &str, name: &str) -> Result<String, RepositoryError> {
        self.clone_base
            .join(&format!("{owner}/{name}.git"))
            .map(String::from)
            .map_err(|err| RepositoryError::Command {
                command: "remote url".to_string(),
                status: "invalid".to_string(),
                output: err.to_string(),
            })
    }
}

#[async_trait]
impl RepositoryManager for GitRepositoryManager {
    async fn lease(
        &self,
        owner: &str,
        name: &str,
        cancel: &CancellationToken,
    ) -> Result<Box<dyn RepositoryLease>, RepositoryError> {
        let remote = self.remote_url(owner, name)?;
        let slot = self.slot(owner, name);

        let guard = tokio::select! {
            guard = slot.lock_owned() => guard,
            _ = cancel.cancelled() => return Err(RepositoryError::Cancelled),
        };
        debug!(owner, name, "repository leased");

        Ok(Box::new(GitLease {
            _guard: guard,
            path: self.root.join(owner).join(name),
            remote,
            cancel: cancel.clone(),
            initialized: false,
        }))
    }
}

/// 임대 핸들. drop 시 mutex guard가 풀리며 다음 대기자에게 넘어간다.
struct GitLease {
    _guard: OwnedMutexGuard<()>,
    path: PathBuf,
    remote: String,
    cancel: CancellationToken,
    initialized: bool,
}

impl GitLease {
    async fn ensure_initialized(&mut self) -> Result<(), RepositoryError> {
        if self.initialized {
            return Ok(());
        }
        let git_dir = self.path.join(".git");
        if git_dir.exists() {
            // 취소로 kill된 이전 git이 남긴 잠금 파일. 임대는 배타적이므로 지금 살아 있는 git은 없다.
            for lock in remove_stale_locks(&git_dir)? {
                warn!(lock = %lock.display(), "removed stale git lock");
            }
        } else {
            tokio::fs::create_dir_all(&self.path).await?;
            self.git(&["init", "--quiet"]).await?;
            let remote = self.remote.clone();
            self.git(&["remote", "add", "origin", &remote]).await?;
        }
        self.initialized = true;
        Ok(())
    }

    async fn run(&self, args: &[&str]) -> Result<CapturedOutput, RepositoryError> {
        let mut cmd = Command::new("git");
        cmd.args(["-c", &format!("user.name={GIT_USER_NAME}")])
            .args(["-c", &format!("user.email={GIT_USER_EMAIL}")])
            .args(args)
            .current_dir(&self.path)
            .env("GIT_TERMINAL_PROMPT", "0");

        run_captured(cmd, &self.cancel)
            .await?
            .ok_or(RepositoryError::Cancelled)
    }

    async fn git(&self, args: &[&str]) -> Result<CapturedOutput, RepositoryError> {
        let output = self.run(args).await?;
        if !output.status.success() {
            return Err(RepositoryError::Command {
                command: args.join(" "),
                status: output.status.to_string(),
                output: output.combined(),
            });
        }
        Ok(output)
    }

    async fn has_unmerged_paths(&self) -> Result<bool, RepositoryError> {
        let output = self.git(&["diff", "--name-only", "--diff-filter=U"]).await?;
        Ok(!output.stdout.trim().is_empty())
    }
}

#[async_trait]
impl RepositoryLease for GitLease {
    fn working_dir(&self) -> &Path {
        &self.path
    }

    async fn fetch(&mut self) -> Result<(), RepositoryError> {
        self.ensure_initialized().await?;
        self.git(&["fetch", "--quiet", "--prune", "origin"]).await?;
        Ok(())
    }

    async fn fetch_revision(&mut self, reference: &str) -> Result<(), RepositoryError> {
        // 지정한 ref 하나만 가져온다.
        self.ensure_initialized().await?;
        self.git(&["fetch", "--quiet", "origin", reference]).await?;
        Ok(())
    }

    async fn contains_commit(&mut self, sha: &str) -> Result<bool, RepositoryError> {
        self.ensure_initialized().await?;
        let object = format!("{sha}^{{commit}}");
        let output = self.run(&["cat-file", "-e", &object]).await?;
        Ok(output.status.success())
    }

    async fn checkout(&mut self, sha: &str) -> Result<(), RepositoryError> {
        self.ensure_initialized().await?;
        if self.path.join(".git").join("MERGE_HEAD").exists() {
            self.git(&["reset", "--hard", "--quiet"]).await?;
        }
        self.git(&["checkout", "--force", "--quiet", "--detach", sha])
            .await?;
        self.git(&["reset", "--hard", "--quiet", sha]).await?;
        self.git(&["clean", "-ffdxq"]).await?;
        Ok(())
    }

    async fn merge(&mut self, sha: &str) -> Result<(), RepositoryError> {
        self.ensure_initialized().await?;
        let output = self
            .run(&["merge", "--no-edit", "--no-ff", "--quiet", sha])
            .await?;
        if output.status.success() {
            return Ok(());
        }

        let combined = output.combined();
        if combined.contains("CONFLICT") || self.has_unmerged_paths().await? {
            match self.run(&["merge", "--abort"]).await {
                Ok(abort) if !abort.status.success() => {
                    debug!(%sha, output = %abort.combined(), "merge --abort failed");
                }
                Err(err) => debug!(%sha, "merge --abort failed: {err}"),
                Ok(_) => {}
            }
            return Err(RepositoryError::MergeConflict {
                sha: sha.to_string(),
                output: combined,
            });
        }

        Err(RepositoryError::Command {
            command: format!("merge {sha}"),
            status: output.status.to_string(),
            output: combined,
        })
    }
}

/// `.git` 바로 아래와 `refs/` 아래의 `*.lock` 파일을 지우고 지운 경로를 돌려준다.
/// `objects/`는 크기가 커서 훑지 않는다.
fn remove_stale_locks(git_dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut removed = Vec::new();
    collect_locks(git_dir, false, &mut removed)?;
    let refs = git_dir.join("refs");
    if refs.is_dir() {
        collect_locks(&refs, true, &mut removed)?;
    }
    for lock in &removed {
        match std::fs::remove_file(lock) {
            Ok(()) => {}
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
            Err(err) => return Err(err),
        }
    }
    Ok(removed)
}

fn collect_locks(dir: &Path, recursive: bool, out: &mut Vec<PathBuf>) -> std::io::Result<()> {
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        let file_type = entry.file_type()?;
        if file_type.is_dir() {
            if recursive {
                collect_locks(&path, true, out)?;
            }
        } else if path.extension().is_some_and(|ext| ext == "lock") {
            out.push(path);
        }
    }
    Ok(())
}
