//! 취소 가능한 외부 프로세스 실행기.
//!
//! stdout/stderr를 동시에 끝까지 읽고, 종료 또는 취소 중 먼저 오는 쪽을 기다린다.
//! 취소되면 자식 프로세스를 kill한 뒤 회수한다.

use std::io;
use std::process::{ExitStatus, Stdio};

use tokio::io::AsyncReadExt;
use tokio::process::{Child, ChildStderr, ChildStdout, Command};
use tokio_util::sync::CancellationToken;

#[derive(Debug)]
pub struct CapturedOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl CapturedOutput {
    /// 진단용으로 stdout과 stderr를 합친 텍스트.
    pub fn combined(&self) -> String {
        match (self.stdout.trim(), self.stderr.trim()) {
            ("", "") => String::new(),
            (out, "") => out.to_string(),
            ("", err) => err.to_string(),
            (out, err) => format!("{out}\n{err}"),
        }
    }
}

/// 명령을 실행해 출력을 수집한다. 취소되면 `Ok(None)`.
pub async fn run_captured(
    mut command: Command,
    cancel: &CancellationToken,
) -> io::Result<Option<CapturedOutput>> {
    if cancel.is_cancelled() {
        return Ok(None);
    }

    command
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let mut child = command.spawn()?;
    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| io::Error::other("child stdout was not captured"))?;
    let stderr = child
        .stderr
        .take()
        .ok_or_else(|| io::Error::other("child stderr was not captured"))?;

    let finished = tokio::select! {
        result = collect(&mut child, stdout, stderr) => Some(result),
        _ = cancel.cancelled() => None,
    };

    match finished {
        Some(result) => result.map(Some),
        None => {
            let _ = child.start_kill();
            let _ = child.wait().await;
            Ok(None)
        }
    }
}

async fn collect(
    child: &mut Child,
    mut stdout: ChildStdout,
    mut stderr: ChildStderr,
) -> io::Result<CapturedOutput> {
    let mut out = Vec::new();
    let mut err = Vec::new();
    let (read_out, read_err) = tokio::join!(
        stdout.read_to_end(&mut out),
        stderr.read_to_end(&mut err)
    );
    read_out?;
    read_err?;

    let status = child.wait().await?;
    Ok(CapturedOutput {
        status,
        stdout: String::from_utf8_lossy(&out).into_owned(),
        stderr: String::from_utf8_lossy(&err).into_owned(),
    })
}
