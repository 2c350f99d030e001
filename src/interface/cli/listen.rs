//! 줄 단위 JSON(NDJSON) 이벤트 수신 루프.
//!
//! 한 줄이 웹훅 페이로드 하나다. 읽는 즉시 처리를 시작하므로 같은 PR의
//! 이벤트가 연달아 오면 앞선 빌드는 롤링 빌드 규칙에 따라 취소된다.

use std::future::Future;

use anyhow::Result;
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use crate::domain::errors::UnsupportedAction;
use crate::domain::map_diff::BuildOutcome;

/// 수신 루프 종료 시 집계.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListenSummary {
    pub received: usize,
    pub published: usize,
    pub skipped: usize,
    pub cancelled: usize,
    pub failed: usize,
}

/// 입력이 끝나거나 `cancel`이 발화할 때까지 읽고, 진행 중인 처리를 모두 기다린 뒤 반환한다.
pub async fn listen<R, F, Fut>(
    reader: R,
    cancel: &CancellationToken,
    handle: F,
) -> Result<ListenSummary>
where
    R: AsyncBufRead + Unpin,
    F: Fn(String) -> Fut,
    Fut: Future<Output = Result<BuildOutcome>>,
{
    let mut lines = reader.lines();
    let mut in_flight = FuturesUnordered::new();
    let mut summary = ListenSummary::default();
    let mut reading = true;
    let mut line_no = 0usize;

    loop {
        tokio::select! {
            _ = cancel.cancelled(), if reading => {
                info!("shutdown requested; waiting for in-flight builds");
                reading = false;
            }
            line = lines.next_line(), if reading => match line? {
                Some(line) => {
                    line_no += 1;
                    if line.trim().is_empty() {
                        continue;
                    }
                    summary.received += 1;
                    let pending = handle(line);
                    in_flight.push(async move { (line_no, pending.await) });
                }
                None => reading = false,
            },
            Some((line_no, result)) = in_flight.next(), if !in_flight.is_empty() => {
                record(&mut summary, line_no, result);
            }
            else => break,
        }
    }

    info!(?summary, "listener stopped");
    Ok(summary)
}

fn record(summary: &mut ListenSummary, line_no: usize, result: Result<BuildOutcome>) {
    match result {
        Ok(BuildOutcome::Published { comment_id, maps }) => {
            info!(line_no, %comment_id, maps, "published map diff");
            summary.published += 1;
        }
        Ok(BuildOutcome::Cancelled) => summary.cancelled += 1,
        Ok(outcome) => {
            info!(line_no, ?outcome, "nothing published");
            summary.skipped += 1;
        }
        Err(err) if err.is::<UnsupportedAction>() => {
            info!(line_no, "{err}");
            summary.skipped += 1;
        }
        Err(err) => {
            error!(line_no, "event failed: {err:#}");
            summary.failed += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use anyhow::anyhow;
    use tokio::io::AsyncWriteExt;

    use super::*;

    #[tokio::test]
    async fn handles_every_line_and_tallies_outcomes() {
        let input = b"published\n\nskipped\nunsupported\nboom\n";
        let summary = listen(&input[..], &CancellationToken::new(), |line| async move {
            match line.as_str() {
                "published" => Ok(BuildOutcome::Published {
                    comment_id: "1".into(),
                    maps: 2,
                }),
                "skipped" => Ok(BuildOutcome::NoMapChanges),
                "unsupported" => Err(UnsupportedAction("closed".into()).into()),
                _ => Err(anyhow!("render tool exploded")),
            }
        })
        .await
        .unwrap();

        assert_eq!(
            summary,
            ListenSummary {
                received: 4,
                published: 1,
                skipped: 2,
                cancelled: 0,
                failed: 1,
            }
        );
    }

    #[tokio::test]
    async fn events_are_processed_concurrently() {
        // 두 번째 이벤트가 첫 번째를 깨워야 끝나므로 순차 처리라면 멈춘다.
        let gate = tokio::sync::Notify::new();
        let gate = &gate;
        let input = b"wait\nwake\n";
        let summary = tokio::time::timeout(
            Duration::from_secs(5),
            listen(&input[..], &CancellationToken::new(), move |line| async move {
                if line == "wait" {
                    gate.notified().await;
                } else {
                    gate.notify_one();
                }
                Ok(BuildOutcome::NoMapChanges)
            }),
        )
        .await
        .expect("listener deadlocked")
        .unwrap();

        assert_eq!(summary.skipped, 2);
    }

    #[tokio::test]
    async fn cancellation_stops_reading_and_drains_in_flight() {
        let cancel = CancellationToken::new();
        // 쓰기 쪽을 열어 둔 채로 두어 입력이 끝나지 않게 한다.
        let (mut writer, server) = tokio::io::duplex(64);
        let reader = tokio::io::BufReader::new(server);
        writer.write_all(b"first\n").await.unwrap();

        let summary = listen(reader, &cancel, |_| {
            let cancel = cancel.clone();
            async move {
                cancel.cancel();
                cancel.cancelled().await;
                Ok(BuildOutcome::Cancelled)
            }
        })
        .await
        .unwrap();

        assert_eq!(summary.received, 1);
        assert_eq!(summary.cancelled, 1);
        drop(writer);
    }
}
