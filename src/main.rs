//! `mapdiffbot` 바이너리 진입점.

use std::path::Path;

use anyhow::{Context, Result};
use tokio::io::{AsyncReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use mapdiffbot::domain::errors::UnsupportedAction;
use mapdiffbot::domain::map_diff::BuildOutcome;
use mapdiffbot::interface::cli::{AppComposition, Cli, CliAction, listen};

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let action = Cli::parse_action();

    if action == CliAction::InspectConfig {
        match mapdiffbot::inspect_config_pretty_json() {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("error: {err:#}");
                std::process::exit(1);
            }
        }
        return;
    }

    let cancel = CancellationToken::new();
    spawn_interrupt_handler(cancel.clone());

    let composition = match AppComposition::load() {
        Ok(composition) => composition,
        Err(err) => {
            eprintln!("error: {err:#}");
            std::process::exit(1);
        }
    };

    let result = match action {
        CliAction::Run { payload } => run_once(&composition, &payload, &cancel).await,
        CliAction::Listen => run_listener(&composition, &cancel).await,
        CliAction::InspectConfig => Ok(()),
    };

    if let Err(err) = result {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}

/// Ctrl-C를 받으면 루트 토큰을 취소해 진행 중인 빌드를 모두 정리한다.
fn spawn_interrupt_handler(cancel: CancellationToken) {
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received; cancelling builds");
            cancel.cancel();
        }
    });
}

async fn run_once(
    composition: &AppComposition,
    payload: &Path,
    cancel: &CancellationToken,
) -> Result<()> {
    let raw = read_payload(payload).await?;
    match composition
        .dispatch_usecase()
        .execute_json(&raw, cancel)
        .await
    {
        Ok(BuildOutcome::Published { comment_id, maps }) => {
            println!("published {maps} map diff(s) in comment {comment_id}");
            Ok(())
        }
        Ok(outcome) => {
            println!("nothing published: {outcome:?}");
            Ok(())
        }
        Err(err) if err.is::<UnsupportedAction>() => {
            info!("{err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}

async fn run_listener(composition: &AppComposition, cancel: &CancellationToken) -> Result<()> {
    let dispatcher = composition.dispatch_usecase();
    let dispatcher = &dispatcher;
    let summary = listen(BufReader::new(tokio::io::stdin()), cancel, move |line| async move {
        dispatcher.execute_json(&line, cancel).await
    })
    .await?;

    if summary.failed > 0 {
        anyhow::bail!("{} of {} event(s) failed", summary.failed, summary.received);
    }
    Ok(())
}

/// `-`이면 stdin 전체를, 아니면 파일을 읽는다.
async fn read_payload(path: &Path) -> Result<String> {
    if path == Path::new("-") {
        let mut raw = String::new();
        tokio::io::stdin()
            .read_to_string(&mut raw)
            .await
            .context("failed to read payload from stdin")?;
        return Ok(raw);
    }
    tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("failed to read payload {}", path.display()))
}
