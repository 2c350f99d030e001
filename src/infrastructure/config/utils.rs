//! 설정 모듈 공용 유틸리티.

use std::env;
use std::path::{Path, PathBuf};

/// 로컬 명령이 실행 가능한지 탐지한다.
pub fn command_exists(command: &str) -> bool {
    find_command(command).is_some()
}

/// 명령의 실제 경로를 찾는다. 경로가 주어지면 파일 존재만 검사한다.
fn find_command(command: &str) -> Option<PathBuf> {
    let command = command.trim();
    if command.is_empty() {
        return None;
    }

    let command_path = Path::new(command);
    if command_path.components().count() > 1 {
        return command_path.is_file().then(|| command_path.to_path_buf());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| {
        candidates(&dir, command)
            .into_iter()
            .find(|candidate| candidate.is_file())
    })
}

#[cfg(windows)]
fn candidates(dir: &Path, command: &str) -> Vec<PathBuf> {
    // Windows는 확장자를 생략할 수 있으므로 PATHEXT를 고려한다.
    let mut out = vec![dir.join(command)];
    if Path::new(command).extension().is_none() {
        let pathext = env::var_os("PATHEXT").unwrap_or_else(|| ".EXE;.CMD;.BAT;.COM".into());
        for ext in pathext.to_string_lossy().split(';').map(str::trim) {
            if !ext.is_empty() {
                out.push(dir.join(format!("{command}{ext}")));
            }
        }
    }
    out
}

#[cfg(not(windows))]
fn candidates(dir: &Path, command: &str) -> Vec<PathBuf> {
    vec![dir.join(command)]
}
