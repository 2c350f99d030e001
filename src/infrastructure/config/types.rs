//! 설정 스키마와 병합/해석 규칙.

use std::collections::HashMap;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

pub const DEFAULT_REPOSITORIES_DIR: &str = ".mapdiffbot/repositories";
pub const DEFAULT_OUTPUT_DIR: &str = ".mapdiffbot/output";
pub const DEFAULT_MAP_EXTENSION: &str = ".dmm";
pub const DEFAULT_MERGEABILITY_RETRIES: u32 = 5;
pub const DEFAULT_MERGEABILITY_DELAY_MS: u64 = 5_000;
pub const DEFAULT_CLONE_BASE_URL: &str = "https://github.com";
pub const DEFAULT_RENDER_COMMAND: &str = "dmm-tools";
pub const DEFAULT_UPLOAD_API_BASE: &str = "https://api.imgur.com";

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct Config {
    /// 전역 기본값
    #[serde(default)]
    pub defaults: DefaultsConfig,
    /// VCS 호스트별 인증/엔드포인트 설정
    #[serde(default)]
    pub hosts: HashMap<String, HostConfig>,
    /// 렌더 도구 실행 설정
    #[serde(default)]
    pub render_tool: RenderToolConfig,
    /// 이미지 업로드 설정
    #[serde(default)]
    pub upload: UploadConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct DefaultsConfig {
    /// 원격 저장소 미러 루트
    pub repositories_dir: Option<String>,
    /// 렌더 산출물 루트
    pub output_dir: Option<String>,
    /// diff 대상 맵 파일 확장자
    pub map_extension: Option<String>,
    /// mergeable 미정일 때 재조회 횟수
    pub mergeability_retries: Option<u32>,
    /// 재조회 간격(ms)
    pub mergeability_delay_ms: Option<u64>,
    /// owner/name으로 clone URL을 만들 때 쓰는 베이스
    pub clone_base_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct HostConfig {
    pub token: Option<String>,
    pub token_env: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct RenderToolConfig {
    /// 실행할 로컬 명령
    pub command: Option<String>,
    /// 생성된 플래그 앞에 붙는 인자
    pub args: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize, Serialize, Default)]
pub struct UploadConfig {
    pub client_id: Option<String>,
    pub client_id_env: Option<String>,
    pub client_secret: Option<String>,
    pub client_secret_env: Option<String>,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RenderCommandSpec {
    pub command: String,
    pub args: Vec<String>,
}

impl Config {
    pub fn repositories_dir(&self) -> PathBuf {
        PathBuf::from(
            self.defaults
                .repositories_dir
                .as_deref()
                .unwrap_or(DEFAULT_REPOSITORIES_DIR),
        )
    }

    pub fn output_dir(&self) -> PathBuf {
        PathBuf::from(self.defaults.output_dir.as_deref().unwrap_or(DEFAULT_OUTPUT_DIR))
    }

    pub fn map_extension(&self) -> &str {
        self.defaults
            .map_extension
            .as_deref()
            .unwrap_or(DEFAULT_MAP_EXTENSION)
    }

    pub fn mergeability_retries(&self) -> u32 {
        self.defaults
            .mergeability_retries
            .unwrap_or(DEFAULT_MERGEABILITY_RETRIES)
    }

    pub fn mergeability_delay(&self) -> Duration {
        Duration::from_millis(
            self.defaults
                .mergeability_delay_ms
                .unwrap_or(DEFAULT_MERGEABILITY_DELAY_MS),
        )
    }

    pub fn clone_base_url(&self) -> &str {
        self.defaults
            .clone_base_url
            .as_deref()
            .unwrap_or(DEFAULT_CLONE_BASE_URL)
    }

    pub fn host_config(&self, host: &str) -> Option<&HostConfig> {
        self.hosts.get(host)
    }

    pub fn render_command_spec(&self) -> RenderCommandSpec {
        RenderCommandSpec {
            command: self
                .render_tool
                .command
                .clone()
                .unwrap_or_else(|| DEFAULT_RENDER_COMMAND.to_string()),
            args: self.render_tool.args.clone().unwrap_or_default(),
        }
    }

    /// 후순위(나중 파일) 값으로 덮어쓰는 병합 규칙.
    pub(crate) fn merge_from(&mut self, other: Config) {
        self.defaults.merge_from(other.defaults);

        for (host, incoming) in other.hosts {
            if let Some(existing) = self.hosts.get_mut(&host) {
                existing.merge_from(incoming);
            } else {
                self.hosts.insert(host, incoming);
            }
        }

        self.render_tool.merge_from(other.render_tool);
        self.upload.merge_from(other.upload);
    }
}

impl DefaultsConfig {
    pub(crate) fn merge_from(&mut self, other: DefaultsConfig) {
        if other.repositories_dir.is_some() {
            self.repositories_dir = other.repositories_dir;
        }
        if other.output_dir.is_some() {
            self.output_dir = other.output_dir;
        }
        if other.map_extension.is_some() {
            self.map_extension = other.map_extension;
        }
        if other.mergeability_retries.is_some() {
            self.mergeability_retries = other.mergeability_retries;
        }
        if other.mergeability_delay_ms.is_some() {
            self.mergeability_delay_ms = other.mergeability_delay_ms;
        }
        if other.clone_base_url.is_some() {
            self.clone_base_url = other.clone_base_url;
        }
    }
}

impl HostConfig {
    /// host 토큰은 `token` 우선, 없으면 `token_env`를 조회한다.
    pub fn resolve_token(&self) -> Option<String> {
        inline_or_env(self.token.as_deref(), self.token_env.as_deref())
    }

    pub(crate) fn merge_from(&mut self, other: HostConfig) {
        if other.token.is_some() {
            self.token = other.token;
        }
        if other.token_env.is_some() {
            self.token_env = other.token_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
    }

    pub(crate) fn token_source_label(&self) -> Option<String> {
        source_label(self.token.as_deref(), self.token_env.as_deref())
    }
}

impl RenderToolConfig {
    pub(crate) fn merge_from(&mut self, other: RenderToolConfig) {
        if other.command.is_some() {
            self.command = other.command;
        }
        if other.args.is_some() {
            self.args = other.args;
        }
    }
}

impl UploadConfig {
    /// 업로드 자격 증명을 `"<id>/<secret>"` 형태로 해석한다.
    pub fn resolve_credentials(&self) -> Option<String> {
        let id = inline_or_env(self.client_id.as_deref(), self.client_id_env.as_deref())?;
        let secret = inline_or_env(
            self.client_secret.as_deref(),
            self.client_secret_env.as_deref(),
        )?;
        Some(format!("{id}/{secret}"))
    }

    pub fn api_base(&self) -> &str {
        self.api_base.as_deref().unwrap_or(DEFAULT_UPLOAD_API_BASE)
    }

    pub(crate) fn merge_from(&mut self, other: UploadConfig) {
        if other.client_id.is_some() {
            self.client_id = other.client_id;
        }
        if other.client_id_env.is_some() {
            self.client_id_env = other.client_id_env;
        }
        if other.client_secret.is_some() {
            self.client_secret = other.client_secret;
        }
        if other.client_secret_env.is_some() {
            self.client_secret_env = other.client_secret_env;
        }
        if other.api_base.is_some() {
            self.api_base = other.api_base;
        }
    }
}

fn inline_or_env(inline: Option<&str>, env_name: Option<&str>) -> Option<String> {
    if let Some(value) = inline.map(str::trim).filter(|v| !v.is_empty()) {
        return Some(value.to_string());
    }
    let env_name = env_name?;
    env::var(env_name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn source_label(inline: Option<&str>, env_name: Option<&str>) -> Option<String> {
    if inline.is_some() {
        return Some("inline".to_string());
    }
    let env_name = env_name?;
    if env::var(env_name)
        .ok()
        .filter(|v| !v.trim().is_empty())
        .is_some()
    {
        Some(format!("env:{env_name}"))
    } else {
        Some(format!("env:{env_name} (missing)"))
    }
}
