//! mapdiffbot 설정(JSON).
//! `/etc` → 사용자 설정 디렉터리 → `.mapdiffbot/` → `$MAPDIFFBOT_CONFIG` 순으로 필드 단위 병합한다.
//! 렌더 도구 명령, 호스트 토큰, 업로드 자격 증명과 작업 디렉터리 기본값을 담는다.

mod inspection;
mod loader;
mod types;
mod utils;

use anyhow::Result;

pub use inspection::{
    ConfigInspection, EffectiveDefaults, HostInspection, RenderToolInspection, UploadInspection,
};
pub use loader::config_paths;
pub use types::{
    Config, DefaultsConfig, HostConfig, RenderCommandSpec, RenderToolConfig, UploadConfig,
};
pub use utils::command_exists;

impl Config {
    /// 모든 경로를 병합한 설정. 파일이 없으면 기본값이다.
    pub fn load() -> Result<Self> {
        Ok(loader::load_merged_config()?.config)
    }

    /// 탐색/적용된 경로, 렌더 도구 존재 여부, 토큰·자격 증명 해석 결과.
    pub fn inspect() -> Result<ConfigInspection> {
        let loaded = loader::load_merged_config()?;
        Ok(ConfigInspection::from_loaded(loaded))
    }

    pub fn inspect_pretty_json() -> Result<String> {
        Ok(serde_json::to_string_pretty(&Self::inspect()?)?)
    }
}
