//! 설정 저장소 포트 구현 어댑터.

use anyhow::Result;
use tracing::debug;

use crate::application::ports::ConfigRepository;
use crate::infrastructure::config::Config;

/// 병합 JSON 설정 파일을 이벤트마다 다시 읽는 저장소.
pub struct JsonConfigRepository;

impl ConfigRepository for JsonConfigRepository {
    fn load(&self) -> Result<Config> {
        let config = Config::load()?;
        debug!(
            hosts = config.hosts.len(),
            map_extension = config.map_extension(),
            output_dir = %config.output_dir().display(),
            "config loaded"
        );
        Ok(config)
    }

    fn inspect_pretty_json(&self) -> Result<String> {
        Config::inspect_pretty_json()
    }
}
