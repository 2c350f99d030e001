//! `mapdiffbot config` 진단 유스케이스.

use anyhow::Result;

use crate::application::ports::ConfigRepository;

/// 병합된 설정과 함께 렌더 도구가 PATH에 있는지, 호스트 토큰과 업로드 자격 증명이
/// 해석되는지를 JSON으로 보여준다. 비밀 값 자체는 출력하지 않는다.
pub struct InspectConfigUseCase<'a> {
    pub config_repo: &'a dyn ConfigRepository,
}

impl InspectConfigUseCase<'_> {
    pub fn execute(&self) -> Result<String> {
        self.config_repo.inspect_pretty_json()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::config::Config;

    struct StaticConfig;

    impl ConfigRepository for StaticConfig {
        fn load(&self) -> Result<Config> {
            Ok(Config::default())
        }

        fn inspect_pretty_json(&self) -> Result<String> {
            Ok(r#"{ "render_tool": { "command": "dmm-tools" } }"#.into())
        }
    }

    #[test]
    fn returns_repository_report() {
        let use_case = InspectConfigUseCase {
            config_repo: &StaticConfig,
        };
        assert!(use_case.execute().unwrap().contains("dmm-tools"));
    }
}
