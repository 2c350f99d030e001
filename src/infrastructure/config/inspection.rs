//! 적용 설정 진단(inspection) 뷰 모델.

use std::collections::BTreeMap;

use serde::Serialize;

use super::loader::LoadedConfig;
use super::types::{DefaultsConfig, HostConfig};
use super::utils::command_exists;

#[derive(Debug, Clone, Serialize)]
pub struct ConfigInspection {
    pub searched_paths: Vec<String>,
    pub loaded_paths: Vec<String>,
    pub defaults: DefaultsConfig,
    pub effective_defaults: EffectiveDefaults,
    pub hosts: BTreeMap<String, HostInspection>,
    pub render_tool: RenderToolInspection,
    pub upload: UploadInspection,
}

#[derive(Debug, Clone, Serialize)]
pub struct EffectiveDefaults {
    pub repositories_dir: String,
    pub output_dir: String,
    pub map_extension: String,
    pub mergeability_retries: u32,
    pub mergeability_delay_ms: u64,
    pub clone_base_url: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct HostInspection {
    pub token_source: Option<String>,
    pub token_resolved: bool,
    pub api_base: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct RenderToolInspection {
    pub command: String,
    pub args: Vec<String>,
    pub command_available: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct UploadInspection {
    pub api_base: String,
    pub credentials_resolved: bool,
}

impl ConfigInspection {
    pub(crate) fn from_loaded(loaded: LoadedConfig) -> Self {
        let config = &loaded.config;

        let mut hosts = BTreeMap::new();
        for (host, cfg) in &config.hosts {
            hosts.insert(host.clone(), host_inspection(cfg));
        }

        let spec = config.render_command_spec();

        Self {
            searched_paths: loaded
                .searched_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            loaded_paths: loaded
                .loaded_paths
                .iter()
                .map(|p| p.display().to_string())
                .collect(),
            defaults: config.defaults.clone(),
            effective_defaults: EffectiveDefaults {
                repositories_dir: config.repositories_dir().display().to_string(),
                output_dir: config.output_dir().display().to_string(),
                map_extension: config.map_extension().to_string(),
                mergeability_retries: config.mergeability_retries(),
                mergeability_delay_ms: config.mergeability_delay().as_millis() as u64,
                clone_base_url: config.clone_base_url().to_string(),
            },
            hosts,
            render_tool: RenderToolInspection {
                command_available: command_exists(&spec.command),
                command: spec.command,
                args: spec.args,
            },
            upload: UploadInspection {
                api_base: config.upload.api_base().to_string(),
                credentials_resolved: config.upload.resolve_credentials().is_some(),
            },
        }
    }
}

fn host_inspection(cfg: &HostConfig) -> HostInspection {
    HostInspection {
        token_source: cfg.token_source_label(),
        token_resolved: cfg.resolve_token().is_some(),
        api_base: cfg.api_base.clone(),
    }
}
