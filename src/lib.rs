//! mapdiffbot library root.
//! Clean Architecture + DDD 계층을 외부에 노출한다.

use anyhow::Result;
use tokio_util::sync::CancellationToken;

pub mod application;
pub mod domain;
pub mod infrastructure;
pub mod interface;

use application::usecases::inspect_config::InspectConfigUseCase;
use domain::map_diff::BuildOutcome;
use infrastructure::adapters::JsonConfigRepository;
use interface::cli::AppComposition;

/// 웹훅 페이로드 하나를 처리하는 라이브러리 직접 호출용 함수.
pub async fn run_payload(raw: &str, cancel: &CancellationToken) -> Result<BuildOutcome> {
    let composition = AppComposition::load()?;
    composition
        .dispatch_usecase()
        .execute_json(raw, cancel)
        .await
}

/// 설정 점검 JSON 출력용 함수.
pub fn inspect_config_pretty_json() -> Result<String> {
    InspectConfigUseCase {
        config_repo: &JsonConfigRepository,
    }
    .execute()
}
