//! 애플리케이션 유스케이스 모음.

pub mod dispatch_event;
pub mod inspect_config;
pub mod rolling_build;
