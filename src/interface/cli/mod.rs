//! CLI 인터페이스 모듈 묶음.
//! 명령 파싱/이벤트 수신 루프/조립을 한 네임스페이스로 관리한다.

pub mod command;
pub mod composition;
pub mod listen;

pub use command::{Cli, CliAction};
pub use composition::AppComposition;
pub use listen::{ListenSummary, listen};
