//! Interface layer
//! 외부 입력(CLI/stdin)을 유스케이스 호출로 연결한다.

pub mod cli;
