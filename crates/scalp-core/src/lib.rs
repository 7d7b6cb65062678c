//! # Scalp Core
//!
//! scalpaiboard 백엔드의 핵심 도메인 타입을 제공합니다.
//!
//! - 마켓 식별자 (`BI:SPOT:BTCUSDT`) 및 거래소/시장 유형
//! - 시세, 캔들, 호가창 구조체
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;
