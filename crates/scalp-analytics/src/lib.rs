//! # Scalp Analytics
//!
//! OHLCV 시리즈에 대한 기술적 지표 계산.
//!
//! 모든 함수는 순수 함수이며 입력은 시간 오름차순이라고 가정합니다.
//! 정렬은 호출자의 책임입니다.

pub mod analysis;
pub mod indicators;

pub use analysis::{
    compute_technical_analysis, RsiValue, SupportResistanceReport, TechnicalAnalysis,
};
pub use indicators::*;
