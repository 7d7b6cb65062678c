//! 기술적 지표 모듈.
//!
//! # 지원 지표
//!
//! ## 추세 지표
//! - **SMA**: 단순 이동평균
//! - **EMA**: 지수 이동평균 (SMA 시드)
//! - **MACD**: 이동평균 수렴/확산
//!
//! ## 모멘텀 지표
//! - **RSI**: 상대강도지수 (Wilder 평활)
//!
//! ## 변동성 지표
//! - **Bollinger Bands**: 모표준편차 기반 볼린저 밴드
//! - **NATR**: 정규화 평균 실제 범위
//!
//! ## 가격 레벨
//! - **Pivot**: 클래식 피벗 포인트
//! - **지지/저항**: 최근 구간 최고가/최저가

pub mod levels;
pub mod momentum;
pub mod trend;
pub mod volatility;

use thiserror::Error;

pub use levels::{pivot_levels, support_resistance, PivotLevels, SupportResistance};
pub use momentum::{rsi, RsiParams};
pub use trend::{ema, ema_value, macd, sma, MacdParams, MacdResult};
pub use volatility::{bollinger_bands, natr, natr14, BollingerBands, BollingerBandsParams};

/// 지표 계산 오류.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IndicatorError {
    /// 데이터 부족 오류
    #[error("데이터가 부족합니다: 필요 {required}개, 제공 {provided}개")]
    InsufficientData { required: usize, provided: usize },

    /// 잘못된 파라미터
    #[error("잘못된 파라미터: {0}")]
    InvalidParameter(String),
}

/// 지표 계산 결과 타입.
pub type IndicatorResult<T> = Result<T, IndicatorError>;

/// 기간이 0이면 에러.
pub(crate) fn check_period(period: usize) -> IndicatorResult<()> {
    if period == 0 {
        return Err(IndicatorError::InvalidParameter(
            "기간은 0보다 커야 합니다".to_string(),
        ));
    }
    Ok(())
}

/// 데이터 길이가 `required`보다 짧으면 에러.
pub(crate) fn require_len(provided: usize, required: usize) -> IndicatorResult<()> {
    if provided < required {
        return Err(IndicatorError::InsufficientData { required, provided });
    }
    Ok(())
}
