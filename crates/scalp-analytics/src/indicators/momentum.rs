//! 모멘텀 지표 (Momentum Indicators).

use serde::{Deserialize, Serialize};

use super::{check_period, require_len, IndicatorResult};

/// RSI 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsiParams {
    /// RSI 기간 (기본: 14).
    pub period: usize,
}

impl Default for RsiParams {
    fn default() -> Self {
        Self { period: 14 }
    }
}

/// RSI (Relative Strength Index) 계산.
///
/// 처음 `period`개 변화량의 평균으로 시드하고, 이후는 Wilder 평활
/// `avg = (avg*(period-1) + x) / period`를 적용합니다.
/// 0 이상의 변화량은 상승으로 집계합니다.
///
/// 평균 하락폭이 정확히 0이면 100을 반환합니다.
pub fn rsi(closes: &[f64], period: usize) -> IndicatorResult<f64> {
    check_period(period)?;
    require_len(closes.len(), period + 1)?;

    let n = period as f64;
    let mut gain = 0.0;
    let mut loss = 0.0;

    for i in 1..=period {
        let delta = closes[i] - closes[i - 1];
        if delta >= 0.0 {
            gain += delta;
        } else {
            loss -= delta;
        }
    }

    let mut avg_gain = gain / n;
    let mut avg_loss = loss / n;

    for i in (period + 1)..closes.len() {
        let delta = closes[i] - closes[i - 1];
        let (g, l) = if delta >= 0.0 { (delta, 0.0) } else { (0.0, -delta) };
        avg_gain = (avg_gain * (n - 1.0) + g) / n;
        avg_loss = (avg_loss * (n - 1.0) + l) / n;
    }

    if avg_loss == 0.0 {
        return Ok(100.0);
    }

    let rs = avg_gain / avg_loss;
    Ok(100.0 - (100.0 / (1.0 + rs)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::indicators::IndicatorError;

    #[test]
    fn test_rsi_bullish_market() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 + i as f64).collect();
        assert_eq!(rsi(&prices, 14).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_bearish_market() {
        let prices: Vec<f64> = (0..30).map(|i| 100.0 - i as f64).collect();
        assert_eq!(rsi(&prices, 14).unwrap(), 0.0);
    }

    #[test]
    fn test_rsi_flat_market_is_100() {
        // 변화량 0은 상승으로 집계되며 하락 평균이 0
        let prices = vec![50.0; 20];
        assert_eq!(rsi(&prices, 14).unwrap(), 100.0);
    }

    #[test]
    fn test_rsi_mixed() {
        // 상승 +2, 하락 -1 반복
        let prices = vec![10.0, 12.0, 11.0, 13.0, 12.0];
        let value = rsi(&prices, 4).unwrap();

        // avg_gain = 4/4 = 1, avg_loss = 2/4 = 0.5, rs = 2
        assert_eq!(value, 100.0 - 100.0 / 3.0);
    }

    #[test]
    fn test_rsi_requires_period_plus_one() {
        let prices: Vec<f64> = (0..14).map(|i| i as f64).collect();
        assert_eq!(
            rsi(&prices, 14),
            Err(IndicatorError::InsufficientData {
                required: 15,
                provided: 14
            })
        );
    }
}
