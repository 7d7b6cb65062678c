//! 가격 레벨: 피벗 포인트, 최근 지지/저항.

use serde::{Deserialize, Serialize};

use super::{IndicatorError, IndicatorResult};

/// 지지/저항 계산 시 최대 조회 봉 수.
pub const MAX_LOOKBACK: usize = 100;

/// 클래식 피벗 포인트.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PivotLevels {
    pub pivot: f64,
    pub r1: f64,
    pub r2: f64,
    pub s1: f64,
    pub s2: f64,
}

/// 최근 구간 최고가/최저가.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistance {
    pub recent_high: f64,
    pub recent_low: f64,
    /// 실제 사용한 봉 수
    pub lookback: usize,
}

/// 단일 완성 봉의 고가/저가/종가로 피벗 레벨을 계산합니다.
///
/// `P=(H+L+C)/3`, `R1=2P-L`, `S1=2P-H`, `R2=P+(H-L)`, `S2=P-(H-L)`.
pub fn pivot_levels(high: f64, low: f64, close: f64) -> PivotLevels {
    let pivot = (high + low + close) / 3.0;
    PivotLevels {
        pivot,
        r1: 2.0 * pivot - low,
        s1: 2.0 * pivot - high,
        r2: pivot + (high - low),
        s2: pivot - (high - low),
    }
}

/// 최근 `min(100, 봉 수)` 구간의 최고가와 최저가.
pub fn support_resistance(highs: &[f64], lows: &[f64]) -> IndicatorResult<SupportResistance> {
    if highs.len() != lows.len() {
        return Err(IndicatorError::InvalidParameter(format!(
            "고가({})와 저가({}) 길이가 다릅니다",
            highs.len(),
            lows.len()
        )));
    }
    if highs.is_empty() {
        return Err(IndicatorError::InsufficientData {
            required: 1,
            provided: 0,
        });
    }

    let lookback = highs.len().min(MAX_LOOKBACK);
    let start = highs.len() - lookback;

    let mut recent_high = highs[start];
    let mut recent_low = lows[start];
    for (&high, &low) in highs[start..].iter().zip(&lows[start..]) {
        if high > recent_high {
            recent_high = high;
        }
        if low < recent_low {
            recent_low = low;
        }
    }

    Ok(SupportResistance {
        recent_high,
        recent_low,
        lookback,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pivot_levels() {
        let levels = pivot_levels(110.0, 90.0, 100.0);
        assert_eq!(levels.pivot, 100.0);
        assert_eq!(levels.r1, 110.0);
        assert_eq!(levels.s1, 90.0);
        assert_eq!(levels.r2, 120.0);
        assert_eq!(levels.s2, 80.0);
    }

    #[test]
    fn test_support_resistance_window() {
        // 오래된 극값은 100봉 창 밖
        let mut highs = vec![1000.0];
        let mut lows = vec![1.0];
        highs.extend((0..100).map(|i| 50.0 + i as f64));
        lows.extend((0..100).map(|i| 40.0 + i as f64));

        let sr = support_resistance(&highs, &lows).unwrap();
        assert_eq!(sr.lookback, 100);
        assert_eq!(sr.recent_high, 149.0);
        assert_eq!(sr.recent_low, 40.0);
    }

    #[test]
    fn test_support_resistance_short_series() {
        let sr = support_resistance(&[3.0], &[1.0]).unwrap();
        assert_eq!(sr.lookback, 1);
        assert_eq!(sr.recent_high, 3.0);
        assert!(support_resistance(&[], &[]).is_err());
    }
}
