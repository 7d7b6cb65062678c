//! 종합 기술적 분석 리포트.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::indicators::{
    bollinger_bands, ema_value, macd, pivot_levels, rsi, sma, support_resistance, BollingerBands,
    BollingerBandsParams, IndicatorError, IndicatorResult, MacdParams, MacdResult, PivotLevels,
    RsiParams,
};

/// 선택적으로 계산하는 이동평균 기간.
const MA_PERIODS: [usize; 4] = [9, 21, 50, 200];

/// RSI 값과 기간.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RsiValue {
    pub value: f64,
    pub period: usize,
}

/// 지지/저항 섹션.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportResistanceReport {
    pub recent_high: f64,
    pub recent_low: f64,
    pub pivots: PivotLevels,
    pub lookback: usize,
}

/// 기술적 분석 리포트.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalAnalysis {
    pub symbol: String,
    pub interval: String,
    pub limit: usize,
    pub last_close: f64,
    pub rsi: RsiValue,
    pub macd: MacdResult,
    pub bollinger: BollingerBands,
    /// 계산 가능한 기간만 포함 (`p9`, `p21`, `p50`, `p200`)
    pub sma: BTreeMap<String, f64>,
    pub ema: BTreeMap<String, f64>,
    pub support_resistance: SupportResistanceReport,
}

fn period_key(period: usize) -> String {
    format!("p{}", period)
}

/// 종가/고가/저가 시리즈로 분석 리포트를 생성합니다.
///
/// RSI(14), MACD(12,26,9), 볼린저(20,2)는 필수이며 실패하면 에러를 반환합니다.
/// SMA/EMA(9,21,50,200)는 데이터가 충분한 기간만 채웁니다.
/// 피벗은 마지막 봉 기준입니다.
pub fn compute_technical_analysis(
    symbol: &str,
    interval: &str,
    closes: &[f64],
    highs: &[f64],
    lows: &[f64],
    limit: usize,
) -> IndicatorResult<TechnicalAnalysis> {
    if closes.len() < 2 {
        return Err(IndicatorError::InsufficientData {
            required: 2,
            provided: closes.len(),
        });
    }
    if highs.len() != closes.len() || lows.len() != closes.len() {
        return Err(IndicatorError::InvalidParameter(
            "종가/고가/저가 길이가 일치하지 않습니다".to_string(),
        ));
    }

    let rsi_params = RsiParams::default();
    let rsi_value = rsi(closes, rsi_params.period)?;
    let macd_result = macd(closes, MacdParams::default())?;
    let bollinger = bollinger_bands(closes, BollingerBandsParams::default())?;

    let mut sma_map = BTreeMap::new();
    let mut ema_map = BTreeMap::new();
    for period in MA_PERIODS {
        if let Ok(v) = sma(closes, period) {
            sma_map.insert(period_key(period), v);
        }
        if let Ok(v) = ema_value(closes, period) {
            ema_map.insert(period_key(period), v);
        }
    }

    let sr = support_resistance(highs, lows)?;
    let last = closes.len() - 1;
    let pivots = pivot_levels(highs[last], lows[last], closes[last]);

    Ok(TechnicalAnalysis {
        symbol: symbol.to_string(),
        interval: interval.to_string(),
        limit,
        last_close: closes[last],
        rsi: RsiValue {
            value: rsi_value,
            period: rsi_params.period,
        },
        macd: macd_result,
        bollinger,
        sma: sma_map,
        ema: ema_map,
        support_resistance: SupportResistanceReport {
            recent_high: sr.recent_high,
            recent_low: sr.recent_low,
            pivots,
            lookback: sr.lookback,
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(n: usize) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
        let closes: Vec<f64> = (0..n).map(|i| 100.0 + (i as f64 * 0.7).sin() * 5.0).collect();
        let highs = closes.iter().map(|c| c + 1.0).collect();
        let lows = closes.iter().map(|c| c - 1.0).collect();
        (closes, highs, lows)
    }

    #[test]
    fn test_report_optional_periods() {
        let (closes, highs, lows) = series(60);
        let report =
            compute_technical_analysis("BTCUSDT", "1h", &closes, &highs, &lows, 60).unwrap();

        // 60봉: 9, 21, 50만 계산 가능
        let keys: Vec<&str> = report.sma.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["p21", "p50", "p9"]);
        assert!(!report.ema.contains_key("p200"));
        assert_eq!(report.support_resistance.lookback, 60);
        assert_eq!(report.last_close, closes[59]);
    }

    #[test]
    fn test_report_requires_macd_length() {
        // 34봉은 MACD(12,26,9)에 부족
        let (closes, highs, lows) = series(34);
        let err = compute_technical_analysis("X", "1h", &closes, &highs, &lows, 34).unwrap_err();
        assert_eq!(
            err,
            IndicatorError::InsufficientData {
                required: 35,
                provided: 34
            }
        );
    }

    #[test]
    fn test_report_json_shape() {
        let (closes, highs, lows) = series(40);
        let report = compute_technical_analysis("ETHUSDT", "5m", &closes, &highs, &lows, 40).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["symbol"], "ETHUSDT");
        assert_eq!(json["rsi"]["period"], 14);
        assert_eq!(json["macd"]["slowPeriod"], 26);
        assert_eq!(json["bollinger"]["stdMult"], 2.0);
        assert!(json["supportResistance"]["pivots"]["r1"].is_number());
        assert!(json["lastClose"].is_number());
    }
}
