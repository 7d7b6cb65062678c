//! 변동성 지표 (Volatility Indicators).
//!
//! - Bollinger Bands (볼린저 밴드)
//! - NATR (Normalized Average True Range)

use serde::{Deserialize, Serialize};

use super::{check_period, require_len, trend::sma, IndicatorResult};

/// 볼린저 밴드 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BollingerBandsParams {
    /// 이동평균 기간 (기본: 20).
    pub period: usize,
    /// 표준편차 배수 (기본: 2.0).
    pub std_mult: f64,
}

impl Default for BollingerBandsParams {
    fn default() -> Self {
        Self {
            period: 20,
            std_mult: 2.0,
        }
    }
}

/// 볼린저 밴드 결과.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BollingerBands {
    /// 중간 밴드 (SMA).
    pub middle: f64,
    /// 상단 밴드 (MA + k × σ).
    pub upper: f64,
    /// 하단 밴드 (MA - k × σ).
    pub lower: f64,
    /// 모표준편차.
    pub std_dev: f64,
    pub period: usize,
    pub std_mult: f64,
}

/// 볼린저 밴드 계산.
///
/// 표준편차는 모표준편차입니다 (분산을 `period - 1`이 아닌 `period`로 나눔).
pub fn bollinger_bands(
    closes: &[f64],
    params: BollingerBandsParams,
) -> IndicatorResult<BollingerBands> {
    let BollingerBandsParams { period, std_mult } = params;
    check_period(period)?;
    require_len(closes.len(), period)?;

    let window = &closes[closes.len() - period..];
    let mean = sma(closes, period)?;

    let mut variance = 0.0;
    for v in window {
        let d = v - mean;
        variance += d * d;
    }
    variance /= period as f64;
    let std_dev = variance.sqrt();

    Ok(BollingerBands {
        middle: mean,
        upper: mean + std_mult * std_dev,
        lower: mean - std_mult * std_dev,
        std_dev,
        period,
        std_mult,
    })
}

/// 정규화 ATR (%).
///
/// True Range = max(고가-저가, |고가-전일종가|, |저가-전일종가|).
/// ATR은 처음 `period`개 TR의 단순 평균으로 시드한 뒤 Wilder 평활을 적용하고,
/// 결과는 `100 * atr / 마지막 종가`입니다.
///
/// 표시용 지표이므로 실패하지 않습니다. 봉이 `period + 1`개 미만이거나
/// 마지막 종가가 0이면 0을 반환합니다.
pub fn natr(highs: &[f64], lows: &[f64], closes: &[f64], period: usize) -> f64 {
    let len = closes.len().min(highs.len()).min(lows.len());
    if period == 0 || len < period + 1 {
        return 0.0;
    }

    let true_ranges: Vec<f64> = (1..len)
        .map(|i| {
            let hl = highs[i] - lows[i];
            let hc = (highs[i] - closes[i - 1]).abs();
            let lc = (lows[i] - closes[i - 1]).abs();
            hl.max(hc.max(lc))
        })
        .collect();

    let n = period as f64;
    let mut atr = 0.0;
    for tr in &true_ranges[..period] {
        atr += tr;
    }
    atr /= n;

    for tr in &true_ranges[period..] {
        atr = (atr * (n - 1.0) + tr) / n;
    }

    let last_close = closes[len - 1];
    if last_close == 0.0 {
        return 0.0;
    }

    100.0 * atr / last_close
}

/// 14기간 NATR.
pub fn natr14(highs: &[f64], lows: &[f64], closes: &[f64]) -> f64 {
    natr(highs, lows, closes, 14)
}
