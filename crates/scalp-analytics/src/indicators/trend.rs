//! 추세 지표 (Trend Indicators).
//!
//! - SMA (Simple Moving Average)
//! - EMA (Exponential Moving Average)
//! - MACD (Moving Average Convergence Divergence)

use serde::{Deserialize, Serialize};

use super::{check_period, require_len, IndicatorError, IndicatorResult};

/// MACD 파라미터.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MacdParams {
    /// 단기 EMA 기간 (기본: 12).
    pub fast_period: usize,
    /// 장기 EMA 기간 (기본: 26).
    pub slow_period: usize,
    /// 시그널 라인 기간 (기본: 9).
    pub signal_period: usize,
}

impl Default for MacdParams {
    fn default() -> Self {
        Self {
            fast_period: 12,
            slow_period: 26,
            signal_period: 9,
        }
    }
}

/// MACD 결과 (마지막 시점).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MacdResult {
    /// MACD 라인 (단기 EMA - 장기 EMA).
    pub macd: f64,
    /// 시그널 라인 (MACD의 EMA).
    pub signal: f64,
    /// 히스토그램 (MACD - 시그널).
    pub histogram: f64,
    pub fast_period: usize,
    pub slow_period: usize,
    pub signal_period: usize,
}

/// 단순 이동평균 (SMA).
///
/// 마지막 `period`개 값의 산술 평균입니다.
pub fn sma(values: &[f64], period: usize) -> IndicatorResult<f64> {
    check_period(period)?;
    require_len(values.len(), period)?;

    let sum: f64 = values[values.len() - period..]
        .iter()
        .fold(0.0, |acc, v| acc + v);
    Ok(sum / period as f64)
}

/// 지수 이동평균 (EMA) 시리즈.
///
/// 처음 `period`개 값의 SMA로 시드한 뒤 `ema = v*k + prev*(1-k)`, `k = 2/(period+1)`.
/// 반환 길이는 `values.len() - period + 1`입니다.
pub fn ema(values: &[f64], period: usize) -> IndicatorResult<Vec<f64>> {
    check_period(period)?;
    require_len(values.len(), period)?;

    let k = 2.0 / (period + 1) as f64;
    let mut series = Vec::with_capacity(values.len() - period + 1);

    let mut prev = sma(&values[..period], period)?;
    series.push(prev);

    for v in &values[period..] {
        prev = v * k + prev * (1.0 - k);
        series.push(prev);
    }

    Ok(series)
}

/// EMA 시리즈의 마지막 값.
pub fn ema_value(values: &[f64], period: usize) -> IndicatorResult<f64> {
    let series = ema(values, period)?;
    series
        .last()
        .copied()
        .ok_or(IndicatorError::InsufficientData {
            required: period,
            provided: values.len(),
        })
}

/// MACD 계산.
///
/// 장기 EMA 시리즈가 더 짧으므로 단기 시리즈의 앞부분을 잘라 끝을 맞춥니다.
///
/// # 에러
/// - `fast_period >= slow_period`
/// - `closes.len() < slow_period + signal_period`
pub fn macd(closes: &[f64], params: MacdParams) -> IndicatorResult<MacdResult> {
    let MacdParams {
        fast_period,
        slow_period,
        signal_period,
    } = params;

    check_period(fast_period)?;
    check_period(slow_period)?;
    check_period(signal_period)?;

    if fast_period >= slow_period {
        return Err(IndicatorError::InvalidParameter(format!(
            "단기 기간({})은 장기 기간({})보다 짧아야 합니다",
            fast_period, slow_period
        )));
    }
    require_len(closes.len(), slow_period + signal_period)?;

    let fast = ema(closes, fast_period)?;
    let slow = ema(closes, slow_period)?;

    let offset = fast.len() - slow.len();
    let macd_series: Vec<f64> = slow
        .iter()
        .enumerate()
        .map(|(i, s)| fast[i + offset] - s)
        .collect();

    let signal_series = ema(&macd_series, signal_period)?;

    let macd_value = macd_series[macd_series.len() - 1];
    let signal_value = signal_series[signal_series.len() - 1];

    Ok(MacdResult {
        macd: macd_value,
        signal: signal_value,
        histogram: macd_value - signal_value,
        fast_period,
        slow_period,
        signal_period,
    })
}
