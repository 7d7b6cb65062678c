//! 시장 데이터 구조체.
//!
//! 거래소 어댑터 경계에서 한 번 디코딩된 뒤 전달되는 타입들입니다.

use serde::{Deserialize, Serialize};

use super::MarketId;

/// 24시간 시세 스냅샷.
///
/// 조회 후 직렬화되어 전달되고 폐기됩니다. 저장하지 않습니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TickerSnapshot {
    /// 마켓 ID
    pub market_id: MarketId,
    /// 최종 가격
    pub price: f64,
    /// 24시간 변동률 (%)
    pub change_24h_pct: f64,
    /// 24시간 거래대금 (호가 자산 기준)
    pub volume_24h: f64,
    /// 24시간 고가 (제공되지 않으면 0)
    #[serde(default)]
    pub high_24h: f64,
    /// 24시간 저가 (제공되지 않으면 0)
    #[serde(default)]
    pub low_24h: f64,
    /// 조회 시각 (Unix 초)
    pub timestamp: i64,
}

/// OHLCV 캔들.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Candle {
    /// 캔들 시작 시각 (Unix 초)
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// 캔들을 시간 오름차순으로 정렬합니다.
///
/// 일부 거래소는 최신순으로 반환하므로 분석 엔진에 넣기 전에 호출해야 합니다.
pub fn sort_candles_ascending(candles: &mut [Candle]) {
    candles.sort_by_key(|c| c.time);
}

/// 캔들 시리즈에서 (종가, 고가, 저가) 배열을 추출합니다.
pub fn split_series(candles: &[Candle]) -> (Vec<f64>, Vec<f64>, Vec<f64>) {
    let closes = candles.iter().map(|c| c.close).collect();
    let highs = candles.iter().map(|c| c.high).collect();
    let lows = candles.iter().map(|c| c.low).collect();
    (closes, highs, lows)
}

/// 호가 레벨 `[가격, 수량]` (거래소 원본 문자열 유지).
pub type PriceLevel = [String; 2];

/// 호가창.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderBook {
    /// 심볼
    pub symbol: String,
    /// 매수 호가
    pub bids: Vec<PriceLevel>,
    /// 매도 호가
    pub asks: Vec<PriceLevel>,
    /// 조회 시각 (Unix 초)
    pub timestamp: i64,
    /// 거래소가 제공하는 갱신 ID
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_update_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candle(time: i64, close: f64) -> Candle {
        Candle {
            time,
            open: close,
            high: close + 1.0,
            low: close - 1.0,
            close,
            volume: 1.0,
        }
    }

    #[test]
    fn test_sort_descending_input() {
        let mut candles = vec![candle(300, 3.0), candle(100, 1.0), candle(200, 2.0)];
        sort_candles_ascending(&mut candles);

        let times: Vec<i64> = candles.iter().map(|c| c.time).collect();
        assert_eq!(times, vec![100, 200, 300]);

        let (closes, highs, lows) = split_series(&candles);
        assert_eq!(closes, vec![1.0, 2.0, 3.0]);
        assert_eq!(highs, vec![2.0, 3.0, 4.0]);
        assert_eq!(lows, vec![0.0, 1.0, 2.0]);
    }

    #[test]
    fn test_ticker_json_shape() {
        let ticker = TickerSnapshot {
            market_id: MarketId::binance_spot("BTCUSDT"),
            price: 43250.1,
            change_24h_pct: -1.25,
            volume_24h: 51_900_000.0,
            high_24h: 0.0,
            low_24h: 0.0,
            timestamp: 1_700_000_000,
        };
        let json = serde_json::to_value(&ticker).unwrap();
        assert_eq!(json["marketId"], "BI:SPOT:BTCUSDT");
        assert_eq!(json["change24hPct"], -1.25);
    }
}
