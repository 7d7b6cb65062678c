//! Bybit 거래소 커넥터.
//!
//! v5 공개 시장 API (`/v5/market/*`)를 사용합니다.
//! 현물은 `category=spot`, 무기한 선물은 `category=linear`입니다.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, warn};

use scalp_core::{
    sort_candles_ascending, Candle, CandleInterval, ExchangeConfig, ExchangeKind, MarketId,
    MarketKind, OrderBook, TickerSnapshot,
};

use super::{build_http_client, parse_f64, parse_price, trim_base};
use crate::traits::{ExchangeResult, MarketDataSource};
use crate::ExchangeError;

/// Bybit 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BybitConfig {
    /// REST 기본 URL
    pub base_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for BybitConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.bybit.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BybitConfig {
    /// 애플리케이션 거래소 설정에서 생성.
    pub fn from_exchange_config(config: &ExchangeConfig) -> Self {
        Self {
            base_url: trim_base(&config.bybit_url),
            timeout_secs: config.http_timeout_secs,
        }
    }

    /// 기본 URL 변경.
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.base_url = trim_base(url);
        self
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

/// 모든 v5 응답의 공통 봉투.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitEnvelope<T> {
    ret_code: i32,
    #[serde(default)]
    ret_msg: String,
    result: Option<T>,
}

#[derive(Debug, Deserialize)]
struct BybitList<T> {
    #[serde(default = "Vec::new")]
    list: Vec<T>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BybitTicker {
    last_price: String,
    #[serde(default)]
    price_24h_pcnt: String,
    #[serde(default)]
    turnover_24h: String,
    #[serde(default)]
    volume_24h: String,
    #[serde(default)]
    high_price_24h: String,
    #[serde(default)]
    low_price_24h: String,
}

#[derive(Debug, Deserialize)]
struct BybitOrderBook {
    #[serde(default)]
    b: Vec<[String; 2]>,
    #[serde(default)]
    a: Vec<[String; 2]>,
    #[serde(default)]
    u: Option<i64>,
}

impl BybitTicker {
    fn to_snapshot(&self, market: &MarketId) -> ExchangeResult<TickerSnapshot> {
        Ok(TickerSnapshot {
            market_id: market.clone(),
            price: parse_price("lastPrice", &self.last_price)?,
            change_24h_pct: parse_f64(&self.price_24h_pcnt) * 100.0,
            volume_24h: parse_f64(&self.turnover_24h),
            high_24h: parse_f64(&self.high_price_24h),
            low_24h: parse_f64(&self.low_price_24h),
            timestamp: Utc::now().timestamp(),
        })
    }
}

/// `[start(ms), open, high, low, close, volume, turnover]` 행을 캔들로 변환.
///
/// 필드가 6개 미만인 행은 버립니다.
fn parse_kline_row(row: &[String]) -> Option<Candle> {
    if row.len() < 6 {
        return None;
    }
    let start_ms: i64 = row[0].trim().parse().ok()?;
    Some(Candle {
        time: start_ms / 1000,
        open: parse_f64(&row[1]),
        high: parse_f64(&row[2]),
        low: parse_f64(&row[3]),
        close: parse_f64(&row[4]),
        volume: parse_f64(&row[5]),
    })
}

// ============================================================================
// Bybit 클라이언트
// ============================================================================

/// Bybit 공개 시장 데이터 클라이언트.
#[derive(Debug, Clone)]
pub struct BybitClient {
    config: BybitConfig,
    client: Client,
}

impl BybitClient {
    /// 새 Bybit 클라이언트 생성.
    pub fn new(config: BybitConfig) -> ExchangeResult<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    fn category(market: MarketKind) -> &'static str {
        match market {
            MarketKind::Spot => "spot",
            MarketKind::Perp => "linear",
        }
    }

    fn check_market(market: &MarketId) -> ExchangeResult<()> {
        if market.exchange != ExchangeKind::Bybit {
            return Err(ExchangeError::NotSupported(format!(
                "bybit client cannot serve {}",
                market
            )));
        }
        Ok(())
    }

    /// v5 공개 API GET 요청. `retCode != 0`이면 에러.
    async fn public_get<T: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let url = format!("{}/v5/market{}", self.config.base_url, path);

        debug!(url = %url, ?params, "GET");

        let response = self.client.get(&url).query(params).send().await?;
        let status = response.status();
        let body = response.text().await?;

        if status.as_u16() == 429 {
            return Err(ExchangeError::RateLimited);
        }
        if !status.is_success() {
            return Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: BybitEnvelope<T> = serde_json::from_str(&body)?;
        if envelope.ret_code != 0 {
            return Err(match envelope.ret_code {
                10006 => ExchangeError::RateLimited,
                code => ExchangeError::ApiError {
                    code,
                    message: envelope.ret_msg,
                },
            });
        }

        envelope
            .result
            .ok_or_else(|| ExchangeError::ParseError("missing result".to_string()))
    }

    /// 첫 번째 시세 행. 목록이 비어 있으면 `SymbolNotFound`.
    async fn first_ticker(&self, market: &MarketId) -> ExchangeResult<BybitTicker> {
        Self::check_market(market)?;

        let resp: BybitList<BybitTicker> = self
            .public_get(
                "/tickers",
                &[
                    ("category", Self::category(market.market).to_string()),
                    ("symbol", market.symbol.clone()),
                ],
            )
            .await?;

        resp.list.into_iter().next().ok_or_else(|| {
            warn!(market_id = %market, "Bybit returned an empty ticker list");
            ExchangeError::SymbolNotFound(market.to_string())
        })
    }
}

#[async_trait]
impl MarketDataSource for BybitClient {
    fn name(&self) -> &str {
        "bybit"
    }

    async fn fetch_ticker(&self, market: &MarketId) -> ExchangeResult<TickerSnapshot> {
        self.first_ticker(market).await?.to_snapshot(market)
    }

    async fn fetch_candles(
        &self,
        market: &MarketId,
        interval: CandleInterval,
        limit: u32,
        end_time: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>> {
        Self::check_market(market)?;

        let mut params = vec![
            ("category", Self::category(market.market).to_string()),
            ("symbol", market.symbol.clone()),
            ("interval", interval.bybit_code().to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end) = end_time.filter(|t| *t > 0) {
            params.push(("end", (end * 1000).to_string()));
        }

        let resp: BybitList<Vec<String>> = self.public_get("/kline", &params).await?;

        // Bybit은 최신순으로 반환
        let mut candles: Vec<Candle> = resp
            .list
            .iter()
            .filter_map(|row| parse_kline_row(row))
            .collect();
        sort_candles_ascending(&mut candles);

        Ok(candles)
    }

    async fn fetch_orderbook(&self, market: &MarketId, limit: u32) -> ExchangeResult<OrderBook> {
        Self::check_market(market)?;

        let resp: BybitOrderBook = self
            .public_get(
                "/orderbook",
                &[
                    ("category", Self::category(market.market).to_string()),
                    ("symbol", market.symbol.clone()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(OrderBook {
            symbol: market.symbol.clone(),
            bids: resp.b,
            asks: resp.a,
            timestamp: Utc::now().timestamp(),
            last_update_id: resp.u,
        })
    }

    async fn fetch_base_volume(&self, market: &MarketId) -> ExchangeResult<f64> {
        let ticker = self.first_ticker(market).await?;
        Ok(parse_f64(&ticker.volume_24h))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kline_row_parsing() {
        let row: Vec<String> = ["1700000000000", "1", "2", "0.5", "1.5", "100", "150"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let candle = parse_kline_row(&row).unwrap();
        assert_eq!(candle.time, 1_700_000_000);
        assert_eq!(candle.low, 0.5);

        assert!(parse_kline_row(&row[..5]).is_none());
    }

    #[test]
    fn test_ticker_percent_scaling() {
        let ticker: BybitTicker = serde_json::from_str(
            r#"{"lastPrice":"100","price24hPcnt":"0.0123","turnover24h":"5000","volume24h":"50"}"#,
        )
        .unwrap();
        let snapshot = ticker
            .to_snapshot(&MarketId::parse("BY:PERP:BTCUSDT").unwrap())
            .unwrap();
        assert_eq!(snapshot.price, 100.0);
        assert!((snapshot.change_24h_pct - 1.23).abs() < 1e-12);
        assert_eq!(snapshot.volume_24h, 5000.0);
        assert_eq!(snapshot.high_24h, 0.0);
    }

    #[test]
    fn test_malformed_last_price_is_rejected() {
        let ticker: BybitTicker =
            serde_json::from_str(r#"{"lastPrice":"","price24hPcnt":"0.01"}"#).unwrap();
        let result = ticker.to_snapshot(&MarketId::parse("BY:SPOT:BTCUSDT").unwrap());
        assert!(matches!(result, Err(ExchangeError::ParseError(_))));
    }

    #[test]
    fn test_category() {
        assert_eq!(BybitClient::category(MarketKind::Spot), "spot");
        assert_eq!(BybitClient::category(MarketKind::Perp), "linear");
    }
}
