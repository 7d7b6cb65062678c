//! Binance 거래소 커넥터.
//!
//! 현물(`/api/v3`)과 USDⓈ-M 무기한 선물(`/fapi/v1`)의 공개 REST API만 사용합니다.
//! 인증이 필요한 엔드포인트는 호출하지 않습니다.

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, error};

use scalp_core::{
    Candle, CandleInterval, ExchangeConfig, ExchangeKind, MarketId, MarketKind, OrderBook,
    TickerSnapshot,
};

use super::{build_http_client, parse_f64, parse_price, trim_base};
use crate::traits::{ExchangeResult, MarketDataSource};
use crate::ExchangeError;

// ============================================================================
// 설정
// ============================================================================

/// Binance 클라이언트 설정.
#[derive(Debug, Clone)]
pub struct BinanceConfig {
    /// 현물 REST 기본 URL
    pub spot_url: String,
    /// 선물 REST 기본 URL
    pub futures_url: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for BinanceConfig {
    fn default() -> Self {
        Self {
            spot_url: "https://api.binance.com".to_string(),
            futures_url: "https://fapi.binance.com".to_string(),
            timeout_secs: 10,
        }
    }
}

impl BinanceConfig {
    /// 애플리케이션 거래소 설정에서 생성.
    pub fn from_exchange_config(config: &ExchangeConfig) -> Self {
        Self {
            spot_url: trim_base(&config.binance_spot_url),
            futures_url: trim_base(&config.binance_futures_url),
            timeout_secs: config.http_timeout_secs,
        }
    }

    /// 두 기본 URL을 같은 주소로 설정 (테스트용 목 서버).
    pub fn with_base_url(mut self, url: &str) -> Self {
        self.spot_url = trim_base(url);
        self.futures_url = trim_base(url);
        self
    }

    /// 시장 유형에 맞는 (기본 URL, API 접두사).
    fn endpoint(&self, market: MarketKind) -> (&str, &'static str) {
        match market {
            MarketKind::Spot => (&self.spot_url, "/api/v3"),
            MarketKind::Perp => (&self.futures_url, "/fapi/v1"),
        }
    }
}

// ============================================================================
// API 응답 타입
// ============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceTicker24h {
    last_price: String,
    price_change_percent: String,
    #[serde(default)]
    high_price: String,
    #[serde(default)]
    low_price: String,
    #[serde(default)]
    volume: String,
    #[serde(default)]
    quote_volume: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct BinanceDepth {
    #[serde(default)]
    last_update_id: Option<i64>,
    bids: Vec<[String; 2]>,
    asks: Vec<[String; 2]>,
}

/// 현물과 선물의 캔들 배열 형식이 같습니다.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct BinanceKline(
    i64,    // 0: Open time (ms)
    String, // 1: Open
    String, // 2: High
    String, // 3: Low
    String, // 4: Close
    String, // 5: Volume
    i64,    // 6: Close time
    String, // 7: Quote asset volume
    i64,    // 8: Number of trades
    String, // 9: Taker buy base asset volume
    String, // 10: Taker buy quote asset volume
    String, // 11: Ignore
);

impl From<BinanceKline> for Candle {
    fn from(k: BinanceKline) -> Self {
        Candle {
            time: k.0 / 1000,
            open: parse_f64(&k.1),
            high: parse_f64(&k.2),
            low: parse_f64(&k.3),
            close: parse_f64(&k.4),
            volume: parse_f64(&k.5),
        }
    }
}

#[derive(Debug, Deserialize)]
struct BinanceError {
    code: i32,
    msg: String,
}

// ============================================================================
// Binance 클라이언트
// ============================================================================

/// Binance 공개 시장 데이터 클라이언트.
#[derive(Debug, Clone)]
pub struct BinanceClient {
    config: BinanceConfig,
    client: Client,
}

impl BinanceClient {
    /// 새 Binance 클라이언트 생성.
    ///
    /// # Errors
    /// HTTP 클라이언트 생성에 실패하면 `ExchangeError::NetworkError`를 반환합니다.
    pub fn new(config: BinanceConfig) -> ExchangeResult<Self> {
        let client = build_http_client(Duration::from_secs(config.timeout_secs))?;
        Ok(Self { config, client })
    }

    fn check_market(market: &MarketId) -> ExchangeResult<()> {
        if market.exchange != ExchangeKind::Binance {
            return Err(ExchangeError::NotSupported(format!(
                "binance client cannot serve {}",
                market
            )));
        }
        Ok(())
    }

    /// 공개 API GET 요청.
    async fn public_get<T: DeserializeOwned>(
        &self,
        market: MarketKind,
        path: &str,
        params: &[(&str, String)],
    ) -> ExchangeResult<T> {
        let (base, prefix) = self.config.endpoint(market);
        let url = format!("{}{}{}", base, prefix, path);

        debug!(url = %url, ?params, "GET");

        let response = self.client.get(&url).query(params).send().await?;
        self.handle_response(response).await
    }

    /// API 응답 처리.
    async fn handle_response<T: DeserializeOwned>(
        &self,
        response: reqwest::Response,
    ) -> ExchangeResult<T> {
        let status = response.status();
        let body = response.text().await?;

        if status.is_success() {
            return serde_json::from_str(&body).map_err(|e| {
                error!("Failed to parse response: {} - Body: {}", e, body);
                ExchangeError::ParseError(e.to_string())
            });
        }

        if status.as_u16() == 429 || status.as_u16() == 418 {
            return Err(ExchangeError::RateLimited);
        }

        match serde_json::from_str::<BinanceError>(&body) {
            Ok(err) => Err(Self::map_error_code(err.code, &err.msg)),
            Err(_) => Err(ExchangeError::HttpStatus {
                status: status.as_u16(),
                body,
            }),
        }
    }

    /// Binance 에러 코드를 ExchangeError로 매핑.
    fn map_error_code(code: i32, msg: &str) -> ExchangeError {
        match code {
            -1003 => ExchangeError::RateLimited,
            -1121 => ExchangeError::SymbolNotFound(msg.to_string()),
            _ => ExchangeError::ApiError {
                code,
                message: msg.to_string(),
            },
        }
    }

    async fn ticker_24h(&self, market: &MarketId) -> ExchangeResult<BinanceTicker24h> {
        Self::check_market(market)?;
        self.public_get(
            market.market,
            "/ticker/24hr",
            &[("symbol", market.symbol.clone())],
        )
        .await
    }
}

#[async_trait]
impl MarketDataSource for BinanceClient {
    fn name(&self) -> &str {
        "binance"
    }

    async fn fetch_ticker(&self, market: &MarketId) -> ExchangeResult<TickerSnapshot> {
        let resp = self.ticker_24h(market).await?;

        Ok(TickerSnapshot {
            market_id: market.clone(),
            price: parse_price("lastPrice", &resp.last_price)?,
            change_24h_pct: parse_f64(&resp.price_change_percent),
            volume_24h: parse_f64(&resp.quote_volume),
            high_24h: parse_f64(&resp.high_price),
            low_24h: parse_f64(&resp.low_price),
            timestamp: Utc::now().timestamp(),
        })
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
            ("symbol", market.symbol.clone()),
            ("interval", interval.binance_code().to_string()),
            ("limit", limit.to_string()),
        ];
        if let Some(end) = end_time.filter(|t| *t > 0) {
            params.push(("endTime", (end * 1000).to_string()));
        }

        let resp: Vec<BinanceKline> = self.public_get(market.market, "/klines", &params).await?;

        Ok(resp.into_iter().map(Candle::from).collect())
    }

    async fn fetch_orderbook(&self, market: &MarketId, limit: u32) -> ExchangeResult<OrderBook> {
        Self::check_market(market)?;

        let resp: BinanceDepth = self
            .public_get(
                market.market,
                "/depth",
                &[
                    ("symbol", market.symbol.clone()),
                    ("limit", limit.to_string()),
                ],
            )
            .await?;

        Ok(OrderBook {
            symbol: market.symbol.clone(),
            bids: resp.bids,
            asks: resp.asks,
            timestamp: Utc::now().timestamp(),
            last_update_id: resp.last_update_id,
        })
    }

    async fn fetch_base_volume(&self, market: &MarketId) -> ExchangeResult<f64> {
        let resp = self.ticker_24h(market).await?;
        Ok(parse_f64(&resp.volume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kline_conversion() {
        let raw = r#"[1700000000000,"1.0","2.0","0.5","1.5","10.0",1700003599999,"15.0",42,"5.0","7.5","0"]"#;
        let kline: BinanceKline = serde_json::from_str(raw).unwrap();
        let candle = Candle::from(kline);

        assert_eq!(candle.time, 1_700_000_000);
        assert_eq!(candle.high, 2.0);
        assert_eq!(candle.close, 1.5);
        assert_eq!(candle.volume, 10.0);
    }

    #[test]
    fn test_endpoint_by_market() {
        let config = BinanceConfig::default();
        assert_eq!(
            config.endpoint(MarketKind::Spot),
            ("https://api.binance.com", "/api/v3")
        );
        assert_eq!(
            config.endpoint(MarketKind::Perp),
            ("https://fapi.binance.com", "/fapi/v1")
        );
    }

    #[test]
    fn test_error_code_mapping() {
        assert!(matches!(
            BinanceClient::map_error_code(-1121, "Invalid symbol."),
            ExchangeError::SymbolNotFound(_)
        ));
        assert!(matches!(
            BinanceClient::map_error_code(-1003, "Too many requests"),
            ExchangeError::RateLimited
        ));
    }

    #[tokio::test]
    async fn test_rejects_other_exchange() {
        let client = BinanceClient::new(BinanceConfig::default()).unwrap();
        let market = MarketId::parse("BY:SPOT:BTCUSDT").unwrap();
        let err = client.fetch_ticker(&market).await.unwrap_err();
        assert!(matches!(err, ExchangeError::NotSupported(_)));
    }
}
