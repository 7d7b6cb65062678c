//! 마켓 endpoint.
//!
//! 활성 코인 하나당 거래소 × 시장 유형 네 가지 마켓을 노출합니다.
//!
//! - `GET /api/markets?query&exchange&type` - 마켓 목록
//! - `GET /api/markets/{marketId}/metrics` - 가격, 변동률, 거래대금, NATR(5m, 14)

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use scalp_analytics::natr14;
use scalp_core::{
    sort_candles_ascending, split_series, CandleInterval, ExchangeKind, MarketId, MarketKind,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::error::{ApiError, ApiResult};
use crate::repository::{CoinListQuery, CoinRepository};
use crate::state::AppState;

/// 무기한 선물 펀딩 주기 (8시간).
const FUNDING_INTERVAL_SECS: i64 = 8 * 60 * 60;

/// 목록 노출 순서.
const VARIANTS: [(ExchangeKind, MarketKind); 4] = [
    (ExchangeKind::Binance, MarketKind::Perp),
    (ExchangeKind::Binance, MarketKind::Spot),
    (ExchangeKind::Bybit, MarketKind::Perp),
    (ExchangeKind::Bybit, MarketKind::Spot),
];

// ================================================================================================
// Types
// ================================================================================================

#[derive(Debug, Default, Deserialize)]
pub struct MarketListParams {
    pub query: Option<String>,
    pub exchange: Option<String>,
    #[serde(rename = "type")]
    pub market_type: Option<String>,
}

/// 마켓 항목.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketItem {
    pub market_id: String,
    pub coin_id: i32,
    pub symbol: String,
    pub base: String,
    pub quote: String,
    pub exchange: String,
    pub exchange_tag: String,
    /// "Perpetual" | "Spot"
    pub market_type: String,
    /// BI-F, BI-S, BY-F, BY-S
    pub contract_tag: String,
    pub ws_stream_id: String,
    pub price_precision: u32,
    pub qty_precision: u32,
    pub tick_size: String,
    pub lot_size: String,
    pub funding_interval_sec: Option<i64>,
    pub is_active: bool,
}

impl MarketItem {
    pub fn new(exchange: ExchangeKind, market: MarketKind, coin_id: i32, symbol: &str) -> Self {
        let (base, quote) = split_base_quote(symbol);
        let contract_suffix = match market {
            MarketKind::Perp => "F",
            MarketKind::Spot => "S",
        };
        let market_type = market.display_name();

        Self {
            market_id: MarketId::new(exchange, market, symbol).to_string(),
            coin_id,
            symbol: symbol.to_string(),
            base: base.to_string(),
            quote: quote.to_string(),
            exchange: exchange.name().to_string(),
            exchange_tag: exchange.tag().to_string(),
            market_type: market_type.to_string(),
            contract_tag: format!("{}-{}", exchange.tag(), contract_suffix),
            ws_stream_id: format!(
                "{}.{}.ticker.{}",
                exchange.name(),
                market_type.to_ascii_lowercase(),
                symbol.to_ascii_lowercase()
            ),
            price_precision: 2,
            qty_precision: 2,
            tick_size: "0.01".to_string(),
            lot_size: "0.01".to_string(),
            funding_interval_sec: matches!(market, MarketKind::Perp)
                .then_some(FUNDING_INTERVAL_SECS),
            is_active: true,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MarketListResponse {
    pub data: Vec<MarketItem>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketMetrics {
    pub market_id: String,
    pub price: f64,
    pub change_today_pct: f64,
    pub volume_24h: f64,
    #[serde(rename = "natr5m14")]
    pub natr_5m_14: f64,
}

/// `USDT`/`USD` 접미사로 기초/호가 자산을 나눕니다. 둘 다 아니면 호가는 빈 문자열.
pub fn split_base_quote(symbol: &str) -> (&str, &str) {
    if let Some(base) = symbol.strip_suffix("USDT") {
        (base, "USDT")
    } else if let Some(base) = symbol.strip_suffix("USD") {
        (base, "USD")
    } else {
        (symbol, "")
    }
}

/// 목록 필터.
#[derive(Debug, Default)]
struct MarketFilter {
    query: String,
    exchange: String,
    market: Option<MarketKind>,
}

impl MarketFilter {
    fn from_params(params: &MarketListParams) -> Self {
        Self {
            query: params
                .query
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_ascii_uppercase(),
            exchange: params
                .exchange
                .as_deref()
                .unwrap_or_default()
                .trim()
                .to_ascii_lowercase(),
            // 모르는 유형은 무시
            market: params
                .market_type
                .as_deref()
                .and_then(|t| MarketKind::from_filter(t.trim())),
        }
    }

    fn matches_symbol(&self, symbol: &str, base: &str) -> bool {
        self.query.is_empty() || symbol.contains(&self.query) || base.contains(&self.query)
    }

    fn matches_variant(&self, exchange: ExchangeKind, market: MarketKind) -> bool {
        let exchange_ok = self.exchange.is_empty()
            || self.exchange == exchange.name()
            || self.exchange == exchange.tag().to_ascii_lowercase();
        let market_ok = self.market.map_or(true, |m| m == market);
        exchange_ok && market_ok
    }
}

/// 코인 목록에서 마켓 항목을 만듭니다.
fn build_markets<'a>(
    coins: impl IntoIterator<Item = (i32, &'a str)>,
    filter: &MarketFilter,
) -> Vec<MarketItem> {
    let mut out = Vec::new();

    for (coin_id, raw_symbol) in coins {
        let symbol = raw_symbol.trim().to_ascii_uppercase();
        if symbol.is_empty() {
            continue;
        }

        let (base, _) = split_base_quote(&symbol);
        if !filter.matches_symbol(&symbol, base) {
            continue;
        }

        out.extend(
            VARIANTS
                .iter()
                .filter(|(exchange, market)| filter.matches_variant(*exchange, *market))
                .map(|(exchange, market)| MarketItem::new(*exchange, *market, coin_id, &symbol)),
        );
    }

    out
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/markets
async fn list_markets(
    State(state): State<Arc<AppState>>,
    Query(params): Query<MarketListParams>,
) -> ApiResult<Json<MarketListResponse>> {
    let coins = CoinRepository::list_active(state.db()?, &CoinListQuery::new(2000, 0, "symbol", "asc"))
        .await
        .map_err(|e| {
            warn!("Failed to fetch markets: {}", e);
            ApiError::internal("Failed to fetch markets")
        })?;

    let filter = MarketFilter::from_params(&params);
    let data = build_markets(coins.iter().map(|c| (c.id, c.symbol.as_str())), &filter);
    debug!(count = data.len(), "Markets listed");

    Ok(Json(MarketListResponse { data }))
}

/// GET /api/markets/{marketId}/metrics
async fn get_metrics(
    State(state): State<Arc<AppState>>,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<MarketMetrics>> {
    let market = MarketId::parse(&raw_id).map_err(|_| ApiError::bad_request("Invalid marketId"))?;

    let ticker = state.market.fetch_ticker(&market).await.map_err(|e| {
        debug!(market_id = %market, "Ticker fetch failed: {}", e);
        ApiError::bad_request(format!("Failed to fetch ticker: {}", e))
    })?;

    let mut candles = state
        .market
        .fetch_candles(&market, CandleInterval::M5, 80, None)
        .await
        .map_err(|e| {
            debug!(market_id = %market, "Candle fetch failed: {}", e);
            ApiError::bad_request(format!("Failed to fetch candles: {}", e))
        })?;

    sort_candles_ascending(&mut candles);
    let (closes, highs, lows) = split_series(&candles);

    Ok(Json(MarketMetrics {
        market_id: raw_id,
        price: ticker.price,
        change_today_pct: ticker.change_24h_pct,
        volume_24h: ticker.volume_24h,
        natr_5m_14: natr14(&highs, &lows, &closes),
    }))
}

/// 마켓 라우터 생성.
pub fn markets_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_markets))
        .route("/{market_id}/metrics", get(get_metrics))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use tower::ServiceExt;

    fn filter(query: &str, exchange: &str, market_type: &str) -> MarketFilter {
        let opt = |s: &str| (!s.is_empty()).then(|| s.to_string());
        MarketFilter::from_params(&MarketListParams {
            query: opt(query),
            exchange: opt(exchange),
            market_type: opt(market_type),
        })
    }

    #[test]
    fn test_split_base_quote() {
        assert_eq!(split_base_quote("BTCUSDT"), ("BTC", "USDT"));
        assert_eq!(split_base_quote("ETHUSD"), ("ETH", "USD"));
        assert_eq!(split_base_quote("ETHBTC"), ("ETHBTC", ""));
    }

    #[test]
    fn test_variant_order_and_fields() {
        let items = build_markets([(7, "btcusdt")], &MarketFilter::default());
        let ids: Vec<&str> = items.iter().map(|m| m.market_id.as_str()).collect();
        assert_eq!(
            ids,
            vec![
                "BI:PERP:BTCUSDT",
                "BI:SPOT:BTCUSDT",
                "BY:PERP:BTCUSDT",
                "BY:SPOT:BTCUSDT"
            ]
        );

        let perp = &items[0];
        assert_eq!(perp.contract_tag, "BI-F");
        assert_eq!(perp.market_type, "Perpetual");
        assert_eq!(perp.ws_stream_id, "binance.perpetual.ticker.btcusdt");
        assert_eq!(perp.funding_interval_sec, Some(28800));
        assert_eq!(perp.base, "BTC");
        assert_eq!(perp.coin_id, 7);

        let spot = &items[3];
        assert_eq!(spot.contract_tag, "BY-S");
        assert_eq!(spot.ws_stream_id, "bybit.spot.ticker.btcusdt");
        assert_eq!(spot.funding_interval_sec, None);

        let json = serde_json::to_value(spot).unwrap();
        assert!(json["fundingIntervalSec"].is_null());
        assert_eq!(json["tickSize"], "0.01");
    }

    #[test]
    fn test_filters() {
        let coins = [(1, "BTCUSDT"), (2, "ETHUSDT"), (3, " ")];

        assert_eq!(build_markets(coins, &filter("eth", "", "")).len(), 4);
        assert_eq!(build_markets(coins, &filter("", "bybit", "")).len(), 4);
        assert_eq!(build_markets(coins, &filter("", "BY", "")).len(), 4);

        let futures = build_markets(coins, &filter("", "", "futures"));
        assert_eq!(futures.len(), 4);
        assert!(futures.iter().all(|m| m.market_type == "Perpetual"));

        let spot_bi = build_markets(coins, &filter("BTC", "binance", "spot"));
        assert_eq!(spot_bi.len(), 1);
        assert_eq!(spot_bi[0].market_id, "BI:SPOT:BTCUSDT");

        // 모르는 유형은 무시
        assert_eq!(build_markets(coins, &filter("", "", "options")).len(), 8);
    }

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = markets_router().with_state(Arc::new(create_test_state()));
        let response = app
            .oneshot(Request::get(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_metrics() {
        let (status, body) = get_json("/BY:PERP:SOLUSDT/metrics").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["marketId"], "BY:PERP:SOLUSDT");
        assert_eq!(body["price"], 100.0);
        assert_eq!(body["changeTodayPct"], 2.5);
        assert!(body["natr5m14"].as_f64().unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_metrics_errors() {
        let (status, body) = get_json("/BTCUSDT/metrics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid marketId");

        let (status, body) = get_json("/BI:SPOT:FAILUSDT/metrics").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Failed to fetch ticker: Symbol not found: FAILUSDT");
    }
}
