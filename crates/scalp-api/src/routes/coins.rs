//! 코인 endpoint.
//!
//! - `GET /api/coins` - 활성 코인 목록 (실시간 시세 포함)
//! - `GET /api/coins/{symbol}` - 코인 상세
//! - `GET /api/coins/{symbol}/candles` - 캔들
//! - `GET /api/coins/{symbol}/orderbook` - 호가창
//! - `GET /api/coins/{symbol}/analysis` - 기술적 분석

use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use futures::future::join_all;
use scalp_core::{Candle, CandleInterval, ExchangeKind, MarketId, MarketKind, OrderBook};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

use super::analysis::get_analysis;
use super::clamp_limit;
use crate::error::{ApiError, ApiResult};
use crate::repository::{CoinListQuery, CoinRecord, CoinRepository};
use crate::services::market_data::ticker_with_cache;
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinListParams {
    pub limit: Option<i64>,
    pub page: Option<i64>,
    pub sort_by: Option<String>,
    pub sort_order: Option<String>,
    pub exchange: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExchangeParams {
    pub exchange: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CandleParams {
    pub interval: Option<String>,
    pub limit: Option<i64>,
    pub exchange: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OrderBookParams {
    pub limit: Option<i64>,
    pub exchange: Option<String>,
}

/// 실시간 시세 필드.
#[derive(Debug, Clone, Copy, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarketFields {
    pub price: f64,
    pub change_24h: f64,
    pub volume_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
}

/// 시세가 붙은 코인.
#[derive(Debug, Serialize)]
pub struct CoinWithMarketData {
    #[serde(flatten)]
    pub coin: CoinRecord,
    #[serde(flatten)]
    pub market: MarketFields,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CoinListResponse {
    pub data: Vec<CoinWithMarketData>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

#[derive(Debug, Serialize)]
pub struct CoinDetailResponse {
    pub id: i32,
    pub symbol: String,
    pub name: String,
    pub exchange: String,
    #[serde(flatten)]
    pub market: MarketFields,
}

#[derive(Debug, Serialize)]
pub struct CandlesResponse {
    pub symbol: String,
    pub interval: String,
    pub candles: Vec<Candle>,
}

/// `exchange` 쿼리 값. 없거나 모르는 값이면 Binance.
pub(crate) fn exchange_param(value: Option<&str>) -> ExchangeKind {
    value
        .and_then(|v| ExchangeKind::from_name(v).ok())
        .unwrap_or(ExchangeKind::Binance)
}

/// 현물 시세 조회. 실패하면 0으로 채웁니다.
async fn market_fields(state: &AppState, exchange: ExchangeKind, symbol: &str) -> MarketFields {
    let market = MarketId::new(exchange, MarketKind::Spot, symbol);
    match ticker_with_cache(state.market.as_ref(), state.cache.as_deref(), &market).await {
        Ok(ticker) => MarketFields {
            price: ticker.price,
            change_24h: ticker.change_24h_pct,
            volume_24h: ticker.volume_24h,
            high_24h: ticker.high_24h,
            low_24h: ticker.low_24h,
        },
        Err(e) => {
            debug!(market_id = %market, "Ticker unavailable: {}", e);
            MarketFields::default()
        }
    }
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/coins
async fn list_coins(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CoinListParams>,
) -> ApiResult<Json<CoinListResponse>> {
    let limit = clamp_limit(params.limit, 50, 100);
    let page = params.page.filter(|p| *p > 0).unwrap_or(1);
    let query = CoinListQuery::new(
        limit,
        (page - 1) * limit,
        params.sort_by.as_deref().unwrap_or("symbol"),
        params.sort_order.as_deref().unwrap_or("asc"),
    );
    let exchange = exchange_param(params.exchange.as_deref());

    let pool = state.db()?;
    let total = CoinRepository::count_active(pool).await?;
    let coins = CoinRepository::list_active(pool, &query).await.map_err(|e| {
        warn!("Failed to fetch coins: {}", e);
        ApiError::internal("Failed to fetch coins")
    })?;

    let markets = join_all(
        coins
            .iter()
            .map(|coin| market_fields(&state, exchange, &coin.symbol)),
    )
    .await;

    let data = coins
        .into_iter()
        .zip(markets)
        .map(|(coin, market)| CoinWithMarketData { coin, market })
        .collect();

    Ok(Json(CoinListResponse {
        data,
        total,
        page,
        page_size: limit,
    }))
}

/// GET /api/coins/{symbol}
async fn get_coin(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<ExchangeParams>,
) -> ApiResult<Json<CoinDetailResponse>> {
    let coin = CoinRepository::find_by_symbol(state.db()?, &symbol)
        .await?
        .ok_or_else(|| ApiError::not_found("Coin not found"))?;

    let exchange = exchange_param(params.exchange.as_deref());
    let market = market_fields(&state, exchange, &coin.symbol).await;

    Ok(Json(CoinDetailResponse {
        id: coin.id,
        symbol: coin.symbol,
        name: coin.name,
        exchange: coin.exchange,
        market,
    }))
}

/// GET /api/coins/{symbol}/candles
async fn get_candles(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<CandleParams>,
) -> ApiResult<Json<CandlesResponse>> {
    let interval = parse_interval(params.interval.as_deref())?;
    let limit = clamp_limit(params.limit, 100, 500) as u32;
    let market = MarketId::new(
        exchange_param(params.exchange.as_deref()),
        MarketKind::Spot,
        &symbol,
    );

    let candles = state
        .market
        .fetch_candles(&market, interval, limit, None)
        .await
        .map_err(|e| {
            warn!(market_id = %market, "Failed to fetch candles: {}", e);
            ApiError::Upstream(format!("Failed to fetch candles: {}", e))
        })?;

    Ok(Json(CandlesResponse {
        symbol,
        interval: interval.to_string(),
        candles,
    }))
}

/// GET /api/coins/{symbol}/orderbook
async fn get_orderbook(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<OrderBookParams>,
) -> ApiResult<Json<OrderBook>> {
    let limit = clamp_limit(params.limit, 20, 100) as u32;
    let market = MarketId::new(
        exchange_param(params.exchange.as_deref()),
        MarketKind::Spot,
        &symbol,
    );

    let orderbook = state
        .market
        .fetch_orderbook(&market, limit)
        .await
        .map_err(|e| {
            warn!(market_id = %market, "Failed to fetch orderbook: {}", e);
            ApiError::Upstream(format!("Failed to fetch orderbook: {}", e))
        })?;

    Ok(Json(orderbook))
}

/// `interval` 쿼리 값. 없으면 1h.
pub(crate) fn parse_interval(value: Option<&str>) -> ApiResult<CandleInterval> {
    match value {
        None | Some("") => Ok(CandleInterval::default()),
        Some(raw) => raw
            .parse()
            .map_err(|_| ApiError::bad_request(format!("Invalid interval: {}", raw))),
    }
}

/// 코인 라우터 생성.
pub fn coins_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_coins))
        .route("/{symbol}", get(get_coin))
        .route("/{symbol}/candles", get(get_candles))
        .route("/{symbol}/orderbook", get(get_orderbook))
        .route("/{symbol}/analysis", get(get_analysis))
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

    async fn get_json(uri: &str) -> (StatusCode, serde_json::Value) {
        let app = coins_router().with_state(Arc::new(create_test_state()));
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

    #[test]
    fn test_exchange_param_defaults_to_binance() {
        assert_eq!(exchange_param(None), ExchangeKind::Binance);
        assert_eq!(exchange_param(Some("bybit")), ExchangeKind::Bybit);
        assert_eq!(exchange_param(Some("kraken")), ExchangeKind::Binance);
    }

    #[tokio::test]
    async fn test_candles_defaults() {
        let (status, body) = get_json("/BTCUSDT/candles").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "BTCUSDT");
        assert_eq!(body["interval"], "1h");
        assert_eq!(body["candles"].as_array().unwrap().len(), 100);
        assert!(body["candles"][0]["time"].is_i64());
    }

    #[tokio::test]
    async fn test_candles_limit_capped() {
        let (_, body) = get_json("/BTCUSDT/candles?limit=9999&interval=5m").await;
        assert_eq!(body["interval"], "5m");
        assert_eq!(body["candles"].as_array().unwrap().len(), 500);
    }

    #[tokio::test]
    async fn test_candles_upstream_failure() {
        let (status, body) = get_json("/FAILUSDT/candles").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch candles: Network error: stub");
    }

    #[tokio::test]
    async fn test_orderbook_upstream_failure() {
        let (status, body) = get_json("/FAILUSDT/orderbook").await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Failed to fetch orderbook: Rate limit exceeded");
    }

    #[tokio::test]
    async fn test_orderbook() {
        let (status, body) = get_json("/ethusdt/orderbook?limit=5").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["symbol"], "ETHUSDT");
        assert_eq!(body["bids"][0][0], "99.9");
    }

    #[tokio::test]
    async fn test_list_without_database() {
        let (status, body) = get_json("/").await;
        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
        assert_eq!(body["error"], "Database not available");
    }

    #[test]
    fn test_coin_with_market_is_flat() {
        let now = chrono::Utc::now();
        let coin = CoinWithMarketData {
            coin: CoinRecord {
                id: 1,
                symbol: "BTCUSDT".into(),
                exchange: "binance".into(),
                name: "Bitcoin".into(),
                logo_url: String::new(),
                decimals: 8,
                is_active: true,
                created_at: now,
                updated_at: now,
            },
            market: MarketFields {
                price: 50000.0,
                change_24h: 1.5,
                ..Default::default()
            },
        };

        let json = serde_json::to_value(&coin).unwrap();
        assert_eq!(json["symbol"], "BTCUSDT");
        assert_eq!(json["price"], 50000.0);
        assert_eq!(json["change24h"], 1.5);
        assert_eq!(json["volume24h"], 0.0);
    }
}
