//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! `Arc<AppState>`로 래핑되어 Axum의 State extractor로 주입됩니다.

use scalp_core::AppConfig;
use scalp_exchange::MarketDataSource;
use sqlx::PgPool;
use std::sync::Arc;

use crate::ai::AiClient;
use crate::cache::RedisCache;
use crate::error::{ApiError, ApiResult};
use crate::websocket::SharedHub;

/// 애플리케이션 공유 상태.
#[derive(Clone)]
pub struct AppState {
    /// 데이터베이스 연결 풀 (없으면 DB 기반 라우트는 503)
    pub db_pool: Option<PgPool>,

    /// 시세 캐시 (없으면 거래소 직접 조회)
    pub cache: Option<Arc<RedisCache>>,

    /// 거래소 시장 데이터 소스
    pub market: Arc<dyn MarketDataSource>,

    /// WebSocket 구독 허브
    pub hub: SharedHub,

    /// AI 제공자 클라이언트
    pub ai: AiClient,

    /// 설정
    pub config: Arc<AppConfig>,

    /// 서버 시작 시간
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        market: Arc<dyn MarketDataSource>,
        hub: SharedHub,
        ai: AiClient,
    ) -> Self {
        Self {
            db_pool: None,
            cache: None,
            market,
            hub,
            ai,
            config: Arc::new(config),
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 데이터베이스 연결 풀 설정.
    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    /// Redis 캐시 설정.
    pub fn with_cache(mut self, cache: RedisCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    /// 데이터베이스 풀 (미연결이면 503).
    pub fn db(&self) -> ApiResult<&PgPool> {
        self.db_pool.as_ref().ok_or_else(ApiError::database_unavailable)
    }

    /// JWT 서명 비밀키.
    pub fn jwt_secret(&self) -> &str {
        &self.config.auth.jwt_secret
    }

    /// 데이터베이스 연결 상태 확인.
    pub async fn is_db_healthy(&self) -> bool {
        match &self.db_pool {
            Some(pool) => sqlx::query("SELECT 1").execute(pool).await.is_ok(),
            None => false,
        }
    }

    /// Redis 연결 상태 확인.
    pub async fn is_cache_healthy(&self) -> bool {
        match &self.cache {
            Some(cache) => cache.health_check().await.unwrap_or(false),
            None => false,
        }
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }
}

/// 고정 시세를 돌려주는 테스트용 데이터 소스.
///
/// 심볼이 `FAIL`로 시작하면 조회 에러를 반환합니다.
#[cfg(test)]
pub struct StubMarket;

#[cfg(test)]
#[async_trait::async_trait]
impl MarketDataSource for StubMarket {
    fn name(&self) -> &str {
        "stub"
    }

    async fn fetch_ticker(
        &self,
        market: &scalp_core::MarketId,
    ) -> scalp_exchange::ExchangeResult<scalp_core::TickerSnapshot> {
        if market.symbol.starts_with("FAIL") {
            return Err(scalp_exchange::ExchangeError::SymbolNotFound(market.symbol.clone()));
        }
        Ok(scalp_core::TickerSnapshot {
            market_id: market.clone(),
            price: 100.0,
            change_24h_pct: 2.5,
            volume_24h: 1_000_000.0,
            high_24h: 105.0,
            low_24h: 95.0,
            timestamp: 1_700_000_000,
        })
    }

    async fn fetch_candles(
        &self,
        market: &scalp_core::MarketId,
        _interval: scalp_core::CandleInterval,
        limit: u32,
        _end_time: Option<i64>,
    ) -> scalp_exchange::ExchangeResult<Vec<scalp_core::Candle>> {
        if market.symbol.starts_with("FAIL") {
            return Err(scalp_exchange::ExchangeError::NetworkError("stub".into()));
        }
        Ok((0..limit as i64)
            .map(|i| {
                let close = 100.0 + (i % 7) as f64 - (i % 3) as f64;
                scalp_core::Candle {
                    time: 1_700_000_000 + i * 60,
                    open: close - 0.5,
                    high: close + 1.0,
                    low: close - 1.0,
                    close,
                    volume: 10.0,
                }
            })
            .collect())
    }

    async fn fetch_orderbook(
        &self,
        market: &scalp_core::MarketId,
        _limit: u32,
    ) -> scalp_exchange::ExchangeResult<scalp_core::OrderBook> {
        if market.symbol.starts_with("FAIL") {
            return Err(scalp_exchange::ExchangeError::RateLimited);
        }
        Ok(scalp_core::OrderBook {
            symbol: market.symbol.clone(),
            bids: vec![["99.9".into(), "1.5".into()]],
            asks: vec![["100.1".into(), "2.0".into()]],
            timestamp: 1_700_000_000,
            last_update_id: Some(42),
        })
    }

    async fn fetch_base_volume(
        &self,
        _market: &scalp_core::MarketId,
    ) -> scalp_exchange::ExchangeResult<f64> {
        Ok(10_000.0)
    }
}

/// 테스트용 AppState 생성 헬퍼.
///
/// DB/Redis 없이 [`StubMarket`]을 데이터 소스로 사용합니다.
#[cfg(test)]
pub fn create_test_state() -> AppState {
    AppState::new(
        AppConfig::default(),
        Arc::new(StubMarket),
        crate::websocket::create_hub(16),
        AiClient::new().expect("ai client"),
    )
}
