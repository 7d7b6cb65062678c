//! 시장 데이터 소스 trait 정의.

use async_trait::async_trait;
use scalp_core::{Candle, CandleInterval, MarketId, OrderBook, TickerSnapshot};

use crate::ExchangeError;

/// 거래소 작업을 위한 Result 타입.
pub type ExchangeResult<T> = Result<T, ExchangeError>;

/// 공개 시장 데이터 조회 인터페이스.
///
/// 구현체는 상태가 없으며 여러 태스크에서 동시에 호출될 수 있습니다.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// 데이터 소스 이름.
    fn name(&self) -> &str;

    /// 24시간 시세 조회.
    async fn fetch_ticker(&self, market: &MarketId) -> ExchangeResult<TickerSnapshot>;

    /// 캔들 조회.
    ///
    /// `end_time`은 Unix 초이며, 지정하면 그 시각 이전 캔들만 반환됩니다.
    /// 반환 순서는 시간 오름차순입니다.
    async fn fetch_candles(
        &self,
        market: &MarketId,
        interval: CandleInterval,
        limit: u32,
        end_time: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>>;

    /// 호가창 조회.
    async fn fetch_orderbook(&self, market: &MarketId, limit: u32) -> ExchangeResult<OrderBook>;

    /// 24시간 기초 자산 거래량 조회.
    async fn fetch_base_volume(&self, market: &MarketId) -> ExchangeResult<f64>;
}
