//! 거래소별 시장 데이터 라우팅.

use async_trait::async_trait;
use std::sync::Arc;

use scalp_core::{
    Candle, CandleInterval, ExchangeConfig, ExchangeKind, MarketId, OrderBook, TickerSnapshot,
};

use crate::connector::{BinanceClient, BinanceConfig, BybitClient, BybitConfig};
use crate::traits::{ExchangeResult, MarketDataSource};

/// 마켓 ID의 거래소에 따라 요청을 해당 클라이언트로 전달합니다.
#[derive(Clone)]
pub struct MarketRouter {
    binance: Arc<dyn MarketDataSource>,
    bybit: Arc<dyn MarketDataSource>,
}

impl MarketRouter {
    /// 개별 소스로 라우터 생성.
    pub fn new(binance: Arc<dyn MarketDataSource>, bybit: Arc<dyn MarketDataSource>) -> Self {
        Self { binance, bybit }
    }

    /// 애플리케이션 거래소 설정에서 생성.
    pub fn from_config(config: &ExchangeConfig) -> ExchangeResult<Self> {
        let binance = BinanceClient::new(BinanceConfig::from_exchange_config(config))?;
        let bybit = BybitClient::new(BybitConfig::from_exchange_config(config))?;
        Ok(Self::new(Arc::new(binance), Arc::new(bybit)))
    }

    fn source(&self, exchange: ExchangeKind) -> &dyn MarketDataSource {
        match exchange {
            ExchangeKind::Binance => self.binance.as_ref(),
            ExchangeKind::Bybit => self.bybit.as_ref(),
        }
    }
}

#[async_trait]
impl MarketDataSource for MarketRouter {
    fn name(&self) -> &str {
        "router"
    }

    async fn fetch_ticker(&self, market: &MarketId) -> ExchangeResult<TickerSnapshot> {
        self.source(market.exchange).fetch_ticker(market).await
    }

    async fn fetch_candles(
        &self,
        market: &MarketId,
        interval: CandleInterval,
        limit: u32,
        end_time: Option<i64>,
    ) -> ExchangeResult<Vec<Candle>> {
        self.source(market.exchange)
            .fetch_candles(market, interval, limit, end_time)
            .await
    }

    async fn fetch_orderbook(&self, market: &MarketId, limit: u32) -> ExchangeResult<OrderBook> {
        self.source(market.exchange).fetch_orderbook(market, limit).await
    }

    async fn fetch_base_volume(&self, market: &MarketId) -> ExchangeResult<f64> {
        self.source(market.exchange).fetch_base_volume(market).await
    }
}
