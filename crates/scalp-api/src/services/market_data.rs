//! 캐시를 거치는 시세 조회.

use scalp_core::{MarketId, TickerSnapshot};
use scalp_exchange::{ExchangeResult, MarketDataSource};
use tracing::debug;

use crate::cache::RedisCache;

/// 캐시에 있으면 캐시 값을, 없으면 거래소에서 조회 후 캐시에 저장합니다.
///
/// 캐시 에러는 무시하고 직접 조회합니다.
pub async fn ticker_with_cache(
    source: &dyn MarketDataSource,
    cache: Option<&RedisCache>,
    market: &MarketId,
) -> ExchangeResult<TickerSnapshot> {
    if let Some(cache) = cache {
        match cache.get_market(market.exchange, &market.symbol).await {
            Ok(Some(ticker)) => return Ok(ticker),
            Ok(None) => {}
            Err(e) => debug!(market_id = %market, "Cache read failed: {}", e),
        }
    }

    let ticker = source.fetch_ticker(market).await?;

    if let Some(cache) = cache {
        if let Err(e) = cache.set_market(&ticker).await {
            debug!(market_id = %market, "Cache write failed: {}", e);
        }
    }

    Ok(ticker)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::StubMarket;

    #[tokio::test]
    async fn test_without_cache_fetches_source() {
        let market = MarketId::binance_spot("ethusdt");
        let ticker = ticker_with_cache(&StubMarket, None, &market).await.unwrap();
        assert_eq!(ticker.market_id, market);
        assert_eq!(ticker.price, 100.0);

        let failing = MarketId::binance_spot("FAILUSDT");
        assert!(ticker_with_cache(&StubMarket, None, &failing).await.is_err());
    }
}
