//! Redis 캐시 구현.
//!
//! 코인 목록/상세 응답에 붙는 24시간 시세를 짧은 TTL로 캐싱하여
//! 거래소 REST 호출 수를 줄입니다.

use redis::{aio::MultiplexedConnection, AsyncCommands, Client};
use scalp_core::{ExchangeKind, TickerSnapshot};
use serde::{de::DeserializeOwned, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument};

/// 캐시 에러.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("Redis 에러: {0}")]
    Redis(String),

    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

pub type CacheResult<T> = Result<T, CacheError>;

/// Redis 기반 JSON 캐시.
#[derive(Clone)]
pub struct RedisCache {
    connection: Arc<RwLock<MultiplexedConnection>>,
    market_ttl_secs: u64,
}

impl RedisCache {
    /// Redis에 연결합니다.
    pub async fn connect(url: &str, market_ttl_secs: u64) -> CacheResult<Self> {
        info!("Connecting to Redis...");

        let client = Client::open(url).map_err(|e| CacheError::Redis(e.to_string()))?;

        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        info!("Redis connection established");

        Ok(Self {
            connection: Arc::new(RwLock::new(connection)),
            market_ttl_secs,
        })
    }

    /// PING 응답 확인.
    pub async fn health_check(&self) -> CacheResult<bool> {
        let mut conn = self.connection.write().await;
        let result: String = redis::cmd("PING")
            .query_async(&mut *conn)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        Ok(result == "PONG")
    }

    // =========================================================================
    // 일반 Cache 작업
    // =========================================================================

    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> CacheResult<Option<T>> {
        let mut conn = self.connection.write().await;
        let value: Option<String> = conn
            .get(key)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        match value {
            Some(json) => {
                let parsed = serde_json::from_str(&json)
                    .map_err(|e| CacheError::Serialization(e.to_string()))?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    pub async fn set_with_ttl<T: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &T,
        ttl_secs: u64,
    ) -> CacheResult<()> {
        let json =
            serde_json::to_string(value).map_err(|e| CacheError::Serialization(e.to_string()))?;

        let mut conn = self.connection.write().await;
        let _: () = conn
            .set_ex(key, json, ttl_secs)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        Ok(())
    }

    pub async fn delete(&self, key: &str) -> CacheResult<bool> {
        let mut conn = self.connection.write().await;
        let deleted: i64 = conn
            .del(key)
            .await
            .map_err(|e| CacheError::Redis(e.to_string()))?;

        Ok(deleted > 0)
    }

    // =========================================================================
    // 시세 Cache
    // =========================================================================

    /// `market:{exchange}:{symbol}` 키.
    pub fn market_key(exchange: ExchangeKind, symbol: &str) -> String {
        format!("market:{}:{}", exchange.name(), symbol.to_ascii_uppercase())
    }

    pub async fn get_market(
        &self,
        exchange: ExchangeKind,
        symbol: &str,
    ) -> CacheResult<Option<TickerSnapshot>> {
        self.get(&Self::market_key(exchange, symbol)).await
    }

    #[instrument(skip(self, ticker), fields(market_id = %ticker.market_id))]
    pub async fn set_market(&self, ticker: &TickerSnapshot) -> CacheResult<()> {
        let key = Self::market_key(ticker.market_id.exchange, &ticker.market_id.symbol);
        self.set_with_ttl(&key, ticker, self.market_ttl_secs).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_market_key() {
        assert_eq!(
            RedisCache::market_key(ExchangeKind::Binance, "btcusdt"),
            "market:binance:BTCUSDT"
        );
        assert_eq!(
            RedisCache::market_key(ExchangeKind::Bybit, "ETHUSDT"),
            "market:bybit:ETHUSDT"
        );
    }

    #[tokio::test]
    async fn test_connect_rejects_invalid_url() {
        let result = RedisCache::connect("not-a-redis-url", 5).await;
        assert!(matches!(result, Err(CacheError::Redis(_))));
    }
}
