//! 구독 마켓 시세 스트리머.
//!
//! 매 틱마다:
//! 1. 허브의 연결 목록과 연결별 구독 집합을 스냅샷
//! 2. 구독 합집합 계산 (비어 있으면 틱 생략)
//! 3. 마켓마다 한 번씩 병렬 조회 (세마포어로 동시성 제한, 조회별 타임아웃)
//! 4. 모든 조회가 끝난 뒤 구독 연결에만 비차단 전달 (큐가 가득 차면 버림)

use scalp_core::{MarketId, StreamingConfig};
use scalp_exchange::MarketDataSource;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{timeout, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::hub::{Connection, DeliveryOutcome, Payload, SharedHub};
use super::messages::TickerMessage;

/// 스트리머 설정.
#[derive(Debug, Clone)]
pub struct StreamerConfig {
    /// 틱 주기
    pub tick_interval: Duration,
    /// 틱당 동시 조회 수
    pub fetch_concurrency: usize,
    /// 마켓 1건 조회 제한 시간 (틱 주기보다 짧아야 함)
    pub fetch_timeout: Duration,
}

impl Default for StreamerConfig {
    fn default() -> Self {
        Self::from(&StreamingConfig::default())
    }
}

impl From<&StreamingConfig> for StreamerConfig {
    fn from(config: &StreamingConfig) -> Self {
        Self {
            tick_interval: config.tick_interval(),
            fetch_concurrency: config.fetch_concurrency.max(1),
            fetch_timeout: config.fetch_timeout(),
        }
    }
}

/// 한 틱의 처리 결과.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// 구독 합집합 크기
    pub markets: usize,
    /// 조회에 성공한 마켓 수
    pub fetched: usize,
    /// 큐에 들어간 메시지 수
    pub delivered: usize,
    /// 큐가 가득 차서 버린 메시지 수
    pub dropped: usize,
}

/// 시세 스트리머.
pub struct MarketDataStreamer {
    hub: SharedHub,
    source: Arc<dyn MarketDataSource>,
    config: StreamerConfig,
    semaphore: Arc<Semaphore>,
}

impl MarketDataStreamer {
    pub fn new(hub: SharedHub, source: Arc<dyn MarketDataSource>, config: StreamerConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.fetch_concurrency.max(1)));
        Self {
            hub,
            source,
            config,
            semaphore,
        }
    }

    /// 백그라운드 태스크로 시작합니다.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// 메인 루프.
    ///
    /// 틱 처리가 주기를 넘기면 밀린 틱은 건너뜁니다.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = tokio::time::interval(self.config.tick_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            tick_ms = self.config.tick_interval.as_millis() as u64,
            concurrency = self.config.fetch_concurrency,
            fetch_timeout_ms = self.config.fetch_timeout.as_millis() as u64,
            "Market data streamer started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    let report = self.tick().await;
                    if report.dropped > 0 {
                        debug!(
                            markets = report.markets,
                            fetched = report.fetched,
                            delivered = report.delivered,
                            dropped = report.dropped,
                            "Slow consumers dropped ticker messages"
                        );
                    }
                }

                _ = shutdown.cancelled() => {
                    info!("Market data streamer stopped");
                    break;
                }
            }
        }
    }

    /// 한 틱을 처리합니다.
    pub async fn tick(&self) -> TickReport {
        let connections = self.hub.snapshot().await;

        let mut targets: Vec<(Arc<Connection>, HashSet<MarketId>)> =
            Vec::with_capacity(connections.len());
        let mut union: HashSet<MarketId> = HashSet::new();
        for connection in connections {
            let subscriptions = connection.subscriptions().await;
            if subscriptions.is_empty() {
                continue;
            }
            union.extend(subscriptions.iter().cloned());
            targets.push((connection, subscriptions));
        }

        if union.is_empty() {
            return TickReport::default();
        }

        let mut report = TickReport {
            markets: union.len(),
            ..Default::default()
        };

        let payloads = self.fetch_all(union).await;
        report.fetched = payloads.len();
        if payloads.is_empty() {
            return report;
        }

        for (connection, subscriptions) in &targets {
            for market in subscriptions {
                let Some(payload) = payloads.get(market) else {
                    continue;
                };
                match connection.try_deliver(payload.clone()) {
                    DeliveryOutcome::Sent => report.delivered += 1,
                    DeliveryOutcome::Dropped => report.dropped += 1,
                    DeliveryOutcome::Closed => break,
                }
            }
        }

        report
    }

    /// 마켓별로 한 번씩 조회하여 직렬화된 메시지 맵을 만듭니다.
    ///
    /// 모든 조회 태스크가 끝난 뒤에 반환합니다. 실패하거나 시간을 넘긴
    /// 마켓은 맵에 없습니다.
    async fn fetch_all(&self, markets: HashSet<MarketId>) -> HashMap<MarketId, Payload> {
        let mut tasks = JoinSet::new();

        for market in markets {
            let source = Arc::clone(&self.source);
            let semaphore = Arc::clone(&self.semaphore);
            let fetch_timeout = self.config.fetch_timeout;

            tasks.spawn(async move {
                let _permit = semaphore.acquire_owned().await.ok()?;

                match timeout(fetch_timeout, source.fetch_ticker(&market)).await {
                    Ok(Ok(ticker)) => Some((market, ticker)),
                    Ok(Err(e)) => {
                        debug!(market_id = %market, error = %e, "Ticker fetch failed");
                        None
                    }
                    Err(_) => {
                        debug!(
                            market_id = %market,
                            timeout_ms = fetch_timeout.as_millis() as u64,
                            "Ticker fetch timed out"
                        );
                        None
                    }
                }
            });
        }

        let mut payloads = HashMap::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(Some((market, ticker))) => {
                    match TickerMessage::new(&market, &ticker).to_payload() {
                        Ok(payload) => {
                            payloads.insert(market, payload);
                        }
                        Err(e) => warn!(market_id = %market, "Failed to serialize ticker: {}", e),
                    }
                }
                Ok(None) => {}
                Err(e) => warn!("Ticker fetch task failed: {}", e),
            }
        }

        payloads
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_from_streaming_section() {
        let config = StreamerConfig::default();
        assert_eq!(config.tick_interval, Duration::from_millis(250));
        assert_eq!(config.fetch_timeout, Duration::from_millis(200));
        assert_eq!(config.fetch_concurrency, 10);
        assert!(config.fetch_timeout < config.tick_interval);
    }
}
