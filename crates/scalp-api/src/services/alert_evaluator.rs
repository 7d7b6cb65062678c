//! 가격 알림 백그라운드 평가기.
//!
//! 주기적으로 활성 알림을 읽어 현재 시세와 비교합니다.
//! - 마지막 발동 후 재발동 금지 시간(기본 5분) 안의 알림은 건너뜀
//! - 조건은 경계값 포함 (`>=`, `<=`)
//! - 발동 시 기록(발동 횟수, 이력 `pending`)을 먼저 남기고 알림을 전송한 뒤
//!   이력을 `sent`/`failed`로 갱신
//! - 전송 실패는 발동 기록을 되돌리지 않음

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use rust_decimal::prelude::ToPrimitive;
use scalp_core::{AlertCondition, AlertConfig, ExchangeKind, MarketId, MarketKind, NotificationChannel};
use scalp_exchange::{ExchangeResult, MarketDataSource};
use scalp_notification::{AlertMessage, Notification, NotificationManager, Recipient};
use sqlx::PgPool;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::repository::alerts::{HISTORY_FAILED, HISTORY_SENT};
use crate::repository::{ActiveAlert, AlertRepository};

/// 평가 시점의 시세.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    pub price: f64,
    /// 24시간 거래량 (기준 자산)
    pub volume: f64,
}

/// 한 번의 평가 결과.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct EvaluationReport {
    pub evaluated: usize,
    pub debounced: usize,
    pub triggered: usize,
    pub delivered: usize,
    pub failed: usize,
}

/// 재발동 금지 시간 안이면 `true`.
pub fn is_debounced(
    last_triggered_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    debounce: chrono::Duration,
) -> bool {
    last_triggered_at.is_some_and(|last| now - last < debounce)
}

/// 알림 조건 확인. 알 수 없는 조건이면 `None`.
pub fn check_condition(alert: &ActiveAlert, quote: Quote) -> Option<(AlertCondition, bool)> {
    let condition = alert.condition_type.parse::<AlertCondition>().ok()?;
    let threshold = alert.condition_value.to_f64()?;
    Some((condition, condition.is_met(threshold, quote.price, quote.volume)))
}

/// 소유자 프로필의 주소로 알림을 구성합니다.
///
/// 알 수 없는 채널 값은 in-app으로 처리합니다.
pub fn build_notification(
    alert: &ActiveAlert,
    condition: AlertCondition,
    quote: Quote,
    triggered_at: DateTime<Utc>,
) -> Notification {
    let channel = alert
        .notification_type
        .parse::<NotificationChannel>()
        .unwrap_or_default();

    let recipient = Recipient::new(alert.user_id.to_string())
        .with_telegram_chat_id(alert.telegram_chat_id)
        .with_email(alert.email.clone());

    let text = AlertMessage {
        symbol: alert.symbol.clone(),
        condition,
        threshold: alert.condition_value.to_f64().unwrap_or_default(),
        current_price: quote.price,
        triggered_at,
    }
    .format();

    Notification::new(channel, recipient, text)
}

/// 가격 알림 평가기.
pub struct AlertEvaluator {
    pool: PgPool,
    market: Arc<dyn MarketDataSource>,
    notifier: Arc<NotificationManager>,
    config: AlertConfig,
}

impl AlertEvaluator {
    pub fn new(
        pool: PgPool,
        market: Arc<dyn MarketDataSource>,
        notifier: Arc<NotificationManager>,
        config: AlertConfig,
    ) -> Self {
        Self {
            pool,
            market,
            notifier,
            config,
        }
    }

    /// 백그라운드 태스크로 시작합니다.
    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }

    /// 메인 루프.
    pub async fn run(self, shutdown: CancellationToken) {
        let period = Duration::from_secs(self.config.evaluation_interval_secs.max(1));
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            interval_secs = period.as_secs(),
            debounce_secs = self.config.debounce_secs,
            "Alert evaluator started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    match self.evaluate_once(Utc::now()).await {
                        Ok(report) => info!(
                            evaluated = report.evaluated,
                            triggered = report.triggered,
                            delivered = report.delivered,
                            failed = report.failed,
                            "Alert evaluation finished"
                        ),
                        Err(e) => error!("Failed to fetch alerts: {}", e),
                    }
                }

                _ = shutdown.cancelled() => {
                    info!("Alert evaluator stopped");
                    break;
                }
            }
        }
    }

    /// 활성 알림 전체를 한 번 평가합니다.
    ///
    /// 시세는 한 번의 평가 안에서 심볼당 한 번만 조회합니다.
    pub async fn evaluate_once(&self, now: DateTime<Utc>) -> Result<EvaluationReport, sqlx::Error> {
        let alerts = AlertRepository::list_active(&self.pool).await?;
        let debounce = chrono::Duration::seconds(self.config.debounce_secs);

        let mut report = EvaluationReport::default();
        let mut quotes: HashMap<String, Option<Quote>> = HashMap::new();

        for alert in &alerts {
            report.evaluated += 1;

            if is_debounced(alert.last_triggered_at, now, debounce) {
                report.debounced += 1;
                continue;
            }

            let quote = match quotes.get(&alert.symbol) {
                Some(cached) => *cached,
                None => {
                    let fetched = match self.fetch_quote(&alert.symbol).await {
                        Ok(quote) => Some(quote),
                        Err(e) => {
                            warn!(symbol = %alert.symbol, "Failed to get market data: {}", e);
                            None
                        }
                    };
                    quotes.insert(alert.symbol.clone(), fetched);
                    fetched
                }
            };
            let Some(quote) = quote else {
                continue;
            };

            let Some((condition, met)) = check_condition(alert, quote) else {
                warn!(
                    alert_id = alert.id,
                    condition = %alert.condition_type,
                    "Skipping alert with unknown condition"
                );
                continue;
            };
            if !met {
                continue;
            }

            report.triggered += 1;
            if self.process_triggered(alert, condition, quote, now).await {
                report.delivered += 1;
            } else {
                report.failed += 1;
            }
        }

        Ok(report)
    }

    /// 현물 시세와 기준 자산 거래량.
    async fn fetch_quote(&self, symbol: &str) -> ExchangeResult<Quote> {
        let market = MarketId::new(ExchangeKind::Binance, MarketKind::Spot, symbol);
        let ticker = self.market.fetch_ticker(&market).await?;
        let volume = self.market.fetch_base_volume(&market).await?;
        Ok(Quote {
            price: ticker.price,
            volume,
        })
    }

    /// 발동 기록 후 알림 전송. 전송에 성공하면 `true`.
    ///
    /// 발동 시각을 기록하지 못하면 재발동 금지가 걸리지 않으므로 전송하지 않습니다.
    /// 이력 행이 없을 때도 마찬가지입니다.
    async fn process_triggered(
        &self,
        alert: &ActiveAlert,
        condition: AlertCondition,
        quote: Quote,
        now: DateTime<Utc>,
    ) -> bool {
        info!(
            alert_id = alert.id,
            symbol = %alert.symbol,
            price = quote.price,
            "Alert triggered"
        );

        if let Err(e) = AlertRepository::mark_triggered(&self.pool, alert.id).await {
            error!(alert_id = alert.id, "Failed to update alert, skipping notification: {}", e);
            return false;
        }

        let history_id =
            match AlertRepository::insert_history(&self.pool, alert.id, &alert.notification_type)
                .await
            {
                Ok(id) => id,
                Err(e) => {
                    error!(alert_id = alert.id, "Failed to save alert history: {}", e);
                    return false;
                }
            };

        let notification = build_notification(alert, condition, quote, now);
        let result = self.notifier.notify(&notification).await;

        let (status, message) = match &result {
            Ok(()) => (HISTORY_SENT, None),
            Err(e) => {
                warn!(alert_id = alert.id, channel = %notification.channel, "Notification failed: {}", e);
                (HISTORY_FAILED, Some(e.to_string()))
            }
        };

        if let Err(e) =
            AlertRepository::finish_history(&self.pool, history_id, status, message.as_deref())
                .await
        {
            error!(history_id, "Failed to update alert history: {}", e);
        } else {
            debug!(history_id, status, "Alert history updated");
        }

        result.is_ok()
    }
}
