//! 알림 타입 정의.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use scalp_core::{AlertCondition, NotificationChannel};

/// 알림 수신 대상.
///
/// 사용자 프로필에 저장된 채널별 주소입니다.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Recipient {
    pub user_id: String,
    pub telegram_chat_id: Option<i64>,
    pub email: Option<String>,
}

impl Recipient {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            ..Default::default()
        }
    }

    pub fn with_telegram_chat_id(mut self, chat_id: Option<i64>) -> Self {
        self.telegram_chat_id = chat_id;
        self
    }

    pub fn with_email(mut self, email: Option<String>) -> Self {
        self.email = email;
        self
    }

    /// 유효한 텔레그램 채팅 ID (0은 미설정으로 취급).
    pub fn telegram_chat(&self) -> Option<i64> {
        self.telegram_chat_id.filter(|id| *id != 0)
    }
}

/// 전송할 알림.
#[derive(Debug, Clone)]
pub struct Notification {
    pub channel: NotificationChannel,
    pub recipient: Recipient,
    pub text: String,
}

impl Notification {
    pub fn new(channel: NotificationChannel, recipient: Recipient, text: impl Into<String>) -> Self {
        Self {
            channel,
            recipient,
            text: text.into(),
        }
    }
}

/// 발동된 가격 알림 내용.
#[derive(Debug, Clone, PartialEq)]
pub struct AlertMessage {
    pub symbol: String,
    pub condition: AlertCondition,
    pub threshold: f64,
    pub current_price: f64,
    pub triggered_at: DateTime<Utc>,
}

impl AlertMessage {
    /// Markdown 형식 메시지.
    pub fn format(&self) -> String {
        format!(
            "🚨 *Alert Triggered!*\n\n\
             *Coin:* {}\n\
             *Condition:* {}\n\
             *Current Price:* ${:.2}\n\
             *Time:* {} UTC\n\n\
             _Scalpaiboard Alert System_",
            self.symbol,
            self.condition.describe(self.threshold),
            self.current_price,
            self.triggered_at.format("%Y-%m-%d %H:%M"),
        )
    }
}

/// 알림 작업을 위한 Result 타입.
pub type NotificationResult<T> = Result<T, NotificationError>;

/// 알림 에러.
#[derive(Debug, thiserror::Error)]
pub enum NotificationError {
    #[error("알림 전송 실패: {0}")]
    SendFailed(String),

    #[error("잘못된 설정: {0}")]
    InvalidConfig(String),

    /// 수신 주소 또는 전송 수단이 없음
    #[error("{0}")]
    NotConfigured(String),

    #[error("요청 한도 초과: {0}초 후 재시도")]
    RateLimited(u64),

    #[error("네트워크 에러: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("직렬화 에러: {0}")]
    SerializationError(#[from] serde_json::Error),
}

/// 알림 전송기 trait.
#[async_trait]
pub trait NotificationSender: Send + Sync {
    /// 알림을 전송합니다.
    async fn send(&self, notification: &Notification) -> NotificationResult<()>;

    /// 전송기가 활성화되어 있는지 확인합니다.
    fn is_enabled(&self) -> bool;

    /// 담당 채널.
    fn channel(&self) -> NotificationChannel;

    /// 전송기 이름을 반환합니다.
    fn name(&self) -> &str;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_alert_message_format() {
        let msg = AlertMessage {
            symbol: "BTCUSDT".to_string(),
            condition: AlertCondition::PriceAbove,
            threshold: 50000.0,
            current_price: 50123.456,
            triggered_at: Utc.with_ymd_and_hms(2024, 3, 1, 9, 5, 0).unwrap(),
        };

        let text = msg.format();
        assert!(text.starts_with("🚨 *Alert Triggered!*\n\n*Coin:* BTCUSDT\n"));
        assert!(text.contains("*Condition:* Price above $50000.00\n"));
        assert!(text.contains("*Current Price:* $50123.46\n"));
        assert!(text.contains("*Time:* 2024-03-01 09:05 UTC"));
    }

    #[test]
    fn test_recipient_zero_chat_id_is_unset() {
        let r = Recipient::new("u1").with_telegram_chat_id(Some(0));
        assert_eq!(r.telegram_chat(), None);

        let r = Recipient::new("u1").with_telegram_chat_id(Some(-100123));
        assert_eq!(r.telegram_chat(), Some(-100123));
    }

    #[test]
    fn test_not_configured_message_is_plain() {
        let err = NotificationError::NotConfigured("telegram chat id not configured".into());
        assert_eq!(err.to_string(), "telegram chat id not configured");
    }
}
