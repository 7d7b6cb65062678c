//! 텔레그램 알림 서비스.
//!
//! Telegram Bot API로 사용자별 채팅에 알림을 전송합니다.

use std::time::Duration;

use async_trait::async_trait;
use scalp_core::{NotificationChannel, TelegramConfig};
use tracing::{debug, error, info, warn};

use crate::types::{Notification, NotificationError, NotificationResult, NotificationSender};

/// Telegram Bot API 기본 주소.
pub const TELEGRAM_API_BASE: &str = "https://api.telegram.org";

/// 텔레그램 알림 전송기.
pub struct TelegramSender {
    config: TelegramConfig,
    api_base: String,
    client: reqwest::Client,
}

impl TelegramSender {
    /// 새 텔레그램 전송기를 생성합니다.
    pub fn new(config: TelegramConfig) -> NotificationResult<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()?;
        Ok(Self {
            config,
            api_base: TELEGRAM_API_BASE.to_string(),
            client,
        })
    }

    /// API 주소를 변경합니다.
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into().trim_end_matches('/').to_string();
        self
    }

    /// 지정한 채팅으로 Markdown 메시지를 전송합니다.
    ///
    /// 채팅 ID 0은 거부합니다.
    pub async fn send_to(&self, chat_id: i64, text: &str) -> NotificationResult<()> {
        if chat_id == 0 {
            return Err(NotificationError::NotConfigured(
                "telegram chat id not configured".to_string(),
            ));
        }
        if self.config.bot_token.is_empty() {
            return Err(NotificationError::InvalidConfig(
                "텔레그램 봇 토큰이 없습니다".to_string(),
            ));
        }

        let url = format!("{}/bot{}/sendMessage", self.api_base, self.config.bot_token);

        let payload = serde_json::json!({
            "chat_id": chat_id,
            "text": text,
            "parse_mode": "Markdown",
            "disable_web_page_preview": true
        });

        debug!(chat_id, "Sending Telegram message");

        let response = self.client.post(&url).json(&payload).send().await?;

        if response.status().is_success() {
            info!(chat_id, "Telegram notification sent successfully");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();

            if status.as_u16() == 429 {
                warn!("Telegram rate limited");
                return Err(NotificationError::RateLimited(60));
            }

            error!("Telegram API error: {} - {}", status, body);
            Err(NotificationError::SendFailed(format!(
                "HTTP {}: {}",
                status, body
            )))
        }
    }
}

#[async_trait]
impl NotificationSender for TelegramSender {
    async fn send(&self, notification: &Notification) -> NotificationResult<()> {
        let chat_id = notification.recipient.telegram_chat().ok_or_else(|| {
            NotificationError::NotConfigured("telegram chat id not configured".to_string())
        })?;
        self.send_to(chat_id, &notification.text).await
    }

    fn is_enabled(&self) -> bool {
        self.config.enabled && !self.config.bot_token.is_empty()
    }

    fn channel(&self) -> NotificationChannel {
        NotificationChannel::Telegram
    }

    fn name(&self) -> &str {
        "telegram"
    }
}

/// 채널별 전송기를 묶는 알림 관리자.
pub struct NotificationManager {
    senders: Vec<Box<dyn NotificationSender>>,
}

impl NotificationManager {
    /// 빈 알림 관리자를 생성합니다.
    pub fn new() -> Self {
        Self {
            senders: Vec::new(),
        }
    }

    /// 설정으로 관리자를 구성합니다.
    pub fn from_config(config: &TelegramConfig) -> NotificationResult<Self> {
        let mut manager = Self::new();
        manager.add_sender(TelegramSender::new(config.clone())?);
        Ok(manager)
    }

    /// 알림 전송기를 추가합니다.
    pub fn add_sender<S: NotificationSender + 'static>(&mut self, sender: S) {
        info!("Adding notification sender: {}", sender.name());
        self.senders.push(Box::new(sender));
    }

    /// 알림 채널에 맞는 전송기로 전달합니다.
    ///
    /// in-app 알림은 기록만 하고 성공으로 처리합니다.
    /// 채널에 활성 전송기가 없으면 `NotConfigured`를 반환합니다.
    pub async fn notify(&self, notification: &Notification) -> NotificationResult<()> {
        if notification.channel == NotificationChannel::InApp {
            info!(
                user_id = %notification.recipient.user_id,
                "In-app notification: {}",
                notification.text
            );
            return Ok(());
        }

        let sender = self
            .senders
            .iter()
            .find(|s| s.channel() == notification.channel && s.is_enabled())
            .ok_or_else(|| {
                NotificationError::NotConfigured(format!(
                    "{} delivery not configured",
                    notification.channel
                ))
            })?;

        sender.send(notification).await.map_err(|e| {
            error!("Failed to send notification via {}: {}", sender.name(), e);
            e
        })
    }
}

impl Default for NotificationManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Recipient;

    fn config(token: &str) -> TelegramConfig {
        TelegramConfig {
            enabled: true,
            bot_token: token.to_string(),
            timeout_secs: 5,
        }
    }

    #[test]
    fn test_is_enabled_requires_token() {
        assert!(!TelegramSender::new(config("")).unwrap().is_enabled());
        assert!(TelegramSender::new(config("abc")).unwrap().is_enabled());

        let mut disabled = config("abc");
        disabled.enabled = false;
        assert!(!TelegramSender::new(disabled).unwrap().is_enabled());
    }

    #[tokio::test]
    async fn test_send_to_rejects_zero_chat_id() {
        let sender = TelegramSender::new(config("abc")).unwrap();
        let err = sender.send_to(0, "hi").await.unwrap_err();
        assert!(matches!(err, NotificationError::NotConfigured(_)));
    }

    #[tokio::test]
    async fn test_manager_in_app_is_logged() {
        let manager = NotificationManager::new();
        let n = Notification::new(NotificationChannel::InApp, Recipient::new("u1"), "hello");
        assert!(manager.notify(&n).await.is_ok());
    }

    #[tokio::test]
    async fn test_manager_email_not_configured() {
        let manager = NotificationManager::from_config(&config("abc")).unwrap();
        let n = Notification::new(NotificationChannel::Email, Recipient::new("u1"), "hello");
        let err = manager.notify(&n).await.unwrap_err();
        assert_eq!(err.to_string(), "email delivery not configured");
    }

    #[tokio::test]
    async fn test_manager_telegram_without_chat_id() {
        let manager = NotificationManager::from_config(&config("abc")).unwrap();
        let n = Notification::new(NotificationChannel::Telegram, Recipient::new("u1"), "hello");
        let err = manager.notify(&n).await.unwrap_err();
        assert_eq!(err.to_string(), "telegram chat id not configured");
    }
}
