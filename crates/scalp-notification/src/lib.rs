//! # Scalp Notification
//!
//! 가격 알림 전송 서비스.
//!
//! 지원 채널:
//! - Telegram (사용자별 chat id)
//! - In-app (로그 기록)
//!
//! 이메일 채널은 식별만 하며 전송 수단은 없습니다.

pub mod telegram;
pub mod types;

pub use telegram::*;
pub use types::*;
