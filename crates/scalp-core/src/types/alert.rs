//! 가격 알림 조건과 알림 채널.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::CoreError;

/// 알림 조건 유형.
///
/// 모든 비교는 경계값을 포함합니다 (`>=`, `<=`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertCondition {
    PriceAbove,
    PriceBelow,
    VolumeAbove,
    VolumeBelow,
}

impl AlertCondition {
    pub const ALL: [AlertCondition; 4] = [
        AlertCondition::PriceAbove,
        AlertCondition::PriceBelow,
        AlertCondition::VolumeAbove,
        AlertCondition::VolumeBelow,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AlertCondition::PriceAbove => "price_above",
            AlertCondition::PriceBelow => "price_below",
            AlertCondition::VolumeAbove => "volume_above",
            AlertCondition::VolumeBelow => "volume_below",
        }
    }

    /// 현재 가격/거래량이 조건을 만족하는지 확인합니다.
    pub fn is_met(&self, threshold: f64, price: f64, volume: f64) -> bool {
        match self {
            AlertCondition::PriceAbove => price >= threshold,
            AlertCondition::PriceBelow => price <= threshold,
            AlertCondition::VolumeAbove => volume >= threshold,
            AlertCondition::VolumeBelow => volume <= threshold,
        }
    }

    /// 사람이 읽는 조건 문구.
    pub fn describe(&self, threshold: f64) -> String {
        match self {
            AlertCondition::PriceAbove => format!("Price above ${:.2}", threshold),
            AlertCondition::PriceBelow => format!("Price below ${:.2}", threshold),
            AlertCondition::VolumeAbove => format!("Volume above {:.0}", threshold),
            AlertCondition::VolumeBelow => format!("Volume below {:.0}", threshold),
        }
    }
}

impl fmt::Display for AlertCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AlertCondition {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        AlertCondition::ALL
            .into_iter()
            .find(|c| c.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| CoreError::UnknownAlertCondition(s.to_string()))
    }
}

/// 알림 전송 채널.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationChannel {
    #[default]
    InApp,
    Telegram,
    Email,
}

impl NotificationChannel {
    pub fn as_str(&self) -> &'static str {
        match self {
            NotificationChannel::InApp => "in_app",
            NotificationChannel::Telegram => "telegram",
            NotificationChannel::Email => "email",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "in_app" => Ok(NotificationChannel::InApp),
            "telegram" => Ok(NotificationChannel::Telegram),
            "email" => Ok(NotificationChannel::Email),
            _ => Err(CoreError::UnknownNotificationChannel(s.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_condition_is_inclusive() {
        assert!(AlertCondition::PriceAbove.is_met(100.0, 100.0, 0.0));
        assert!(AlertCondition::PriceBelow.is_met(100.0, 100.0, 0.0));
        assert!(AlertCondition::VolumeAbove.is_met(5.0, 0.0, 5.0));
        assert!(AlertCondition::VolumeBelow.is_met(5.0, 0.0, 5.0));
        assert!(!AlertCondition::PriceAbove.is_met(100.0, 99.99, 0.0));
        assert!(!AlertCondition::VolumeBelow.is_met(5.0, 0.0, 5.01));
    }

    #[test]
    fn test_condition_parse() {
        assert_eq!(
            "PRICE_ABOVE".parse::<AlertCondition>().unwrap(),
            AlertCondition::PriceAbove
        );
        assert!("price_cross".parse::<AlertCondition>().is_err());
    }

    #[test]
    fn test_condition_describe() {
        assert_eq!(
            AlertCondition::PriceAbove.describe(50000.0),
            "Price above $50000.00"
        );
        assert_eq!(AlertCondition::VolumeBelow.describe(1234.6), "Volume below 1235");
    }

    #[test]
    fn test_channel_parse_and_default() {
        assert_eq!(NotificationChannel::default(), NotificationChannel::InApp);
        assert_eq!(
            "telegram".parse::<NotificationChannel>().unwrap(),
            NotificationChannel::Telegram
        );
        assert!("sms".parse::<NotificationChannel>().is_err());
        assert_eq!(
            serde_json::to_string(&NotificationChannel::InApp).unwrap(),
            "\"in_app\""
        );
    }
}
