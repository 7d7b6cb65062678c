//! 핵심 에러 타입.

use thiserror::Error;

/// 도메인 타입 파싱 및 설정 에러.
#[derive(Debug, Error)]
pub enum CoreError {
    /// 형식이 잘못된 마켓 ID
    #[error("잘못된 마켓 ID: {0}")]
    InvalidMarketId(String),

    /// 알 수 없는 거래소 태그/이름
    #[error("알 수 없는 거래소: {0}")]
    UnknownExchange(String),

    /// 알 수 없는 시장 유형 태그
    #[error("알 수 없는 시장 유형: {0}")]
    UnknownMarketType(String),

    /// 지원하지 않는 캔들 간격
    #[error("지원하지 않는 캔들 간격: {0}")]
    InvalidInterval(String),

    /// 알 수 없는 알림 조건
    #[error("알 수 없는 알림 조건: {0}")]
    UnknownAlertCondition(String),

    /// 알 수 없는 알림 채널
    #[error("알 수 없는 알림 채널: {0}")]
    UnknownNotificationChannel(String),

    /// 설정 에러
    #[error("설정 에러: {0}")]
    Config(String),

    /// 직렬화 에러
    #[error("직렬화 에러: {0}")]
    Serialization(String),
}

/// 핵심 작업을 위한 Result 타입.
pub type CoreResult<T> = Result<T, CoreError>;

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        CoreError::Serialization(err.to_string())
    }
}

impl From<config::ConfigError> for CoreError {
    fn from(err: config::ConfigError) -> Self {
        CoreError::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::UnknownExchange("OK".to_string());
        assert_eq!(err.to_string(), "알 수 없는 거래소: OK");

        let err: CoreError = serde_json::from_str::<u32>("x").unwrap_err().into();
        assert!(matches!(err, CoreError::Serialization(_)));
    }
}
