//! 설정 관리.
//!
//! 로드 순서 (뒤가 우선):
//! 1. 코드 기본값
//! 2. 설정 파일 (`config/default.toml`, 없어도 됨)
//! 3. `SCALP__<섹션>__<키>` 환경 변수
//! 4. 단일 이름 환경 변수 (`PORT`, `JWT_SECRET`, `DATABASE_URL`, `REDIS_URL`,
//!    `TELEGRAM_BOT_TOKEN`, `CORS_ALLOWED_ORIGINS`)

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::time::Duration;

use crate::error::{CoreError, CoreResult};

/// 애플리케이션 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// Redis 설정
    pub redis: RedisConfig,
    /// 인증 설정
    pub auth: AuthConfig,
    /// 실시간 스트리밍 설정
    pub streaming: StreamingConfig,
    /// 거래소 REST 설정
    pub exchange: ExchangeConfig,
    /// 알림 평가 설정
    pub alerts: AlertConfig,
    /// 알림 전송 설정
    pub notifications: NotificationConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 허용할 CORS origin (쉼표 구분)
    pub cors_allowed_origins: String,
    /// 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 3001,
            cors_allowed_origins: "http://localhost:3000,http://localhost:5173".to_string(),
            request_timeout_secs: 30,
        }
    }
}

impl ServerConfig {
    /// CORS origin 목록.
    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// `host:port` 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 데이터베이스 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct DatabaseConfig {
    /// PostgreSQL 연결 URL (없으면 DB 기반 API 비활성화)
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 연결 타임아웃 (초)
    pub connect_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: None,
            max_connections: 50,
            connect_timeout_secs: 5,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("url", &self.url.as_ref().map(|_| "[MASKED]"))
            .field("max_connections", &self.max_connections)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .finish()
    }
}

/// Redis 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RedisConfig {
    /// Redis URL (없으면 캐시 없이 동작)
    pub url: Option<String>,
    /// 시세 캐시 TTL (초)
    pub market_ttl_secs: u64,
}

impl Default for RedisConfig {
    fn default() -> Self {
        Self {
            url: None,
            market_ttl_secs: 5,
        }
    }
}

/// 기본 JWT 비밀 키 (개발용).
pub const DEFAULT_JWT_SECRET: &str = "dev_jwt_secret";

/// 인증 설정.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AuthConfig {
    /// JWT 서명 키 (HS256)
    pub jwt_secret: String,
    /// 토큰 유효 시간 (시간)
    pub token_ttl_hours: i64,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: DEFAULT_JWT_SECRET.to_string(),
            token_ttl_hours: 24,
        }
    }
}

impl AuthConfig {
    /// 기본 비밀 키를 그대로 쓰고 있는지 확인합니다.
    pub fn uses_default_secret(&self) -> bool {
        self.jwt_secret == DEFAULT_JWT_SECRET
    }
}

impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("jwt_secret", &"[MASKED]")
            .field("token_ttl_hours", &self.token_ttl_hours)
            .finish()
    }
}

/// 웹소켓 시세 스트리밍 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StreamingConfig {
    /// 틱 주기 (밀리초)
    pub tick_interval_ms: u64,
    /// 틱당 동시 조회 수
    pub fetch_concurrency: usize,
    /// 마켓 1건 조회 제한 시간 (밀리초, 틱 주기보다 짧아야 함)
    pub fetch_timeout_ms: u64,
    /// 연결별 송신 큐 크기
    pub outbound_queue_capacity: usize,
    /// keepalive ping 주기 (초)
    pub keepalive_secs: u64,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 250,
            fetch_concurrency: 10,
            fetch_timeout_ms: 200,
            outbound_queue_capacity: 256,
            keepalive_secs: 30,
        }
    }
}

impl StreamingConfig {
    /// 틱 주기.
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    /// 마켓 1건 조회 제한 시간.
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }

    /// keepalive 주기.
    pub fn keepalive(&self) -> Duration {
        Duration::from_secs(self.keepalive_secs)
    }

    /// 설정값의 일관성을 검사합니다.
    pub fn validate(&self) -> CoreResult<()> {
        if self.tick_interval_ms == 0 {
            return Err(CoreError::Config(
                "streaming.tick_interval_ms는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.fetch_timeout_ms == 0 || self.fetch_timeout_ms >= self.tick_interval_ms {
            return Err(CoreError::Config(format!(
                "streaming.fetch_timeout_ms({})는 0보다 크고 tick_interval_ms({})보다 작아야 합니다",
                self.fetch_timeout_ms, self.tick_interval_ms
            )));
        }
        if self.fetch_concurrency == 0 {
            return Err(CoreError::Config(
                "streaming.fetch_concurrency는 0보다 커야 합니다".to_string(),
            ));
        }
        if self.outbound_queue_capacity == 0 {
            return Err(CoreError::Config(
                "streaming.outbound_queue_capacity는 0보다 커야 합니다".to_string(),
            ));
        }
        Ok(())
    }
}

/// 거래소 REST 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ExchangeConfig {
    /// HTTP 요청 타임아웃 (초)
    pub http_timeout_secs: u64,
    /// Binance 현물 REST URL
    pub binance_spot_url: String,
    /// Binance USDⓈ-M 선물 REST URL
    pub binance_futures_url: String,
    /// Bybit v5 REST URL
    pub bybit_url: String,
}

impl Default for ExchangeConfig {
    fn default() -> Self {
        Self {
            http_timeout_secs: 10,
            binance_spot_url: "https://api.binance.com".to_string(),
            binance_futures_url: "https://fapi.binance.com".to_string(),
            bybit_url: "https://api.bybit.com".to_string(),
        }
    }
}

impl ExchangeConfig {
    /// HTTP 요청 타임아웃.
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }
}

/// 가격 알림 평가 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AlertConfig {
    /// 평가 작업 활성화 여부
    pub enabled: bool,
    /// 평가 주기 (초)
    pub evaluation_interval_secs: u64,
    /// 재발동 금지 시간 (초)
    pub debounce_secs: i64,
}

impl Default for AlertConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            evaluation_interval_secs: 60,
            debounce_secs: 300,
        }
    }
}

/// 알림 전송 설정.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// 텔레그램 설정
    pub telegram: TelegramConfig,
}

/// 텔레그램 설정.
///
/// 채팅 ID는 사용자별로 저장되므로 여기에는 봇 토큰만 둡니다.
#[derive(Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TelegramConfig {
    /// 활성화 여부
    pub enabled: bool,
    /// 봇 토큰
    pub bot_token: String,
    /// 요청 타임아웃 (초)
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            bot_token: String::new(),
            timeout_secs: 10,
        }
    }
}

impl fmt::Debug for TelegramConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TelegramConfig")
            .field("enabled", &self.enabled)
            .field("bot_token", &"[MASKED]")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// 로그 레벨 필터
    pub level: String,
    /// 로그 형식 (pretty, json, compact)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
        }
    }
}

impl AppConfig {
    /// 파일과 환경 변수에서 설정을 로드합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> CoreResult<Self> {
        let builder = config::Config::builder()
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 3001)?
            .add_source(config::File::from(path.as_ref()).required(false))
            .add_source(
                config::Environment::with_prefix("SCALP")
                    .separator("__")
                    .try_parsing(true),
            )
            .set_override_option("server.port", env_opt("PORT"))?
            .set_override_option("server.cors_allowed_origins", env_opt("CORS_ALLOWED_ORIGINS"))?
            .set_override_option("auth.jwt_secret", env_opt("JWT_SECRET"))?
            .set_override_option("database.url", env_opt("DATABASE_URL"))?
            .set_override_option("redis.url", env_opt("REDIS_URL"))?
            .set_override_option("notifications.telegram.bot_token", env_opt("TELEGRAM_BOT_TOKEN"))?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.streaming.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> CoreResult<Self> {
        Self::load("config/default.toml")
    }
}

fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.server.port, 3001);
        assert_eq!(config.streaming.tick_interval_ms, 250);
        assert_eq!(config.streaming.fetch_concurrency, 10);
        assert_eq!(config.streaming.outbound_queue_capacity, 256);
        assert_eq!(config.alerts.debounce_secs, 300);
        assert!(config.auth.uses_default_secret());
        assert!(config.streaming.validate().is_ok());
        assert_eq!(
            config.server.cors_origins(),
            vec!["http://localhost:3000", "http://localhost:5173"]
        );
    }

    #[test]
    fn test_fetch_timeout_must_be_shorter_than_tick() {
        let streaming = StreamingConfig {
            fetch_timeout_ms: 250,
            ..Default::default()
        };
        assert!(streaming.validate().is_err());

        let streaming = StreamingConfig {
            fetch_concurrency: 0,
            ..Default::default()
        };
        assert!(streaming.validate().is_err());
    }

    #[test]
    fn test_secrets_are_masked() {
        let auth = AuthConfig {
            jwt_secret: "super-secret".to_string(),
            ..Default::default()
        };
        let debug = format!("{:?}", auth);
        assert!(!debug.contains("super-secret"));
        assert!(debug.contains("[MASKED]"));
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let config = AppConfig::load("does/not/exist.toml").unwrap();
        assert_eq!(config.exchange.http_timeout_secs, 10);
        assert_eq!(config.redis.market_ttl_secs, 5);
    }
}
