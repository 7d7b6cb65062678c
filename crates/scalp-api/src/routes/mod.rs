//! API 라우트.
//!
//! # 라우트 구조
//!
//! - `/api/health` - 헬스 체크
//! - `/api/auth` - 회원가입/로그인/토큰 갱신
//! - `/api/coins` - 코인 목록, 시세, 캔들, 호가, 기술적 분석
//! - `/api/markets` - 거래소별 마켓 목록과 지표
//! - `/api/watchlist` - 관심종목
//! - `/api/alerts` - 가격 알림
//! - `/api/users` - 사용자 알림 설정
//! - `/api/ai` - AI 제공자 관리와 채팅

pub mod ai;
pub mod alerts;
pub mod analysis;
pub mod auth;
pub mod coins;
pub mod health;
pub mod markets;
pub mod users;
pub mod watchlist;

pub use ai::ai_router;
pub use alerts::alerts_router;
pub use auth::auth_router;
pub use coins::coins_router;
pub use health::{health_router, ComponentStatus, HealthResponse};
pub use markets::{markets_router, split_base_quote, MarketItem};
pub use users::users_router;
pub use watchlist::watchlist_router;

use axum::{extract::rejection::JsonRejection, Json, Router};
use std::sync::Arc;
use validator::ValidationErrors;

use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

/// 전체 API 라우터 생성.
pub fn create_api_router() -> Router<Arc<AppState>> {
    Router::new()
        .nest("/api/health", health_router())
        .nest("/api/auth", auth_router())
        .nest("/api/coins", coins_router())
        .nest("/api/markets", markets_router())
        .nest("/api/watchlist", watchlist_router())
        .nest("/api/alerts", alerts_router())
        .nest("/api/users", users_router())
        .nest("/api/ai", ai_router())
}

// ================================================================================================
// Helpers
// ================================================================================================

/// 쿼리 limit 보정. 없거나 0 이하면 기본값, 최대값 초과는 최대값.
pub(crate) fn clamp_limit(value: Option<i64>, default: i64, max: i64) -> i64 {
    match value {
        Some(v) if v > 0 => v.min(max),
        _ => default,
    }
}

/// 경로의 정수 ID 파싱. 실패하면 `message`로 400.
pub(crate) fn parse_id(raw: &str, message: &str) -> ApiResult<i32> {
    raw.trim()
        .parse::<i32>()
        .ok()
        .filter(|id| *id > 0)
        .ok_or_else(|| ApiError::bad_request(message))
}

/// JSON 본문 추출 실패를 `{"error"}` 형식으로 변환.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>, prefix: &str) -> ApiResult<T> {
    payload
        .map(|Json(body)| body)
        .map_err(|e| ApiError::bad_request(format!("{}: {}", prefix, e.body_text())))
}

/// validator 에러 메시지를 한 줄로 합칩니다.
pub(crate) fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: invalid value", field))
            })
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_limit() {
        assert_eq!(clamp_limit(None, 50, 100), 50);
        assert_eq!(clamp_limit(Some(0), 50, 100), 50);
        assert_eq!(clamp_limit(Some(-3), 50, 100), 50);
        assert_eq!(clamp_limit(Some(20), 50, 100), 20);
        assert_eq!(clamp_limit(Some(1000), 50, 100), 100);
    }

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "Invalid alert ID").unwrap(), 42);
        let err = parse_id("abc", "Invalid alert ID").unwrap_err();
        assert_eq!(err.to_string(), "Invalid alert ID");
        assert!(parse_id("0", "Invalid coin ID").is_err());
    }
}
