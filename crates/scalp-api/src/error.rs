//! API 에러 응답 타입.
//!
//! 모든 엔드포인트는 실패 시 동일한 형식을 반환합니다.
//!
//! ```json
//! { "error": "Coin not found" }
//! ```

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use scalp_analytics::IndicatorError;
use scalp_exchange::ExchangeError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::auth::JwtAuthError;

/// HTTP 에러 분류.
#[derive(Debug, Error)]
pub enum ApiError {
    /// 잘못된 요청 본문/경로/쿼리 (400)
    #[error("{0}")]
    BadRequest(String),

    /// 인증 실패 (401)
    #[error("{0}")]
    Unauthorized(String),

    /// 리소스 없음 (404)
    #[error("{0}")]
    NotFound(String),

    /// 중복 리소스 (409)
    #[error("{0}")]
    Conflict(String),

    /// 외부 서비스(거래소, AI 제공자) 실패 (500, 메시지 포함)
    #[error("{0}")]
    Upstream(String),

    /// 내부 에러 (500)
    #[error("{0}")]
    Internal(String),

    /// 의존 서비스 미설정 (503)
    #[error("{0}")]
    ServiceUnavailable(String),
}

/// API 핸들러 Result 타입.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Internal(message.into())
    }

    /// 데이터베이스 미연결.
    pub fn database_unavailable() -> Self {
        ApiError::ServiceUnavailable("Database not available".to_string())
    }

    /// HTTP 상태 코드.
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Upstream(_) | ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::ServiceUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(status = status.as_u16(), "API error: {}", self);
        }
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("Not found".to_string()),
            other => {
                error!("Database error: {}", other);
                ApiError::Internal("Database error".to_string())
            }
        }
    }
}

impl From<ExchangeError> for ApiError {
    fn from(err: ExchangeError) -> Self {
        ApiError::Upstream(err.to_string())
    }
}

impl From<JwtAuthError> for ApiError {
    fn from(err: JwtAuthError) -> Self {
        ApiError::Unauthorized(err.to_string())
    }
}

impl From<IndicatorError> for ApiError {
    fn from(err: IndicatorError) -> Self {
        ApiError::BadRequest(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn body_json(response: Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_error_body_shape() {
        let response = ApiError::not_found("Coin not found").into_response();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        let body = body_json(response).await;
        assert_eq!(body, json!({ "error": "Coin not found" }));
    }

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::Upstream("x".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            ApiError::database_unavailable().status_code(),
            StatusCode::SERVICE_UNAVAILABLE
        );
    }

    #[test]
    fn test_indicator_error_is_bad_request() {
        let err: ApiError = IndicatorError::InsufficientData {
            required: 35,
            provided: 10,
        }
        .into();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert!(err.to_string().contains("35"));
    }

    #[test]
    fn test_row_not_found_maps_to_404() {
        let err: ApiError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }
}
