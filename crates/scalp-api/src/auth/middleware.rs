//! Axum용 JWT 인증 추출기.

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use scalp_core::DEFAULT_JWT_SECRET;
use serde_json::json;
use uuid::Uuid;

use super::{decode_token, Claims, JwtError};

/// JWT 인증 추출기.
///
/// ```rust,ignore
/// async fn protected_handler(JwtAuth(claims): JwtAuth) -> impl IntoResponse {
///     claims.email
/// }
/// ```
#[derive(Debug, Clone)]
pub struct JwtAuth(pub Claims);

impl JwtAuth {
    /// 토큰의 사용자 ID.
    ///
    /// 서명된 토큰이라도 UUID가 아니면 인증 실패로 처리합니다.
    pub fn user_id(&self) -> Result<Uuid, JwtAuthError> {
        self.0.user_uuid().ok_or(JwtAuthError::InvalidToken)
    }
}

/// JWT 인증 에러.
#[derive(Debug, thiserror::Error)]
pub enum JwtAuthError {
    #[error("Authorization header required")]
    MissingToken,
    #[error("Invalid authorization header format")]
    InvalidAuthHeader,
    #[error("Token expired")]
    TokenExpired,
    #[error("Invalid token")]
    InvalidToken,
}

impl IntoResponse for JwtAuthError {
    fn into_response(self) -> Response {
        let body = Json(json!({ "error": self.to_string() }));
        (StatusCode::UNAUTHORIZED, body).into_response()
    }
}

/// JWT 비밀 키 저장소.
///
/// 라우터에 `Extension`으로 등록됩니다.
#[derive(Clone)]
pub struct JwtConfig {
    pub secret: String,
}

impl<S> FromRequestParts<S> for JwtAuth
where
    S: Send + Sync,
{
    type Rejection = JwtAuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .ok_or(JwtAuthError::MissingToken)?;

        let token = auth_header
            .strip_prefix("Bearer ")
            .ok_or(JwtAuthError::InvalidAuthHeader)?;

        let secret = parts
            .extensions
            .get::<JwtConfig>()
            .map(|c| c.secret.clone())
            .unwrap_or_else(|| DEFAULT_JWT_SECRET.to_string());

        let token_data = decode_token(token, &secret).map_err(|e| match e {
            JwtError::TokenExpired => JwtAuthError::TokenExpired,
            _ => JwtAuthError::InvalidToken,
        })?;

        Ok(JwtAuth(token_data.claims))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::create_token;
    use axum::http::Request;

    fn parts_with(header: Option<&str>, secret: &str) -> Parts {
        let mut builder = Request::builder().uri("/api/alerts");
        if let Some(value) = header {
            builder = builder.header(AUTHORIZATION, value);
        }
        let (mut parts, _) = builder.body(()).unwrap().into_parts();
        parts.extensions.insert(JwtConfig {
            secret: secret.to_string(),
        });
        parts
    }

    #[tokio::test]
    async fn test_valid_bearer_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id.to_string(), "a@b.io", 1);
        let issued = create_token(&claims, "s3cret").unwrap();

        let header = format!("Bearer {}", issued.token);
        let mut parts = parts_with(Some(&header), "s3cret");
        let auth = JwtAuth::from_request_parts(&mut parts, &()).await.unwrap();

        assert_eq!(auth.user_id().unwrap(), user_id);
        assert_eq!(auth.0.email, "a@b.io");
    }

    #[tokio::test]
    async fn test_missing_and_malformed_header() {
        let mut parts = parts_with(None, "s3cret");
        assert!(matches!(
            JwtAuth::from_request_parts(&mut parts, &()).await,
            Err(JwtAuthError::MissingToken)
        ));

        let mut parts = parts_with(Some("Token abc"), "s3cret");
        assert!(matches!(
            JwtAuth::from_request_parts(&mut parts, &()).await,
            Err(JwtAuthError::InvalidAuthHeader)
        ));
    }

    #[tokio::test]
    async fn test_rejection_is_401_json() {
        let response = JwtAuthError::InvalidToken.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"], "Invalid token");
    }

    #[test]
    fn test_non_uuid_subject() {
        let auth = JwtAuth(Claims::new("not-a-uuid", "a@b.io", 1));
        assert!(matches!(auth.user_id(), Err(JwtAuthError::InvalidToken)));
    }
}
