//! 사용자 설정 endpoint.
//!
//! - `PUT /api/users/me/telegram` - 알림용 텔레그램 채팅 ID 저장

use axum::{
    extract::{rejection::JsonRejection, State},
    routing::put,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use crate::auth::JwtAuth;
use crate::error::{ApiError, ApiResult};
use crate::repository::UserRepository;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramRequest {
    /// `null` 또는 0이면 해제
    pub chat_id: Option<i64>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TelegramResponse {
    pub status: &'static str,
    pub telegram_chat_id: Option<i64>,
}

/// PUT /api/users/me/telegram
async fn set_telegram(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    payload: Result<Json<TelegramRequest>, JsonRejection>,
) -> ApiResult<Json<TelegramResponse>> {
    let user_id = auth.user_id()?;
    let Json(request) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    let chat_id = request.chat_id.filter(|id| *id != 0);

    let found = UserRepository::set_telegram_chat_id(state.db()?, user_id, chat_id).await?;
    if !found {
        return Err(ApiError::not_found("User not found"));
    }

    info!(user_id = %user_id, linked = chat_id.is_some(), "Telegram chat id updated");

    Ok(Json(TelegramResponse {
        status: "updated",
        telegram_chat_id: chat_id,
    }))
}

/// 사용자 라우터 생성.
pub fn users_router() -> Router<Arc<AppState>> {
    Router::new().route("/me/telegram", put(set_telegram))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{create_token, Claims, JwtConfig};
    use crate::state::create_test_state;
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        Extension,
    };
    use tower::ServiceExt;

    fn app() -> Router {
        users_router()
            .with_state(Arc::new(create_test_state()))
            .layer(Extension(JwtConfig {
                secret: "test-secret".to_string(),
            }))
    }

    #[tokio::test]
    async fn test_requires_auth() {
        let response = app()
            .oneshot(
                Request::put("/me/telegram")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"chatId":123}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_without_database() {
        let claims = Claims::new(uuid::Uuid::new_v4().to_string(), "t@example.com", 1);
        let token = create_token(&claims, "test-secret").unwrap().token;

        let response = app()
            .oneshot(
                Request::put("/me/telegram")
                    .header("authorization", format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"chatId":123456789}"#))
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[test]
    fn test_response_shape() {
        let json = serde_json::to_value(TelegramResponse {
            status: "updated",
            telegram_chat_id: None,
        })
        .unwrap();
        assert_eq!(json["status"], "updated");
        assert!(json["telegramChatId"].is_null());
    }
}
