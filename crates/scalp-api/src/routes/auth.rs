//! 인증 endpoint.
//!
//! - `POST /api/auth/register` - 회원가입 후 토큰 발급
//! - `POST /api/auth/login` - 로그인
//! - `GET /api/auth/me` - 현재 사용자
//! - `POST /api/auth/refresh` - 토큰 재발급

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

use super::{json_body, validation_message};
use crate::auth::{create_token, hash_password, verify_password, Claims, IssuedToken, JwtAuth};
use crate::error::{ApiError, ApiResult};
use crate::repository::{NewUser, UserRecord, UserRepository};
use crate::state::AppState;

// ================================================================================================
// Request/Response Types
// ================================================================================================

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(email(message = "email must be a valid address"))]
    pub email: String,
    #[validate(length(min = 3, max = 50, message = "username must be 3-50 characters"))]
    pub username: String,
    #[validate(length(min = 8, message = "password must be at least 8 characters"))]
    pub password: String,
}

#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// 사용자 요약.
#[derive(Debug, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub email: String,
    pub username: String,
}

impl From<UserRecord> for UserSummary {
    fn from(user: UserRecord) -> Self {
        Self {
            id: user.id,
            email: user.email,
            username: user.username,
        }
    }
}

/// 토큰 + 사용자.
#[derive(Debug, Serialize)]
pub struct AuthResponse {
    #[serde(flatten)]
    pub token: IssuedToken,
    pub user: UserSummary,
}

fn issue_token(state: &AppState, user_id: Uuid, email: &str) -> ApiResult<IssuedToken> {
    let claims = Claims::new(user_id.to_string(), email, state.config.auth.token_ttl_hours);
    create_token(&claims, state.jwt_secret())
        .map_err(|_| ApiError::internal("Failed to generate token"))
}

// ================================================================================================
// Handlers
// ================================================================================================

/// POST /api/auth/register
async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AuthResponse>)> {
    let request = json_body(payload, "Invalid request")?;
    request.validate().map_err(|e| {
        ApiError::bad_request(format!("Invalid request: {}", validation_message(&e)))
    })?;

    let pool = state.db()?;

    if UserRepository::email_exists(pool, &request.email).await? {
        return Err(ApiError::Conflict("Email already registered".to_string()));
    }
    if UserRepository::username_exists(pool, &request.username).await? {
        return Err(ApiError::Conflict("Username already taken".to_string()));
    }

    let password = request.password.clone();
    let password_hash = tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|_| ApiError::internal("Failed to hash password"))?
        .map_err(|_| ApiError::internal("Failed to hash password"))?;

    let user_id = UserRepository::create(
        pool,
        NewUser {
            email: &request.email,
            username: &request.username,
            password_hash: &password_hash,
        },
    )
    .await?;

    info!(user_id = %user_id, "User registered");

    let token = issue_token(&state, user_id, &request.email)?;
    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            token,
            user: UserSummary {
                id: user_id,
                email: request.email,
                username: request.username,
            },
        }),
    ))
}

/// POST /api/auth/login
async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> ApiResult<Json<AuthResponse>> {
    let request = payload
        .map(|Json(body)| body)
        .map_err(|_| ApiError::bad_request("Invalid request"))?;
    request
        .validate()
        .map_err(|_| ApiError::bad_request("Invalid request"))?;

    let pool = state.db()?;
    let invalid = || ApiError::Unauthorized("Invalid email or password".to_string());

    let user = UserRepository::find_active_by_email(pool, &request.email)
        .await?
        .ok_or_else(invalid)?;

    let password = request.password.clone();
    let hash = user.password_hash.clone();
    let verified = tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|_| ApiError::internal("Failed to verify password"))?;
    if verified.is_err() {
        warn!(email = %request.email, "Login failed");
        return Err(invalid());
    }

    let token = issue_token(&state, user.id, &user.email)?;
    Ok(Json(AuthResponse {
        token,
        user: user.into(),
    }))
}

/// GET /api/auth/me
async fn me(State(state): State<Arc<AppState>>, auth: JwtAuth) -> ApiResult<Json<UserSummary>> {
    let user_id = auth.user_id()?;
    let user = UserRepository::find_by_id(state.db()?, user_id)
        .await?
        .ok_or_else(|| ApiError::not_found("User not found"))?;

    Ok(Json(user.into()))
}

/// POST /api/auth/refresh
async fn refresh(State(state): State<Arc<AppState>>, auth: JwtAuth) -> ApiResult<Json<IssuedToken>> {
    let user_id = auth.user_id()?;
    Ok(Json(issue_token(&state, user_id, &auth.0.email)?))
}

/// 인증 라우터 생성.
pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/me", get(me))
        .route("/refresh", post(refresh))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{decode_token, JwtConfig};
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request, Extension};
    use tower::ServiceExt;

    fn app() -> Router {
        auth_router()
            .with_state(Arc::new(create_test_state()))
            .layer(Extension(JwtConfig {
                secret: scalp_core::DEFAULT_JWT_SECRET.to_string(),
            }))
    }

    async fn body_json(response: axum::response::Response) -> serde_json::Value {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[test]
    fn test_register_validation_messages() {
        let request = RegisterRequest {
            email: "not-an-email".into(),
            username: "ab".into(),
            password: "short".into(),
        };
        let errors = request.validate().unwrap_err();
        let message = validation_message(&errors);
        assert!(message.contains("email must be a valid address"));
        assert!(message.contains("username must be 3-50 characters"));
        assert!(message.contains("password must be at least 8 characters"));
    }

    #[tokio::test]
    async fn test_register_rejects_invalid_body() {
        let response = app()
            .oneshot(
                Request::post("/register")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"email":"x","username":"ab","password":"1"}"#))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = body_json(response).await;
        assert!(body["error"].as_str().unwrap().starts_with("Invalid request: "));
    }

    #[tokio::test]
    async fn test_login_malformed_json() {
        let response = app()
            .oneshot(
                Request::post("/login")
                    .header("content-type", "application/json")
                    .body(Body::from("{not json"))
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["error"], "Invalid request");
    }

    #[tokio::test]
    async fn test_refresh_issues_new_token() {
        let user_id = Uuid::new_v4();
        let claims = Claims::new(user_id.to_string(), "owner@example.com", 1);
        let issued = create_token(&claims, scalp_core::DEFAULT_JWT_SECRET).unwrap();

        let response = app()
            .oneshot(
                Request::post("/refresh")
                    .header("authorization", format!("Bearer {}", issued.token))
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = body_json(response).await;
        assert!(body["expiresAt"].is_i64());

        let decoded =
            decode_token(body["token"].as_str().unwrap(), scalp_core::DEFAULT_JWT_SECRET).unwrap();
        assert_eq!(decoded.claims.user_id, user_id.to_string());
    }

    #[tokio::test]
    async fn test_me_requires_token() {
        let response = app()
            .oneshot(Request::get("/me").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
