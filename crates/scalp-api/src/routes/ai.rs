//! AI 제공자 관리와 채팅 endpoint.
//!
//! - `GET /api/ai/providers` - 설정된 제공자 + 지원 카탈로그
//! - `POST /api/ai/providers` - 제공자 추가
//! - `PUT /api/ai/providers/{id}` - 부분 수정
//! - `DELETE /api/ai/providers/{id}` - 삭제
//! - `POST /api/ai/providers/{id}/test` - 모델 목록 조회로 연결 확인
//! - `POST /api/ai/providers/fetch-models` - 저장 전 키로 모델 목록 조회
//! - `GET /api/ai/providers/{id}/models` - 저장된 키로 모델 목록 조회
//! - `POST /api/ai/chat` - 채팅

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{info, warn};
use validator::Validate;

use super::{json_body, parse_id, validation_message};
use crate::ai::{AiError, CatalogEntry, ChatRequest, ModelDetail, AVAILABLE_PROVIDERS};
use crate::auth::JwtAuth;
use crate::error::{ApiError, ApiResult};
use crate::repository::{
    AiProviderRecord, AiProviderRepository, NewAiProvider, UpdateAiProvider,
};
use crate::state::AppState;

/// 기본 최대 토큰 수.
const DEFAULT_MAX_TOKENS: i32 = 2000;

/// 제공자 미설정 시 채팅 응답.
pub const SETUP_HELP: &str = "To use the AI assistant, please configure an AI provider in Settings:
1. Go to Settings → AI Providers
2. Add your API key (OpenAI, Anthropic, etc.)
3. Set it as default

Once configured, I'll be able to:
• Search and filter coins for you
• Provide technical analysis
• Create alerts automatically
• Add coins to your watchlist";

fn default_temperature() -> Decimal {
    Decimal::new(7, 1)
}

// ================================================================================================
// Request/Response Types
// ================================================================================================

#[derive(Debug, Serialize)]
pub struct ProvidersResponse {
    pub configured: Vec<AiProviderRecord>,
    pub available: &'static [CatalogEntry],
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AddProviderRequest {
    #[validate(length(min = 1, message = "providerType is required"))]
    pub provider_type: String,
    #[validate(length(min = 1, message = "providerName is required"))]
    pub provider_name: String,
    #[validate(length(min = 1, message = "apiKey is required"))]
    pub api_key: String,
    #[validate(length(min = 1, message = "modelName is required"))]
    pub model_name: String,
    #[serde(default)]
    pub max_tokens: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub temperature: Option<Decimal>,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub monthly_budget: Option<Decimal>,
}

impl AddProviderRequest {
    /// 0 또는 미지정 값에 기본값 적용.
    pub fn into_new_provider(self) -> NewAiProvider {
        NewAiProvider {
            provider_type: self.provider_type,
            provider_name: self.provider_name,
            api_key: self.api_key,
            model_name: self.model_name,
            max_tokens: self
                .max_tokens
                .filter(|t| *t != 0)
                .unwrap_or(DEFAULT_MAX_TOKENS),
            temperature: self
                .temperature
                .filter(|t| !t.is_zero())
                .unwrap_or_else(default_temperature),
            is_default: self.is_default,
            monthly_budget: self.monthly_budget,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProviderRequest {
    pub provider_name: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub max_tokens: Option<i32>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub temperature: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub monthly_budget: Option<Decimal>,
}

impl From<UpdateProviderRequest> for UpdateAiProvider {
    fn from(r: UpdateProviderRequest) -> Self {
        Self {
            provider_name: r.provider_name,
            api_key: r.api_key,
            model_name: r.model_name,
            max_tokens: r.max_tokens,
            temperature: r.temperature,
            is_active: r.is_active,
            is_default: r.is_default,
            monthly_budget: r.monthly_budget,
        }
    }
}

#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FetchModelsRequest {
    #[validate(length(min = 1, message = "providerType is required"))]
    pub provider_type: String,
    #[validate(length(min = 1, message = "apiKey is required"))]
    pub api_key: String,
}

#[derive(Debug, Serialize)]
pub struct ModelsResponse {
    pub models: Vec<String>,
    pub details: Vec<ModelDetail>,
}

impl From<Vec<ModelDetail>> for ModelsResponse {
    fn from(details: Vec<ModelDetail>) -> Self {
        Self {
            models: details.iter().map(|d| d.id.clone()).collect(),
            details,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TestResponse {
    pub status: &'static str,
    pub message: String,
    pub response_time_ms: u64,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatBody {
    #[serde(default)]
    pub message: String,
    pub provider_id: Option<i32>,
}

#[derive(Debug, Serialize)]
pub struct ChatResponse {
    pub response: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
}

fn validated<T: Validate>(request: T) -> ApiResult<T> {
    request.validate().map_err(|e| {
        ApiError::bad_request(format!("Invalid request: {}", validation_message(&e)))
    })?;
    Ok(request)
}

fn model_error(err: AiError) -> ApiError {
    ApiError::bad_request(err.to_string())
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/ai/providers
async fn list_providers(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<ProvidersResponse>> {
    let user_id = auth.user_id()?;
    let configured = AiProviderRepository::list_for_user(state.db()?, user_id)
        .await
        .map_err(|e| {
            warn!("Failed to fetch providers: {}", e);
            ApiError::internal("Failed to fetch providers")
        })?;

    Ok(Json(ProvidersResponse {
        configured,
        available: AVAILABLE_PROVIDERS,
    }))
}

/// POST /api/ai/providers
async fn add_provider(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    payload: Result<Json<AddProviderRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user_id = auth.user_id()?;
    let request = validated(json_body(payload, "Invalid request")?)?;
    let input = request.into_new_provider();

    let id = AiProviderRepository::create(state.db()?, user_id, &input)
        .await
        .map_err(|e| ApiError::internal(format!("Failed to save provider: {}", e)))?;

    info!(
        user_id = %user_id,
        provider_id = id,
        provider_type = %input.provider_type,
        "AI provider added"
    );

    Ok((
        StatusCode::CREATED,
        Json(json!({ "id": id, "message": "AI provider added successfully" })),
    ))
}

/// PUT /api/ai/providers/{id}
async fn update_provider(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateProviderRequest>, JsonRejection>,
) -> ApiResult<Json<Value>> {
    let user_id = auth.user_id()?;
    let provider_id = parse_id(&raw_id, "Invalid provider ID")?;
    let Json(request) = payload.map_err(|_| ApiError::bad_request("Invalid request"))?;

    let updated =
        AiProviderRepository::update(state.db()?, user_id, provider_id, &request.into())
            .await
            .map_err(|e| ApiError::internal(format!("Failed to update provider: {}", e)))?;
    if !updated {
        return Err(ApiError::not_found("Provider not found"));
    }

    Ok(Json(json!({ "status": "updated" })))
}

/// DELETE /api/ai/providers/{id}
async fn delete_provider(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = auth.user_id()?;
    let provider_id = parse_id(&raw_id, "Invalid provider ID")?;

    AiProviderRepository::delete(state.db()?, user_id, provider_id)
        .await
        .map_err(|_| ApiError::internal("Failed to delete provider"))?;

    Ok(Json(json!({ "status": "deleted" })))
}

/// POST /api/ai/providers/{id}/test
///
/// 저장된 키로 모델 목록을 조회해 응답 시간을 보고합니다.
async fn test_provider(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<TestResponse>> {
    let user_id = auth.user_id()?;
    let provider_id = parse_id(&raw_id, "Invalid provider ID")?;

    let credentials = AiProviderRepository::credentials(state.db()?, user_id, provider_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;
    if credentials.api_key.is_empty() {
        return Err(ApiError::bad_request("No API key configured"));
    }

    let started = Instant::now();
    let result = state
        .ai
        .list_models(&credentials.provider_type, &credentials.api_key)
        .await;
    let response_time_ms = started.elapsed().as_millis() as u64;

    let response = match result {
        Ok(_) => TestResponse {
            status: "success",
            message: "Connection test passed".to_string(),
            response_time_ms,
        },
        Err(e) => {
            warn!(provider_id, "Provider connection test failed: {}", e);
            TestResponse {
                status: "error",
                message: e.to_string(),
                response_time_ms,
            }
        }
    };

    Ok(Json(response))
}

/// POST /api/ai/providers/fetch-models
async fn fetch_models(
    State(state): State<Arc<AppState>>,
    _auth: JwtAuth,
    payload: Result<Json<FetchModelsRequest>, JsonRejection>,
) -> ApiResult<Json<ModelsResponse>> {
    let request = validated(json_body(payload, "Invalid request")?)?;

    let details = state
        .ai
        .list_models(&request.provider_type, &request.api_key)
        .await
        .map_err(model_error)?;

    Ok(Json(details.into()))
}

/// GET /api/ai/providers/{id}/models
async fn provider_models(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<ModelsResponse>> {
    let user_id = auth.user_id()?;
    let provider_id = parse_id(&raw_id, "Invalid provider ID")?;

    let credentials = AiProviderRepository::credentials(state.db()?, user_id, provider_id)
        .await?
        .ok_or_else(|| ApiError::not_found("Provider not found"))?;
    if credentials.api_key.is_empty() {
        return Err(ApiError::bad_request(
            "No API key configured for this provider",
        ));
    }

    let details = state
        .ai
        .list_models(&credentials.provider_type, &credentials.api_key)
        .await
        .map_err(model_error)?;

    Ok(Json(details.into()))
}

/// POST /api/ai/chat
async fn chat(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    payload: Result<Json<ChatBody>, JsonRejection>,
) -> ApiResult<Json<ChatResponse>> {
    let user_id = auth.user_id()?;
    let Json(body) = payload.map_err(|_| ApiError::bad_request("Message is required"))?;
    if body.message.trim().is_empty() {
        return Err(ApiError::bad_request("Message is required"));
    }

    let credentials = AiProviderRepository::chat_credentials(state.db()?, user_id, body.provider_id)
        .await
        .map_err(|e| {
            warn!("Failed to get provider: {}", e);
            ApiError::internal("Failed to get provider")
        })?;

    let Some(credentials) = credentials else {
        return Ok(Json(ChatResponse {
            response: SETUP_HELP.to_string(),
            provider: None,
            model: None,
        }));
    };

    let request = ChatRequest {
        api_key: &credentials.api_key,
        model: &credentials.model_name,
        message: &body.message,
        max_tokens: credentials.max_tokens,
        temperature: credentials.temperature.to_f64().unwrap_or(0.7),
    };

    let response = state
        .ai
        .chat(&credentials.provider_type, &request)
        .await
        .map_err(|e| {
            warn!(provider = %credentials.provider_type, "AI call failed: {}", e);
            ApiError::Upstream(format!("AI call failed: {}", e))
        })?;

    Ok(Json(ChatResponse {
        response,
        provider: Some(credentials.provider_type),
        model: Some(credentials.model_name),
    }))
}

/// AI 라우터 생성.
pub fn ai_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/providers", get(list_providers).post(add_provider))
        .route("/providers/fetch-models", post(fetch_models))
        .route("/providers/{id}", put(update_provider).delete(delete_provider))
        .route("/providers/{id}/test", post(test_provider))
        .route("/providers/{id}/models", get(provider_models))
        .route("/chat", post(chat))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiClient;
    use crate::auth::{create_token, Claims, JwtConfig};
    use crate::state::create_test_state;
    use axum::{body::Body, http::Request, Extension};
    use mockito::Server;
    use tower::ServiceExt;

    fn app_with(state: AppState) -> Router {
        ai_router()
            .with_state(Arc::new(state))
            .layer(Extension(JwtConfig {
                secret: "test-secret".to_string(),
            }))
    }

    async fn post_json(app: Router, uri: &str, body: &str) -> (StatusCode, Value) {
        let claims = Claims::new(uuid::Uuid::new_v4().to_string(), "ai@example.com", 1);
        let token = create_token(&claims, "test-secret").unwrap().token;

        let response = app
            .oneshot(
                Request::post(uri)
                    .header("authorization", format!("Bearer {}", token))
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[test]
    fn test_add_request_defaults() {
        let request: AddProviderRequest = serde_json::from_str(
            r#"{"providerType":"groq","providerName":"Fast","apiKey":"gsk","modelName":"llama","maxTokens":0}"#,
        )
        .unwrap();
        let provider = request.into_new_provider();
        assert_eq!(provider.max_tokens, 2000);
        assert_eq!(provider.temperature, Decimal::new(7, 1));
        assert!(!provider.is_default);
        assert!(provider.monthly_budget.is_none());
    }

    #[tokio::test]
    async fn test_add_requires_fields() {
        let (status, body) = post_json(
            app_with(create_test_state()),
            "/providers",
            r#"{"providerType":"openai","providerName":"","apiKey":"k","modelName":"gpt-4o"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Invalid request: providerName is required");
    }

    #[tokio::test]
    async fn test_chat_requires_message() {
        let (status, body) =
            post_json(app_with(create_test_state()), "/chat", r#"{"message":"  "}"#).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Message is required");

        let (status, _) = post_json(app_with(create_test_state()), "/chat", "{}").await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_fetch_models() {
        let mut server = Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .match_header("authorization", "Bearer sk-test")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"gpt-4o","context_length":128000},{"id":"gpt-4o-mini"}]}"#)
            .create_async()
            .await;

        let mut state = create_test_state();
        state.ai = AiClient::new().unwrap().with_base_url(server.url());

        let (status, body) = post_json(
            app_with(state),
            "/providers/fetch-models",
            r#"{"providerType":"openai","apiKey":"sk-test"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["models"], json!(["gpt-4o", "gpt-4o-mini"]));
        assert_eq!(body["details"][0]["contextLength"], 128000);
        assert!(body["details"][1].get("contextLength").is_none());
    }

    #[tokio::test]
    async fn test_fetch_models_provider_error_is_400() {
        let mut server = Server::new_async().await;
        let _models = server
            .mock("GET", "/v1/models")
            .with_status(401)
            .with_body("invalid key")
            .create_async()
            .await;

        let mut state = create_test_state();
        state.ai = AiClient::new().unwrap().with_base_url(server.url());

        let (status, body) = post_json(
            app_with(state),
            "/providers/fetch-models",
            r#"{"providerType":"openai","apiKey":"bad"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "provider API error (401): invalid key");
    }

    #[tokio::test]
    async fn test_fetch_models_catalog_fallback() {
        let (status, body) = post_json(
            app_with(create_test_state()),
            "/providers/fetch-models",
            r#"{"providerType":"together","apiKey":"k"}"#,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert!(!body["models"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_chat_response_without_provider() {
        let json = serde_json::to_value(ChatResponse {
            response: SETUP_HELP.to_string(),
            provider: None,
            model: None,
        })
        .unwrap();
        assert!(json["response"]
            .as_str()
            .unwrap()
            .starts_with("To use the AI assistant"));
        assert!(json.get("provider").is_none());
    }
}
