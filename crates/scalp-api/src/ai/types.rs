//! AI 제공자 공통 타입.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// AI 호출 에러.
#[derive(Debug, Error)]
pub enum AiError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// 채팅 API 비정상 응답
    #[error("API error ({status}): {body}")]
    Api { status: u16, body: String },

    /// 모델 목록 API 비정상 응답
    #[error("provider API error ({status}): {body}")]
    ModelListing { status: u16, body: String },

    /// 응답 본문의 error.message
    #[error("API error: {0}")]
    Provider(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("no response from AI")]
    EmptyResponse,
}

pub type AiResult<T> = Result<T, AiError>;

/// 제공자 API 계열.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderFamily {
    OpenAiCompatible,
    Anthropic,
    Google,
}

impl ProviderFamily {
    /// 제공자 타입 문자열로 계열 결정. 나머지는 모두 OpenAI 호환.
    pub fn from_type(provider_type: &str) -> Self {
        match provider_type {
            "anthropic" => ProviderFamily::Anthropic,
            "google" => ProviderFamily::Google,
            _ => ProviderFamily::OpenAiCompatible,
        }
    }
}

/// 단일 턴 채팅 요청.
#[derive(Debug, Clone)]
pub struct ChatRequest<'a> {
    pub api_key: &'a str,
    pub model: &'a str,
    pub message: &'a str,
    pub max_tokens: i32,
    pub temperature: f64,
}

/// 모델 정보.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDetail {
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context_length: Option<u64>,
}

impl ModelDetail {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            context_length: None,
        }
    }
}

/// 채팅/모델 목록 제공자.
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// 제공자 타입 (`openai`, `anthropic` 등).
    fn provider_type(&self) -> &str;

    /// 사용자 메시지 하나에 대한 응답 텍스트.
    async fn chat(&self, request: &ChatRequest<'_>) -> AiResult<String>;

    /// 사용 가능한 모델 목록.
    async fn list_models(&self, api_key: &str) -> AiResult<Vec<ModelDetail>>;
}

/// 공통 응답 에러 필드 (`{"error": {"message": ...}}`).
#[derive(Debug, Default, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

/// 응답 상태 확인 후 본문 반환.
pub(crate) async fn read_chat_body(response: reqwest::Response) -> AiResult<String> {
    let status = response.status();
    let body = response.text().await?;
    if status != reqwest::StatusCode::OK {
        return Err(AiError::Api {
            status: status.as_u16(),
            body,
        });
    }
    Ok(body)
}

/// `{"data": [{"id", "context_length"?}]}` 형식의 모델 목록 파싱.
pub(crate) async fn read_model_list(response: reqwest::Response) -> AiResult<Vec<ModelDetail>> {
    #[derive(Deserialize)]
    struct Entry {
        id: String,
        #[serde(default)]
        context_length: Option<u64>,
    }

    #[derive(Deserialize)]
    struct Listing {
        #[serde(default)]
        data: Vec<Entry>,
    }

    let status = response.status();
    let body = response.text().await?;
    if status != reqwest::StatusCode::OK {
        return Err(AiError::ModelListing {
            status: status.as_u16(),
            body,
        });
    }

    let listing: Listing =
        serde_json::from_str(&body).map_err(|e| AiError::Parse(e.to_string()))?;

    Ok(listing
        .data
        .into_iter()
        .map(|entry| ModelDetail {
            id: entry.id,
            context_length: entry.context_length,
        })
        .collect())
}
