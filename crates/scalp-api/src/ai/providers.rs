//! 제공자 계열별 HTTP 구현.

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::debug;

use super::catalog::catalog_models;
use super::types::{
    read_chat_body, read_model_list, AiError, AiResult, ChatProvider, ChatRequest, ErrorBody,
    ModelDetail,
};

/// OpenAI 호환 계열 시스템 프롬프트.
pub const ASSISTANT_PROMPT: &str = "You are Scalpaiboard AI, a helpful cryptocurrency trading assistant. You can:
- Analyze market trends and provide insights
- Explain technical indicators (RSI, MACD, Bollinger Bands)
- Help users understand crypto concepts
- Suggest trading strategies (not financial advice)
Keep responses concise and actionable. Focus on crypto and trading topics.";

/// Anthropic 시스템 프롬프트.
pub const ANTHROPIC_PROMPT: &str =
    "You are Scalpaiboard AI, a helpful cryptocurrency trading assistant.";

pub const ANTHROPIC_VERSION: &str = "2023-06-01";

fn models_from_catalog(provider_type: &str) -> Vec<ModelDetail> {
    catalog_models(provider_type)
        .iter()
        .map(|id| ModelDetail::new(*id))
        .collect()
}

// ================================================================================================
// OpenAI compatible
// ================================================================================================

/// OpenAI 호환 엔드포인트.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenAiEndpoint {
    pub base: &'static str,
    pub chat_path: &'static str,
    /// 원격 모델 목록 경로. 없으면 카탈로그 사용
    pub models_path: Option<&'static str>,
}

impl OpenAiEndpoint {
    /// 제공자 타입별 엔드포인트. 모르는 타입은 OpenAI로 보냅니다.
    pub fn for_type(provider_type: &str) -> Self {
        match provider_type {
            "xai" => Self {
                base: "https://api.x.ai",
                chat_path: "/v1/chat/completions",
                models_path: None,
            },
            "deepseek" => Self {
                base: "https://api.deepseek.com",
                chat_path: "/chat/completions",
                models_path: Some("/models"),
            },
            "mistral" => Self {
                base: "https://api.mistral.ai",
                chat_path: "/v1/chat/completions",
                models_path: Some("/v1/models"),
            },
            "groq" => Self {
                base: "https://api.groq.com",
                chat_path: "/openai/v1/chat/completions",
                models_path: Some("/openai/v1/models"),
            },
            "together" => Self {
                base: "https://api.together.xyz",
                chat_path: "/v1/chat/completions",
                models_path: None,
            },
            "openrouter" => Self {
                base: "https://openrouter.ai",
                chat_path: "/api/v1/chat/completions",
                models_path: Some("/api/v1/models"),
            },
            "openai" => Self {
                base: "https://api.openai.com",
                chat_path: "/v1/chat/completions",
                models_path: Some("/v1/models"),
            },
            _ => Self {
                base: "https://api.openai.com",
                chat_path: "/v1/chat/completions",
                models_path: None,
            },
        }
    }
}

/// OpenAI Chat Completions 호환 제공자.
pub struct OpenAiCompatibleProvider {
    client: reqwest::Client,
    provider_type: String,
    base: String,
    endpoint: OpenAiEndpoint,
}

impl OpenAiCompatibleProvider {
    pub fn new(client: reqwest::Client, provider_type: &str, base_override: Option<&str>) -> Self {
        let endpoint = OpenAiEndpoint::for_type(provider_type);
        Self {
            client,
            provider_type: provider_type.to_string(),
            base: base_override.unwrap_or(endpoint.base).to_string(),
            endpoint,
        }
    }

    fn with_extra_headers(&self, builder: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        if self.provider_type == "openrouter" {
            builder
                .header("HTTP-Referer", "https://scalpaiboard.com")
                .header("X-Title", "Scalpaiboard")
        } else {
            builder
        }
    }
}

#[async_trait]
impl ChatProvider for OpenAiCompatibleProvider {
    fn provider_type(&self) -> &str {
        &self.provider_type
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> AiResult<String> {
        #[derive(Deserialize)]
        struct Message {
            #[serde(default)]
            content: String,
        }

        #[derive(Deserialize)]
        struct Choice {
            message: Message,
        }

        #[derive(Deserialize)]
        struct Completion {
            #[serde(default)]
            choices: Vec<Choice>,
            #[serde(default)]
            error: Option<ErrorBody>,
        }

        let url = format!("{}{}", self.base, self.endpoint.chat_path);
        debug!(provider = %self.provider_type, url = %url, "Calling AI provider");

        let body = json!({
            "model": request.model,
            "messages": [
                { "role": "system", "content": ASSISTANT_PROMPT },
                { "role": "user", "content": request.message },
            ],
            "max_tokens": request.max_tokens,
            "temperature": request.temperature,
        });

        let builder = self.client.post(&url).bearer_auth(request.api_key).json(&body);
        let response = self.with_extra_headers(builder).send().await?;
        let text = read_chat_body(response).await?;

        let completion: Completion =
            serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))?;

        if let Some(error) = completion.error.filter(|e| !e.message.is_empty()) {
            return Err(AiError::Provider(error.message));
        }

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(AiError::EmptyResponse)
    }

    async fn list_models(&self, api_key: &str) -> AiResult<Vec<ModelDetail>> {
        let Some(path) = self.endpoint.models_path else {
            return Ok(models_from_catalog(&self.provider_type));
        };

        let url = format!("{}{}", self.base, path);
        let response = self.client.get(&url).bearer_auth(api_key).send().await?;
        read_model_list(response).await
    }
}

// ================================================================================================
// Anthropic
// ================================================================================================

pub const ANTHROPIC_BASE: &str = "https://api.anthropic.com";

/// Anthropic Messages API 제공자.
pub struct AnthropicProvider {
    client: reqwest::Client,
    base: String,
}

impl AnthropicProvider {
    pub fn new(client: reqwest::Client, base_override: Option<&str>) -> Self {
        Self {
            client,
            base: base_override.unwrap_or(ANTHROPIC_BASE).to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    fn provider_type(&self) -> &str {
        "anthropic"
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> AiResult<String> {
        #[derive(Deserialize)]
        struct Block {
            #[serde(default)]
            text: String,
        }

        #[derive(Deserialize)]
        struct MessageResponse {
            #[serde(default)]
            content: Vec<Block>,
            #[serde(default)]
            error: Option<ErrorBody>,
        }

        let body = json!({
            "model": request.model,
            "max_tokens": request.max_tokens,
            "system": ANTHROPIC_PROMPT,
            "messages": [{ "role": "user", "content": request.message }],
        });

        let response = self
            .client
            .post(format!("{}/v1/messages", self.base))
            .header("x-api-key", request.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await?;
        let text = read_chat_body(response).await?;

        let parsed: MessageResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))?;

        if let Some(error) = parsed.error.filter(|e| !e.message.is_empty()) {
            return Err(AiError::Provider(error.message));
        }

        parsed
            .content
            .into_iter()
            .next()
            .map(|block| block.text)
            .ok_or(AiError::EmptyResponse)
    }

    async fn list_models(&self, api_key: &str) -> AiResult<Vec<ModelDetail>> {
        let response = self
            .client
            .get(format!("{}/v1/models", self.base))
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .send()
            .await?;

        // Anthropic은 context_length를 주지 않음
        let models = read_model_list(response).await?;
        Ok(models.into_iter().map(|m| ModelDetail::new(m.id)).collect())
    }
}

// ================================================================================================
// Google
// ================================================================================================

pub const GOOGLE_BASE: &str = "https://generativelanguage.googleapis.com";

/// Gemini generateContent 제공자.
pub struct GoogleProvider {
    client: reqwest::Client,
    base: String,
}

impl GoogleProvider {
    pub fn new(client: reqwest::Client, base_override: Option<&str>) -> Self {
        Self {
            client,
            base: base_override.unwrap_or(GOOGLE_BASE).to_string(),
        }
    }
}

#[async_trait]
impl ChatProvider for GoogleProvider {
    fn provider_type(&self) -> &str {
        "google"
    }

    async fn chat(&self, request: &ChatRequest<'_>) -> AiResult<String> {
        #[derive(Deserialize)]
        struct Part {
            #[serde(default)]
            text: String,
        }

        #[derive(Deserialize, Default)]
        struct Content {
            #[serde(default)]
            parts: Vec<Part>,
        }

        #[derive(Deserialize)]
        struct Candidate {
            #[serde(default)]
            content: Content,
        }

        #[derive(Deserialize)]
        struct GenerateResponse {
            #[serde(default)]
            candidates: Vec<Candidate>,
            #[serde(default)]
            error: Option<ErrorBody>,
        }

        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base, request.model
        );
        let body = json!({
            "contents": [{ "parts": [{ "text": request.message }] }],
            "generationConfig": {
                "maxOutputTokens": request.max_tokens,
                "temperature": request.temperature,
            },
        });

        let response = self
            .client
            .post(&url)
            .query(&[("key", request.api_key)])
            .json(&body)
            .send()
            .await?;
        let text = read_chat_body(response).await?;

        let parsed: GenerateResponse =
            serde_json::from_str(&text).map_err(|e| AiError::Parse(e.to_string()))?;

        if let Some(error) = parsed.error.filter(|e| !e.message.is_empty()) {
            return Err(AiError::Provider(error.message));
        }

        let candidate = parsed
            .candidates
            .into_iter()
            .next()
            .filter(|c| !c.content.parts.is_empty())
            .ok_or(AiError::EmptyResponse)?;

        Ok(candidate
            .content
            .parts
            .into_iter()
            .map(|part| part.text)
            .collect::<String>())
    }

    async fn list_models(&self, _api_key: &str) -> AiResult<Vec<ModelDetail>> {
        Ok(models_from_catalog("google"))
    }
}
