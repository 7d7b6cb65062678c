//! 제공자 타입 → [`ChatProvider`] 선택.

use std::time::Duration;

use super::providers::{AnthropicProvider, GoogleProvider, OpenAiCompatibleProvider};
use super::types::{AiResult, ChatProvider, ChatRequest, ModelDetail, ProviderFamily};

/// AI 제공자 호출 타임아웃.
const AI_TIMEOUT: Duration = Duration::from_secs(60);

/// 핸들러에서 공유하는 AI 클라이언트.
#[derive(Clone)]
pub struct AiClient {
    http: reqwest::Client,
    /// 모든 제공자의 기본 주소를 대체 (테스트용)
    base_override: Option<String>,
}

impl AiClient {
    pub fn new() -> AiResult<Self> {
        let http = reqwest::Client::builder().timeout(AI_TIMEOUT).build()?;
        Ok(Self {
            http,
            base_override: None,
        })
    }

    /// 모든 제공자를 지정한 주소로 보냅니다.
    pub fn with_base_url(mut self, base: impl Into<String>) -> Self {
        self.base_override = Some(base.into().trim_end_matches('/').to_string());
        self
    }

    /// 제공자 타입에 맞는 구현.
    pub fn provider(&self, provider_type: &str) -> Box<dyn ChatProvider> {
        let base = self.base_override.as_deref();
        match ProviderFamily::from_type(provider_type) {
            ProviderFamily::Anthropic => Box::new(AnthropicProvider::new(self.http.clone(), base)),
            ProviderFamily::Google => Box::new(GoogleProvider::new(self.http.clone(), base)),
            ProviderFamily::OpenAiCompatible => Box::new(OpenAiCompatibleProvider::new(
                self.http.clone(),
                provider_type,
                base,
            )),
        }
    }

    pub async fn chat(&self, provider_type: &str, request: &ChatRequest<'_>) -> AiResult<String> {
        self.provider(provider_type).chat(request).await
    }

    pub async fn list_models(
        &self,
        provider_type: &str,
        api_key: &str,
    ) -> AiResult<Vec<ModelDetail>> {
        self.provider(provider_type).list_models(api_key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::AiError;
    use mockito::{Matcher, Server};

    fn request<'a>(model: &'a str) -> ChatRequest<'a> {
        ChatRequest {
            api_key: "sk-test",
            model,
            message: "What is RSI?",
            max_tokens: 2000,
            temperature: 0.7,
        }
    }

    #[tokio::test]
    async fn test_openai_chat() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer sk-test")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "gpt-4o",
                "max_tokens": 2000,
                "temperature": 0.7
            })))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"role":"assistant","content":"RSI is momentum."}}]}"#)
            .create_async()
            .await;

        let client = AiClient::new().unwrap().with_base_url(server.url());
        let reply = client.chat("openai", &request("gpt-4o")).await.unwrap();

        assert_eq!(reply, "RSI is momentum.");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_openrouter_sends_extra_headers() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/api/v1/chat/completions")
            .match_header("http-referer", "https://scalpaiboard.com")
            .match_header("x-title", "Scalpaiboard")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"ok"}}]}"#)
            .create_async()
            .await;

        let client = AiClient::new().unwrap().with_base_url(server.url());
        let reply = client
            .chat("openrouter", &request("openai/gpt-4-turbo"))
            .await
            .unwrap();

        assert_eq!(reply, "ok");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_chat_error_paths() {
        let mut server = Server::new_async().await;
        let _unauthorized = server
            .mock("POST", "/v1/chat/completions")
            .with_status(401)
            .with_body("invalid key")
            .create_async()
            .await;
        let _empty = server
            .mock("POST", "/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[]}"#)
            .create_async()
            .await;
        let _body_error = server
            .mock("POST", "/v1/messages")
            .with_status(200)
            .with_body(r#"{"content":[],"error":{"message":"overloaded"}}"#)
            .create_async()
            .await;

        let client = AiClient::new().unwrap().with_base_url(server.url());

        let err = client.chat("openai", &request("gpt-4o")).await.unwrap_err();
        assert_eq!(err.to_string(), "API error (401): invalid key");

        let err = client.chat("deepseek", &request("deepseek-chat")).await.unwrap_err();
        assert!(matches!(err, AiError::EmptyResponse));

        let err = client.chat("anthropic", &request("claude-3-haiku")).await.unwrap_err();
        assert_eq!(err.to_string(), "API error: overloaded");
    }

    #[tokio::test]
    async fn test_anthropic_chat() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "sk-test")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJson(serde_json::json!({
                "model": "claude-3-haiku",
                "system": "You are Scalpaiboard AI, a helpful cryptocurrency trading assistant."
            })))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"text","text":"Hello"}]}"#)
            .create_async()
            .await;

        let client = AiClient::new().unwrap().with_base_url(server.url());
        let reply = client.chat("anthropic", &request("claude-3-haiku")).await.unwrap();

        assert_eq!(reply, "Hello");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_google_joins_parts() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1beta/models/gemini-2.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "sk-test".into()))
            .match_body(Matcher::PartialJson(serde_json::json!({
                "generationConfig": { "maxOutputTokens": 2000 }
            })))
            .with_status(200)
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"Bit"},{"text":"coin"}]}}]}"#)
            .create_async()
            .await;

        let client = AiClient::new().unwrap().with_base_url(server.url());
        let reply = client.chat("google", &request("gemini-2.5-flash")).await.unwrap();

        assert_eq!(reply, "Bitcoin");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_list_models_remote_and_catalog() {
        let mut server = Server::new_async().await;
        let _models = server
            .mock("GET", "/openai/v1/models")
            .match_header("authorization", "Bearer gsk")
            .with_status(200)
            .with_body(r#"{"data":[{"id":"llama-3.3-70b","context_length":131072},{"id":"gemma2-9b"}]}"#)
            .create_async()
            .await;
        let _failing = server
            .mock("GET", "/v1/models")
            .with_status(403)
            .with_body("forbidden")
            .create_async()
            .await;

        let client = AiClient::new().unwrap().with_base_url(server.url());

        let models = client.list_models("groq", "gsk").await.unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].context_length, Some(131072));
        assert_eq!(models[1].context_length, None);

        let err = client.list_models("mistral", "k").await.unwrap_err();
        assert_eq!(err.to_string(), "provider API error (403): forbidden");

        // 원격 목록이 없는 타입은 카탈로그
        let models = client.list_models("xai", "k").await.unwrap();
        assert_eq!(models[0].id, "grok-4.1-fast");
        let models = client.list_models("google", "k").await.unwrap();
        assert_eq!(models.len(), 7);
    }
}
