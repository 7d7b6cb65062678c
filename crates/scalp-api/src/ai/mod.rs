//! AI 어시스턴트 제공자.
//!
//! 제공자 타입 문자열을 세 계열로 나눠 처리합니다.
//!
//! - OpenAI 호환: openai, xai, deepseek, mistral, groq, together, openrouter 및 기타
//! - Anthropic: Messages API
//! - Google: Gemini generateContent

mod catalog;
mod client;
mod providers;
mod types;

pub use catalog::{catalog_models, CatalogEntry, AVAILABLE_PROVIDERS};
pub use client::AiClient;
pub use providers::{
    AnthropicProvider, GoogleProvider, OpenAiCompatibleProvider, OpenAiEndpoint, ASSISTANT_PROMPT,
};
pub use types::{AiError, AiResult, ChatProvider, ChatRequest, ModelDetail, ProviderFamily};
