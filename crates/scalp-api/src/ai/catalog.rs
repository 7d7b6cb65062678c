//! 지원 AI 제공자 카탈로그.

use serde::Serialize;

/// 카탈로그 항목.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct CatalogEntry {
    #[serde(rename = "type")]
    pub provider_type: &'static str,
    pub name: &'static str,
    pub models: &'static [&'static str],
}

/// 설정 가능한 제공자 목록.
pub const AVAILABLE_PROVIDERS: &[CatalogEntry] = &[
    CatalogEntry {
        provider_type: "openai",
        name: "OpenAI",
        models: &[
            "gpt-5.2",
            "gpt-4o-mini",
            "gpt-4o",
            "gpt-4-turbo",
            "gpt-4",
            "gpt-3.5-turbo",
            "gpt-oss-120b",
        ],
    },
    CatalogEntry {
        provider_type: "anthropic",
        name: "Anthropic",
        models: &[
            "claude-opus-4.5",
            "claude-sonnet-4.5",
            "claude-haiku-4.5",
            "claude-3-opus",
            "claude-3-sonnet",
            "claude-3-haiku",
        ],
    },
    CatalogEntry {
        provider_type: "google",
        name: "Google",
        models: &[
            "gemini-3-pro-preview",
            "gemini-3-flash-preview",
            "gemini-2.5-pro",
            "gemini-2.5-flash",
            "gemini-2.5-flash-lite",
            "gemini-2.0-flash",
            "gemini-pro",
        ],
    },
    CatalogEntry {
        provider_type: "xai",
        name: "xAI (Grok)",
        models: &[
            "grok-4.1-fast",
            "grok-4-fast",
            "grok-code-fast-1",
            "grok-2",
            "grok-beta",
        ],
    },
    CatalogEntry {
        provider_type: "deepseek",
        name: "DeepSeek",
        models: &[
            "deepseek-v3.2",
            "deepseek-v3-0324",
            "deepseek-coder",
            "deepseek-chat",
        ],
    },
    CatalogEntry {
        provider_type: "mistral",
        name: "Mistral AI",
        models: &[
            "devstral-2-2512",
            "mistral-large-latest",
            "mistral-medium-latest",
            "mistral-small-latest",
            "codestral-latest",
        ],
    },
    CatalogEntry {
        provider_type: "groq",
        name: "Groq (Fast)",
        models: &[
            "llama-3.3-70b",
            "llama-3.1-70b",
            "mixtral-8x7b-32768",
            "gemma2-9b",
        ],
    },
    CatalogEntry {
        provider_type: "together",
        name: "Together AI",
        models: &[
            "meta-llama/Llama-3.3-70B",
            "mistralai/Mixtral-8x22B",
            "Qwen/Qwen2.5-72B",
        ],
    },
    CatalogEntry {
        provider_type: "openrouter",
        name: "OpenRouter",
        models: &[
            "anthropic/claude-3-opus",
            "openai/gpt-4-turbo",
            "google/gemini-pro",
            "meta-llama/llama-3-70b",
        ],
    },
    CatalogEntry {
        provider_type: "xiaomi",
        name: "Xiaomi",
        models: &["mimo-v2-flash"],
    },
    CatalogEntry {
        provider_type: "kwaipilot",
        name: "Kwaipilot",
        models: &["kat-coder-pro-v1"],
    },
];

/// 제공자 타입의 카탈로그 모델 목록. 모르는 타입이면 빈 목록.
pub fn catalog_models(provider_type: &str) -> &'static [&'static str] {
    AVAILABLE_PROVIDERS
        .iter()
        .find(|entry| entry.provider_type == provider_type)
        .map(|entry| entry.models)
        .unwrap_or(&[])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_lookup() {
        assert_eq!(AVAILABLE_PROVIDERS.len(), 11);
        assert_eq!(catalog_models("xiaomi"), &["mimo-v2-flash"]);
        assert!(catalog_models("unknown").is_empty());
    }

    #[test]
    fn test_catalog_serializes_type_field() {
        let json = serde_json::to_value(AVAILABLE_PROVIDERS[3]).unwrap();
        assert_eq!(json["type"], "xai");
        assert_eq!(json["name"], "xAI (Grok)");
        assert_eq!(json["models"][0], "grok-4.1-fast");
    }
}
