//! AI Provider Repository
//!
//! 사용자별 AI 제공자 설정. API 키는 응답에 포함하지 않습니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// ================================================================================================
// Types
// ================================================================================================

/// 제공자 설정 레코드 (API 키 제외).
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AiProviderRecord {
    pub id: i32,
    pub provider_type: String,
    pub provider_name: String,
    pub model_name: String,
    pub is_active: bool,
    pub is_default: bool,
    pub max_tokens: i32,
    #[serde(with = "rust_decimal::serde::float")]
    pub temperature: Decimal,
    #[serde(
        with = "rust_decimal::serde::float_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub monthly_budget: Option<Decimal>,
    #[serde(with = "rust_decimal::serde::float")]
    pub monthly_spent: Decimal,
    pub created_at: DateTime<Utc>,
}

/// 호출에 필요한 제공자 정보.
#[derive(Clone, FromRow)]
pub struct AiProviderCredentials {
    pub provider_type: String,
    pub api_key: String,
    pub model_name: String,
    pub max_tokens: i32,
    pub temperature: Decimal,
}

impl std::fmt::Debug for AiProviderCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AiProviderCredentials")
            .field("provider_type", &self.provider_type)
            .field("api_key", &"[MASKED]")
            .field("model_name", &self.model_name)
            .field("max_tokens", &self.max_tokens)
            .field("temperature", &self.temperature)
            .finish()
    }
}

/// 새 제공자 입력.
#[derive(Debug, Clone)]
pub struct NewAiProvider {
    pub provider_type: String,
    pub provider_name: String,
    pub api_key: String,
    pub model_name: String,
    pub max_tokens: i32,
    pub temperature: Decimal,
    pub is_default: bool,
    pub monthly_budget: Option<Decimal>,
}

/// 제공자 부분 수정 입력.
#[derive(Debug, Clone, Default)]
pub struct UpdateAiProvider {
    pub provider_name: Option<String>,
    pub api_key: Option<String>,
    pub model_name: Option<String>,
    pub max_tokens: Option<i32>,
    pub temperature: Option<Decimal>,
    pub is_active: Option<bool>,
    pub is_default: Option<bool>,
    pub monthly_budget: Option<Decimal>,
}

// ================================================================================================
// Repository
// ================================================================================================

/// AI Provider Repository
pub struct AiProviderRepository;

impl AiProviderRepository {
    /// 사용자 제공자 목록 (기본 제공자 우선).
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<AiProviderRecord>, sqlx::Error> {
        sqlx::query_as::<_, AiProviderRecord>(
            r#"
            SELECT id, provider_type, provider_name, model_name, is_active, is_default,
                   max_tokens, temperature, monthly_budget,
                   COALESCE(monthly_spent, 0) AS monthly_spent, created_at
            FROM ai_providers
            WHERE user_id = $1
            ORDER BY is_default DESC, created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 제공자 추가. 기본으로 지정하면 기존 기본 설정을 해제합니다.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        input: &NewAiProvider,
    ) -> Result<i32, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if input.is_default {
            Self::clear_default(&mut *tx, user_id).await?;
        }

        let id: i32 = sqlx::query_scalar(
            r#"
            INSERT INTO ai_providers (user_id, provider_type, provider_name, api_key_encrypted,
                                      model_name, max_tokens, temperature, is_default,
                                      monthly_budget, is_active)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, true)
            RETURNING id
            "#,
        )
        .bind(user_id)
        .bind(&input.provider_type)
        .bind(&input.provider_name)
        .bind(&input.api_key)
        .bind(&input.model_name)
        .bind(input.max_tokens)
        .bind(input.temperature)
        .bind(input.is_default)
        .bind(input.monthly_budget)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(id)
    }

    /// 지정한 필드만 수정. 없으면 `false`.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        provider_id: i32,
        input: &UpdateAiProvider,
    ) -> Result<bool, sqlx::Error> {
        let mut tx = pool.begin().await?;

        if input.is_default == Some(true) {
            Self::clear_default(&mut *tx, user_id).await?;
        }

        let result = sqlx::query(
            r#"
            UPDATE ai_providers SET
                provider_name = COALESCE($3, provider_name),
                api_key_encrypted = COALESCE($4, api_key_encrypted),
                model_name = COALESCE($5, model_name),
                max_tokens = COALESCE($6, max_tokens),
                temperature = COALESCE($7, temperature),
                is_active = COALESCE($8, is_active),
                is_default = COALESCE($9, is_default),
                monthly_budget = COALESCE($10, monthly_budget)
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(provider_id)
        .bind(user_id)
        .bind(&input.provider_name)
        .bind(&input.api_key)
        .bind(&input.model_name)
        .bind(input.max_tokens)
        .bind(input.temperature)
        .bind(input.is_active)
        .bind(input.is_default)
        .bind(input.monthly_budget)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(result.rows_affected() > 0)
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, provider_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ai_providers WHERE id = $1 AND user_id = $2")
            .bind(provider_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 특정 제공자의 호출 정보.
    pub async fn credentials(
        pool: &PgPool,
        user_id: Uuid,
        provider_id: i32,
    ) -> Result<Option<AiProviderCredentials>, sqlx::Error> {
        sqlx::query_as::<_, AiProviderCredentials>(
            r#"
            SELECT provider_type, api_key_encrypted AS api_key, model_name, max_tokens, temperature
            FROM ai_providers
            WHERE id = $1 AND user_id = $2
            "#,
        )
        .bind(provider_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await
    }

    /// 채팅에 쓸 활성 제공자. `provider_id`가 없으면 기본 제공자.
    pub async fn chat_credentials(
        pool: &PgPool,
        user_id: Uuid,
        provider_id: Option<i32>,
    ) -> Result<Option<AiProviderCredentials>, sqlx::Error> {
        match provider_id {
            Some(id) => {
                sqlx::query_as::<_, AiProviderCredentials>(
                    r#"
                    SELECT provider_type, api_key_encrypted AS api_key, model_name, max_tokens, temperature
                    FROM ai_providers
                    WHERE id = $1 AND user_id = $2 AND is_active = true
                    "#,
                )
                .bind(id)
                .bind(user_id)
                .fetch_optional(pool)
                .await
            }
            None => {
                sqlx::query_as::<_, AiProviderCredentials>(
                    r#"
                    SELECT provider_type, api_key_encrypted AS api_key, model_name, max_tokens, temperature
                    FROM ai_providers
                    WHERE user_id = $1 AND is_default = true AND is_active = true
                    LIMIT 1
                    "#,
                )
                .bind(user_id)
                .fetch_optional(pool)
                .await
            }
        }
    }

    async fn clear_default(
        conn: &mut sqlx::PgConnection,
        user_id: Uuid,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE ai_providers SET is_default = false WHERE user_id = $1")
            .bind(user_id)
            .execute(conn)
            .await?;
        Ok(())
    }
}
