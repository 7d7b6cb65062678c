//! Alert Repository
//!
//! 가격 알림 CRUD, 발동 이력, 평가기가 쓰는 발동 기록을 담당합니다.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

// ================================================================================================
// Types
// ================================================================================================

/// 가격 알림 레코드.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AlertRecord {
    pub id: i32,
    pub user_id: Uuid,
    pub coin_id: i32,
    #[sqlx(default)]
    #[serde(skip_serializing_if = "Option::is_none")]
    pub coin_symbol: Option<String>,
    pub condition_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub condition_value: Decimal,
    pub notification_type: String,
    pub is_active: bool,
    pub triggered_count: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 알림 발동 이력.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct AlertHistoryRecord {
    pub id: i32,
    pub alert_id: i32,
    pub triggered_at: DateTime<Utc>,
    pub notification_status: String,
    pub notification_channel: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// 평가 대상 활성 알림 (코인 심볼, 소유자 알림 주소 포함).
#[derive(Debug, Clone, FromRow)]
pub struct ActiveAlert {
    pub id: i32,
    pub user_id: Uuid,
    pub coin_id: i32,
    pub symbol: String,
    pub condition_type: String,
    pub condition_value: Decimal,
    pub notification_type: String,
    pub last_triggered_at: Option<DateTime<Utc>>,
    pub telegram_chat_id: Option<i64>,
    pub email: Option<String>,
}

/// 새 알림 입력.
#[derive(Debug, Clone)]
pub struct NewAlert {
    pub coin_id: i32,
    pub condition_type: String,
    pub condition_value: Decimal,
    pub notification_type: String,
}

/// 알림 부분 수정 입력.
#[derive(Debug, Clone, Default)]
pub struct UpdateAlert {
    pub is_active: Option<bool>,
    pub condition_value: Option<Decimal>,
    pub notification_type: Option<String>,
}

/// 발동 이력 상태.
pub const HISTORY_PENDING: &str = "pending";
pub const HISTORY_SENT: &str = "sent";
pub const HISTORY_FAILED: &str = "failed";

const ALERT_COLUMNS: &str = r#"
    a.id, a.user_id, a.coin_id, c.symbol AS coin_symbol, a.condition_type, a.condition_value,
    a.notification_type, a.is_active, a.triggered_count, a.last_triggered_at,
    a.created_at, a.updated_at
"#;

// ================================================================================================
// Repository
// ================================================================================================

/// Alert Repository
pub struct AlertRepository;

impl AlertRepository {
    // ============================================================================================
    // CRUD
    // ============================================================================================

    /// 사용자 알림 목록 (최근 생성순).
    pub async fn list_for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<AlertRecord>, sqlx::Error> {
        let sql = format!(
            r#"
            SELECT {}
            FROM alerts a
            JOIN coins c ON a.coin_id = c.id
            WHERE a.user_id = $1
            ORDER BY a.created_at DESC
            "#,
            ALERT_COLUMNS
        );

        sqlx::query_as::<_, AlertRecord>(&sql)
            .bind(user_id)
            .fetch_all(pool)
            .await
    }

    /// 알림 생성.
    pub async fn create(
        pool: &PgPool,
        user_id: Uuid,
        input: &NewAlert,
    ) -> Result<AlertRecord, sqlx::Error> {
        sqlx::query_as::<_, AlertRecord>(
            r#"
            INSERT INTO alerts (user_id, coin_id, condition_type, condition_value, notification_type)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, coin_id,
                      (SELECT symbol FROM coins WHERE id = alerts.coin_id) AS coin_symbol,
                      condition_type, condition_value, notification_type, is_active,
                      triggered_count, last_triggered_at, created_at, updated_at
            "#,
        )
        .bind(user_id)
        .bind(input.coin_id)
        .bind(&input.condition_type)
        .bind(input.condition_value)
        .bind(&input.notification_type)
        .fetch_one(pool)
        .await
    }

    /// 지정한 필드만 수정. 소유자가 아니거나 없으면 `None`.
    pub async fn update(
        pool: &PgPool,
        user_id: Uuid,
        alert_id: i32,
        input: &UpdateAlert,
    ) -> Result<Option<AlertRecord>, sqlx::Error> {
        sqlx::query_as::<_, AlertRecord>(
            r#"
            UPDATE alerts SET
                is_active = COALESCE($3, is_active),
                condition_value = COALESCE($4, condition_value),
                notification_type = COALESCE($5, notification_type),
                updated_at = NOW()
            WHERE id = $1 AND user_id = $2
            RETURNING id, user_id, coin_id,
                      (SELECT symbol FROM coins WHERE id = alerts.coin_id) AS coin_symbol,
                      condition_type, condition_value, notification_type, is_active,
                      triggered_count, last_triggered_at, created_at, updated_at
            "#,
        )
        .bind(alert_id)
        .bind(user_id)
        .bind(input.is_active)
        .bind(input.condition_value)
        .bind(&input.notification_type)
        .fetch_optional(pool)
        .await
    }

    pub async fn delete(pool: &PgPool, user_id: Uuid, alert_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM alerts WHERE id = $1 AND user_id = $2")
            .bind(alert_id)
            .bind(user_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// 발동 이력 (최근 100건). 소유자 확인을 위해 alerts와 조인합니다.
    pub async fn history(
        pool: &PgPool,
        user_id: Uuid,
        alert_id: i32,
    ) -> Result<Vec<AlertHistoryRecord>, sqlx::Error> {
        sqlx::query_as::<_, AlertHistoryRecord>(
            r#"
            SELECT ah.id, ah.alert_id, ah.triggered_at, ah.notification_status,
                   ah.notification_channel, NULLIF(ah.error_message, '') AS error_message
            FROM alert_history ah
            JOIN alerts a ON ah.alert_id = a.id
            WHERE ah.alert_id = $1 AND a.user_id = $2
            ORDER BY ah.triggered_at DESC
            LIMIT 100
            "#,
        )
        .bind(alert_id)
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    // ============================================================================================
    // Evaluation
    // ============================================================================================

    /// 평가 대상 활성 알림 전체.
    pub async fn list_active(pool: &PgPool) -> Result<Vec<ActiveAlert>, sqlx::Error> {
        sqlx::query_as::<_, ActiveAlert>(
            r#"
            SELECT a.id, a.user_id, a.coin_id, c.symbol, a.condition_type, a.condition_value,
                   a.notification_type, a.last_triggered_at, u.telegram_chat_id, u.email
            FROM alerts a
            JOIN coins c ON a.coin_id = c.id
            LEFT JOIN users u ON a.user_id = u.id
            WHERE a.is_active = true
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// 발동 횟수/시각 갱신.
    pub async fn mark_triggered(pool: &PgPool, alert_id: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE alerts
            SET triggered_count = triggered_count + 1,
                last_triggered_at = NOW(),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(alert_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    /// `pending` 상태로 이력 추가 후 ID 반환.
    pub async fn insert_history(
        pool: &PgPool,
        alert_id: i32,
        channel: &str,
    ) -> Result<i32, sqlx::Error> {
        sqlx::query_scalar(
            r#"
            INSERT INTO alert_history (alert_id, triggered_at, notification_status, notification_channel)
            VALUES ($1, NOW(), $2, $3)
            RETURNING id
            "#,
        )
        .bind(alert_id)
        .bind(HISTORY_PENDING)
        .bind(channel)
        .fetch_one(pool)
        .await
    }

    /// 전송 결과 기록.
    pub async fn finish_history(
        pool: &PgPool,
        history_id: i32,
        status: &str,
        error_message: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            UPDATE alert_history
            SET notification_status = $2, error_message = $3
            WHERE id = $1
            "#,
        )
        .bind(history_id)
        .bind(status)
        .bind(error_message)
        .execute(pool)
        .await?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use std::str::FromStr;

    #[test]
    fn test_alert_json_shape() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let record = AlertRecord {
            id: 7,
            user_id: Uuid::nil(),
            coin_id: 3,
            coin_symbol: Some("BTCUSDT".into()),
            condition_type: "price_above".into(),
            condition_value: Decimal::from_str("50000.5").unwrap(),
            notification_type: "telegram".into(),
            is_active: true,
            triggered_count: 2,
            last_triggered_at: None,
            created_at: at,
            updated_at: at,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["coinSymbol"], "BTCUSDT");
        assert_eq!(json["conditionValue"], 50000.5);
        assert_eq!(json["triggeredCount"], 2);
        assert!(json.get("lastTriggeredAt").is_none());
    }

    #[test]
    fn test_history_omits_empty_error() {
        let record = AlertHistoryRecord {
            id: 1,
            alert_id: 7,
            triggered_at: Utc::now(),
            notification_status: HISTORY_SENT.into(),
            notification_channel: "in_app".into(),
            error_message: None,
        };

        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["notificationStatus"], "sent");
        assert!(json.get("errorMessage").is_none());
    }
}
