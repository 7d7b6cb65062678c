//! 가격 알림 API 라우트
//!
//! - `GET /api/alerts` - 알림 목록
//! - `POST /api/alerts` - 알림 생성
//! - `PUT /api/alerts/{id}` - 부분 수정 (활성 여부, 기준값, 알림 채널)
//! - `DELETE /api/alerts/{id}` - 삭제
//! - `GET /api/alerts/{id}/history` - 발동 이력 (최근 100건)

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use rust_decimal::Decimal;
use scalp_core::{AlertCondition, NotificationChannel};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::parse_id;
use crate::auth::JwtAuth;
use crate::error::{ApiError, ApiResult};
use crate::repository::{
    AlertHistoryRecord, AlertRecord, AlertRepository, NewAlert, UpdateAlert,
};
use crate::state::AppState;

// ================================================================================================
// Request Types
// ================================================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAlertRequest {
    pub coin_id: i32,
    pub condition_type: String,
    #[serde(with = "rust_decimal::serde::float")]
    pub condition_value: Decimal,
    #[serde(default)]
    pub notification_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAlertRequest {
    pub is_active: Option<bool>,
    #[serde(default, with = "rust_decimal::serde::float_option")]
    pub condition_value: Option<Decimal>,
    pub notification_type: Option<String>,
}

fn parse_channel(raw: &str) -> ApiResult<NotificationChannel> {
    raw.parse::<NotificationChannel>()
        .map_err(|_| ApiError::bad_request(format!("Invalid notificationType: {}", raw)))
}

impl CreateAlertRequest {
    /// 조건/채널 검증 후 저장 입력으로 변환.
    pub fn into_new_alert(self) -> ApiResult<NewAlert> {
        if self.coin_id <= 0 {
            return Err(ApiError::bad_request("Invalid coin ID"));
        }

        let condition = self
            .condition_type
            .parse::<AlertCondition>()
            .map_err(|_| {
                ApiError::bad_request(format!("Invalid conditionType: {}", self.condition_type))
            })?;

        let channel = match self.notification_type.as_deref() {
            None | Some("") => NotificationChannel::default(),
            Some(raw) => parse_channel(raw)?,
        };

        Ok(NewAlert {
            coin_id: self.coin_id,
            condition_type: condition.as_str().to_string(),
            condition_value: self.condition_value,
            notification_type: channel.as_str().to_string(),
        })
    }
}

impl UpdateAlertRequest {
    pub fn into_update(self) -> ApiResult<UpdateAlert> {
        let notification_type = self
            .notification_type
            .as_deref()
            .map(parse_channel)
            .transpose()?
            .map(|c| c.as_str().to_string());

        Ok(UpdateAlert {
            is_active: self.is_active,
            condition_value: self.condition_value,
            notification_type,
        })
    }
}

/// 참조 무결성 위반(없는 코인)은 400.
fn map_insert_error(err: sqlx::Error) -> ApiError {
    let foreign_key_violation = err
        .as_database_error()
        .and_then(|db| db.code())
        .is_some_and(|code| code == "23503");

    if foreign_key_violation {
        ApiError::bad_request("Coin not found")
    } else {
        err.into()
    }
}

// ================================================================================================
// Handlers
// ================================================================================================

/// GET /api/alerts
async fn list_alerts(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<Vec<AlertRecord>>> {
    let user_id = auth.user_id()?;
    Ok(Json(AlertRepository::list_for_user(state.db()?, user_id).await?))
}

/// POST /api/alerts
async fn create_alert(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    payload: Result<Json<CreateAlertRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<AlertRecord>)> {
    let user_id = auth.user_id()?;
    let Json(request) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    let input = request.into_new_alert()?;

    let alert = AlertRepository::create(state.db()?, user_id, &input)
        .await
        .map_err(map_insert_error)?;

    info!(
        user_id = %user_id,
        alert_id = alert.id,
        condition = %alert.condition_type,
        "Alert created"
    );

    Ok((StatusCode::CREATED, Json(alert)))
}

/// PUT /api/alerts/{id}
async fn update_alert(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
    payload: Result<Json<UpdateAlertRequest>, JsonRejection>,
) -> ApiResult<Json<AlertRecord>> {
    let user_id = auth.user_id()?;
    let alert_id = parse_id(&raw_id, "Invalid alert ID")?;
    let Json(request) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    let update = request.into_update()?;

    let alert = AlertRepository::update(state.db()?, user_id, alert_id, &update)
        .await?
        .ok_or_else(|| ApiError::not_found("Alert not found"))?;

    Ok(Json(alert))
}

/// DELETE /api/alerts/{id}
async fn delete_alert(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = auth.user_id()?;
    let alert_id = parse_id(&raw_id, "Invalid alert ID")?;

    AlertRepository::delete(state.db()?, user_id, alert_id).await?;
    Ok(Json(json!({ "status": "deleted" })))
}

/// GET /api/alerts/{id}/history
async fn alert_history(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Vec<AlertHistoryRecord>>> {
    let user_id = auth.user_id()?;
    let alert_id = parse_id(&raw_id, "Invalid alert ID")?;

    Ok(Json(
        AlertRepository::history(state.db()?, user_id, alert_id).await?,
    ))
}

/// 알림 라우터 생성.
pub fn alerts_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_alerts).post(create_alert))
        .route("/{id}", axum::routing::put(update_alert).delete(delete_alert))
        .route("/{id}/history", get(alert_history))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn create(condition: &str, notification: Option<&str>) -> CreateAlertRequest {
        CreateAlertRequest {
            coin_id: 1,
            condition_type: condition.to_string(),
            condition_value: Decimal::from_str("50000").unwrap(),
            notification_type: notification.map(str::to_string),
        }
    }

    #[test]
    fn test_create_defaults_to_in_app() {
        let alert = create("price_above", None).into_new_alert().unwrap();
        assert_eq!(alert.condition_type, "price_above");
        assert_eq!(alert.notification_type, "in_app");

        let alert = create("volume_below", Some("telegram")).into_new_alert().unwrap();
        assert_eq!(alert.notification_type, "telegram");
    }

    #[test]
    fn test_create_rejects_unknown_values() {
        let err = create("price_sideways", None).into_new_alert().unwrap_err();
        assert_eq!(err.to_string(), "Invalid conditionType: price_sideways");

        let err = create("price_below", Some("sms")).into_new_alert().unwrap_err();
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_request_json() {
        let request: CreateAlertRequest = serde_json::from_str(
            r#"{"coinId":3,"conditionType":"price_below","conditionValue":42150.25}"#,
        )
        .unwrap();
        assert_eq!(request.condition_value, Decimal::from_str("42150.25").unwrap());

        let update: UpdateAlertRequest = serde_json::from_str(r#"{"isActive":false}"#).unwrap();
        let update = update.into_update().unwrap();
        assert_eq!(update.is_active, Some(false));
        assert!(update.condition_value.is_none());
        assert!(update.notification_type.is_none());
    }
}
