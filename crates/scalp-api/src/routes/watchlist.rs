//! Watchlist API 라우트
//!
//! - `GET /api/watchlist` - 관심종목 목록
//! - `POST /api/watchlist` - 추가 (`coinId` 또는 `symbol`)
//! - `DELETE /api/watchlist/{coinId}` - 삭제

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::info;

use super::parse_id;
use crate::auth::JwtAuth;
use crate::error::{ApiError, ApiResult};
use crate::repository::{CoinRepository, WatchlistItem, WatchlistRepository};
use crate::state::AppState;

/// 관심종목 추가 요청.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddWatchlistRequest {
    pub coin_id: Option<i32>,
    pub symbol: Option<String>,
}

/// GET /api/watchlist
async fn list_watchlist(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
) -> ApiResult<Json<Vec<WatchlistItem>>> {
    let user_id = auth.user_id()?;
    let items = WatchlistRepository::list_for_user(state.db()?, user_id).await?;
    Ok(Json(items))
}

/// POST /api/watchlist
///
/// `coinId`가 없거나 0이면 `symbol`로 코인을 찾습니다.
async fn add_to_watchlist(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    payload: Result<Json<AddWatchlistRequest>, JsonRejection>,
) -> ApiResult<(StatusCode, Json<Value>)> {
    let user_id = auth.user_id()?;
    let Json(request) = payload.map_err(|_| ApiError::bad_request("Invalid request body"))?;
    let pool = state.db()?;

    let coin_id = match request.coin_id.filter(|id| *id > 0) {
        Some(id) => id,
        None => {
            let symbol = request
                .symbol
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| ApiError::bad_request("coinId or symbol is required"))?;
            CoinRepository::find_id_by_symbol(pool, &symbol.to_ascii_uppercase())
                .await?
                .ok_or_else(|| ApiError::not_found("Coin not found"))?
        }
    };

    WatchlistRepository::add(pool, user_id, coin_id).await?;
    info!(user_id = %user_id, coin_id, "Watchlist item added");

    Ok((StatusCode::CREATED, Json(json!({ "status": "added" }))))
}

/// DELETE /api/watchlist/{coinId}
async fn remove_from_watchlist(
    State(state): State<Arc<AppState>>,
    auth: JwtAuth,
    Path(raw_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let user_id = auth.user_id()?;
    let coin_id = parse_id(&raw_id, "Invalid coin ID")?;

    WatchlistRepository::remove(state.db()?, user_id, coin_id).await?;
    Ok(Json(json!({ "status": "removed" })))
}

/// 관심종목 라우터 생성.
pub fn watchlist_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_watchlist).post(add_to_watchlist))
        .route("/{coin_id}", delete(remove_from_watchlist))
}
