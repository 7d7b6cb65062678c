//! Watchlist Repository
//!
//! 사용자별 관심 코인 목록.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

/// 관심종목 아이템.
#[derive(Debug, Clone, Serialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct WatchlistItem {
    pub id: i32,
    pub user_id: Uuid,
    pub coin_id: i32,
    pub symbol: String,
    pub added_at: DateTime<Utc>,
}

/// Watchlist Repository
pub struct WatchlistRepository;

impl WatchlistRepository {
    /// 사용자 관심종목 (최근 추가순).
    pub async fn list_for_user(
        pool: &PgPool,
        user_id: Uuid,
    ) -> Result<Vec<WatchlistItem>, sqlx::Error> {
        sqlx::query_as::<_, WatchlistItem>(
            r#"
            SELECT w.id, w.user_id, w.coin_id, c.symbol, w.added_at
            FROM watchlists w
            JOIN coins c ON w.coin_id = c.id
            WHERE w.user_id = $1
            ORDER BY w.added_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(pool)
        .await
    }

    /// 관심종목 추가. 이미 있으면 아무 것도 하지 않습니다.
    pub async fn add(pool: &PgPool, user_id: Uuid, coin_id: i32) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO watchlists (user_id, coin_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, coin_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(coin_id)
        .execute(pool)
        .await?;

        Ok(())
    }

    pub async fn remove(pool: &PgPool, user_id: Uuid, coin_id: i32) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM watchlists WHERE user_id = $1 AND coin_id = $2")
            .bind(user_id)
            .bind(coin_id)
            .execute(pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
