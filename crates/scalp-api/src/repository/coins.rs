//! Coin Repository

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};

// ================================================================================================
// Types
// ================================================================================================

/// 코인 레코드.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
#[serde(rename_all = "camelCase")]
pub struct CoinRecord {
    pub id: i32,
    pub symbol: String,
    pub exchange: String,
    pub name: String,
    pub logo_url: String,
    pub decimals: i32,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// 목록 조회 조건.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoinListQuery {
    pub limit: i64,
    pub offset: i64,
    /// 화이트리스트 검증을 거친 정렬 컬럼
    pub sort_by: &'static str,
    /// `ASC` 또는 `DESC`
    pub sort_order: &'static str,
}

impl CoinListQuery {
    /// 요청 값을 검증하여 조회 조건을 만듭니다.
    ///
    /// 허용되지 않은 정렬 컬럼은 `symbol`, 정렬 방향은 `ASC`로 대체합니다.
    pub fn new(limit: i64, offset: i64, sort_by: &str, sort_order: &str) -> Self {
        let sort_by = match sort_by {
            "name" => "name",
            "created_at" => "created_at",
            _ => "symbol",
        };
        let sort_order = if sort_order.eq_ignore_ascii_case("desc") {
            "DESC"
        } else {
            "ASC"
        };

        Self {
            limit,
            offset,
            sort_by,
            sort_order,
        }
    }
}

const COIN_COLUMNS: &str = r#"
    id, symbol, exchange, COALESCE(name, '') AS name, COALESCE(logo_url, '') AS logo_url,
    decimals, is_active, created_at, updated_at
"#;

// ================================================================================================
// Repository
// ================================================================================================

/// Coin Repository
pub struct CoinRepository;

impl CoinRepository {
    /// 활성 코인 수.
    pub async fn count_active(pool: &PgPool) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar("SELECT COUNT(*) FROM coins WHERE is_active = true")
            .fetch_one(pool)
            .await
    }

    /// 활성 코인 페이지 조회.
    pub async fn list_active(
        pool: &PgPool,
        query: &CoinListQuery,
    ) -> Result<Vec<CoinRecord>, sqlx::Error> {
        // 정렬 컬럼/방향은 CoinListQuery::new에서 고정 문자열로만 채워짐
        let sql = format!(
            "SELECT {} FROM coins WHERE is_active = true ORDER BY {} {} LIMIT $1 OFFSET $2",
            COIN_COLUMNS, query.sort_by, query.sort_order
        );

        sqlx::query_as::<_, CoinRecord>(&sql)
            .bind(query.limit)
            .bind(query.offset)
            .fetch_all(pool)
            .await
    }

    /// 심볼로 활성 코인 조회.
    pub async fn find_by_symbol(
        pool: &PgPool,
        symbol: &str,
    ) -> Result<Option<CoinRecord>, sqlx::Error> {
        let sql = format!(
            "SELECT {} FROM coins WHERE symbol = $1 AND is_active = true",
            COIN_COLUMNS
        );

        sqlx::query_as::<_, CoinRecord>(&sql)
            .bind(symbol)
            .fetch_optional(pool)
            .await
    }

    /// 심볼로 코인 ID 조회 (비활성 포함).
    pub async fn find_id_by_symbol(pool: &PgPool, symbol: &str) -> Result<Option<i32>, sqlx::Error> {
        sqlx::query_scalar("SELECT id FROM coins WHERE symbol = $1 LIMIT 1")
            .bind(symbol)
            .fetch_optional(pool)
            .await
    }
}
