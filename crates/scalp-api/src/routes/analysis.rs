//! 기술적 분석 endpoint.
//!
//! `GET /api/coins/{symbol}/analysis?interval&limit&endTime&exchange`

use axum::{
    extract::{Path, Query, State},
    Json,
};
use scalp_analytics::{compute_technical_analysis, TechnicalAnalysis};
use scalp_core::{sort_candles_ascending, split_series, MarketId, MarketKind};
use serde::Deserialize;
use std::sync::Arc;
use tracing::warn;

use super::clamp_limit;
use super::coins::{exchange_param, parse_interval};
use crate::error::{ApiError, ApiResult};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisParams {
    pub interval: Option<String>,
    pub limit: Option<i64>,
    /// Unix 초. 0이면 최신까지
    pub end_time: Option<i64>,
    pub exchange: Option<String>,
}

/// GET /api/coins/{symbol}/analysis
pub async fn get_analysis(
    State(state): State<Arc<AppState>>,
    Path(symbol): Path<String>,
    Query(params): Query<AnalysisParams>,
) -> ApiResult<Json<TechnicalAnalysis>> {
    let interval = parse_interval(params.interval.as_deref())?;
    let limit = clamp_limit(params.limit, 250, 500);
    let end_time = params.end_time.filter(|t| *t > 0);
    let market = MarketId::new(
        exchange_param(params.exchange.as_deref()),
        MarketKind::Spot,
        &symbol,
    );

    let mut candles = state
        .market
        .fetch_candles(&market, interval, limit as u32, end_time)
        .await
        .map_err(|e| {
            warn!(market_id = %market, "Failed to fetch candles: {}", e);
            ApiError::Upstream(format!("Failed to fetch candles: {}", e))
        })?;

    sort_candles_ascending(&mut candles);
    let (closes, highs, lows) = split_series(&candles);

    let analysis = compute_technical_analysis(
        &symbol,
        interval.as_str(),
        &closes,
        &highs,
        &lows,
        limit as usize,
    )?;

    Ok(Json(analysis))
}
