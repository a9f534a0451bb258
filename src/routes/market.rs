use axum::extract::{Path, Query, State};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde::Deserialize;

use crate::error::AppResult;
use crate::market::calendar::economic_calendar;
use crate::market::candles::fetch_series;
use crate::market::snapshot::fetch_snapshot;
use crate::market::{MarketError, Period, Symbol};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct CandleQuery {
    pub period: Option<String>,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/market-data", get(market_data))
        .route("/api/candlestick/{symbol}", get(candlestick))
        .route("/api/economic-calendar", get(calendar))
}

/// GET /api/market-data: current board values
async fn market_data(State(state): State<AppState>) -> AppResult<Response> {
    let snapshot = fetch_snapshot(state.market.as_ref()).await?;
    Ok(Json(snapshot).into_response())
}

/// GET /api/candlestick/{symbol}?period=daily|weekly|monthly
async fn candlestick(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
    Query(query): Query<CandleQuery>,
) -> AppResult<Response> {
    let symbol = Symbol::from_key(&symbol).ok_or(MarketError::UnknownSymbol(symbol))?;
    let period = Period::from_query(query.period.as_deref());

    let series = fetch_series(state.market.as_ref(), symbol, period).await?;
    tracing::debug!("{} {} bars for {}", series.data.len(), period.as_str(), symbol);
    Ok(Json(series).into_response())
}

/// GET /api/economic-calendar
async fn calendar() -> Response {
    Json(economic_calendar()).into_response()
}
