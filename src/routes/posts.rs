use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::content::posts;
use crate::content::rating::Rating;
use crate::content::Body;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, JsonBody};
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PostRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct RatePostRequest {
    pub post_id: i64,
    pub rating: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/feed", get(feed))
        .route("/api/post", post(create))
        .route("/api/post/{id}", put(edit).delete(remove))
        .route("/api/rate-post", post(rate))
}

/// GET /api/feed: latest posts, newest first
async fn feed(State(state): State<AppState>) -> AppResult<Response> {
    let conn = state.db.get()?;
    let feed = posts::list_feed(&conn, state.config.content.feed_limit as usize)?;
    Ok(Json(feed).into_response())
}

/// POST /api/post
async fn create(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<PostRequest>,
) -> AppResult<Response> {
    let body = Body::parse(&req.content, state.config.content.max_post_chars)?;
    let conn = state.db.get()?;
    let post_id = posts::create_post(&conn, &user.id, &body)?;

    tracing::info!("{} created post {}", user.username, post_id);
    Ok(Json(json!({ "success": true, "post_id": post_id })).into_response())
}

/// PUT /api/post/{id}: author only
async fn edit(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<PostRequest>,
) -> AppResult<Response> {
    let body = Body::parse(&req.content, state.config.content.max_post_chars)?;
    let conn = state.db.get()?;
    posts::edit_post(&conn, id, &user.id, &body)?;

    tracing::debug!("{} edited post {}", user.username, id);
    Ok(Json(json!({ "success": true })).into_response())
}

/// DELETE /api/post/{id}: author only, takes the post's comments with it
async fn remove(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    posts::delete_post(&conn, id, &user.id)?;

    tracing::info!("{} deleted post {}", user.username, id);
    Ok(Json(json!({ "success": true })).into_response())
}

/// POST /api/rate-post
async fn rate(
    State(state): State<AppState>,
    _user: CurrentUser,
    JsonBody(req): JsonBody<RatePostRequest>,
) -> AppResult<Response> {
    let rating = Rating::new(req.rating)?;
    let conn = state.db.get()?;
    let summary = posts::rate_post(&conn, req.post_id, rating)?;

    Ok(Json(json!({
        "success": true,
        "rating_avg": summary.rating_avg,
        "rating_count": summary.rating_count,
    }))
    .into_response())
}
