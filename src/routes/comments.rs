use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post, put};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;

use crate::content::rating::{Rating, RatingSummary};
use crate::content::{asset_comments, post_comments, Body, StoreError};
use crate::db::models::AssetComment;
use crate::error::AppResult;
use crate::extractors::{CurrentUser, JsonBody};
use crate::market::Symbol;
use crate::state::AppState;

#[derive(Deserialize)]
pub struct PostCommentRequest {
    pub post_id: i64,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct AssetCommentRequest {
    #[serde(default)]
    pub symbol: String,
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct EditCommentRequest {
    #[serde(default)]
    pub content: String,
}

#[derive(Deserialize)]
pub struct RateCommentRequest {
    pub comment_id: i64,
    pub rating: i64,
}

pub fn router() -> Router<AppState> {
    Router::new()
        // -- Post comments --
        .route("/api/post-comments/{post_id}", get(list_post_comments))
        .route("/api/post-comment", post(create_post_comment))
        .route(
            "/api/post-comment/{id}",
            put(edit_post_comment).delete(delete_post_comment),
        )
        .route("/api/rate-post-comment", post(rate_post_comment))
        // -- Asset comments --
        .route("/api/asset-comments/{symbol}", get(list_asset_comments))
        .route("/api/asset-comment", post(create_asset_comment))
        .route(
            "/api/asset-comment/{id}",
            put(edit_asset_comment).delete(delete_asset_comment),
        )
        .route("/api/rate-asset-comment", post(rate_asset_comment))
}

fn success() -> Response {
    Json(json!({ "success": true })).into_response()
}

fn rated(summary: RatingSummary) -> Response {
    Json(json!({
        "success": true,
        "rating_avg": summary.rating_avg,
        "rating_count": summary.rating_count,
    }))
    .into_response()
}

// -- Post comments --

/// GET /api/post-comments/{post_id}: oldest first
async fn list_post_comments(
    State(state): State<AppState>,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let comments = post_comments::list_comments(&conn, post_id)?;
    Ok(Json(comments).into_response())
}

/// POST /api/post-comment
async fn create_post_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<PostCommentRequest>,
) -> AppResult<Response> {
    let body = Body::parse(&req.content, state.config.content.max_comment_chars)?;
    let conn = state.db.get()?;
    let comment_id = post_comments::create_comment(&conn, req.post_id, &user.id, &body)?;

    tracing::info!(
        "{} commented {} on post {}",
        user.username,
        comment_id,
        req.post_id
    );
    Ok(Json(json!({ "success": true, "comment_id": comment_id })).into_response())
}

/// PUT /api/post-comment/{id}: author only
async fn edit_post_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<EditCommentRequest>,
) -> AppResult<Response> {
    let body = Body::parse(&req.content, state.config.content.max_comment_chars)?;
    let conn = state.db.get()?;
    post_comments::edit_comment(&conn, id, &user.id, &body)?;
    Ok(success())
}

/// DELETE /api/post-comment/{id}: author only
async fn delete_post_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    post_comments::delete_comment(&conn, id, &user.id)?;

    tracing::info!("{} deleted post comment {}", user.username, id);
    Ok(success())
}

/// POST /api/rate-post-comment
async fn rate_post_comment(
    State(state): State<AppState>,
    _user: CurrentUser,
    JsonBody(req): JsonBody<RateCommentRequest>,
) -> AppResult<Response> {
    let rating = Rating::new(req.rating)?;
    let conn = state.db.get()?;
    Ok(rated(post_comments::rate_comment(&conn, req.comment_id, rating)?))
}

// -- Asset comments --

/// GET /api/asset-comments/{symbol}: newest first; unknown symbols have none
async fn list_asset_comments(
    State(state): State<AppState>,
    Path(symbol): Path<String>,
) -> AppResult<Response> {
    let Some(symbol) = Symbol::from_key(&symbol) else {
        return Ok(Json(Vec::<AssetComment>::new()).into_response());
    };
    let conn = state.db.get()?;
    let comments = asset_comments::list_comments(&conn, symbol)?;
    Ok(Json(comments).into_response())
}

/// POST /api/asset-comment
async fn create_asset_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<AssetCommentRequest>,
) -> AppResult<Response> {
    let symbol = Symbol::from_key(req.symbol.trim())
        .ok_or_else(|| StoreError::UnknownSymbol(req.symbol.clone()))?;
    let body = Body::parse(&req.content, state.config.content.max_comment_chars)?;
    let conn = state.db.get()?;
    let comment_id = asset_comments::create_comment(&conn, symbol, &user.id, &body)?;

    tracing::info!("{} commented {} on {}", user.username, comment_id, symbol);
    Ok(Json(json!({ "success": true, "comment_id": comment_id })).into_response())
}

/// PUT /api/asset-comment/{id}: author only
async fn edit_asset_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
    JsonBody(req): JsonBody<EditCommentRequest>,
) -> AppResult<Response> {
    let body = Body::parse(&req.content, state.config.content.max_comment_chars)?;
    let conn = state.db.get()?;
    asset_comments::edit_comment(&conn, id, &user.id, &body)?;
    Ok(success())
}

/// DELETE /api/asset-comment/{id}: author only
async fn delete_asset_comment(
    State(state): State<AppState>,
    user: CurrentUser,
    Path(id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    asset_comments::delete_comment(&conn, id, &user.id)?;

    tracing::info!("{} deleted asset comment {}", user.username, id);
    Ok(success())
}

/// POST /api/rate-asset-comment
async fn rate_asset_comment(
    State(state): State<AppState>,
    _user: CurrentUser,
    JsonBody(req): JsonBody<RateCommentRequest>,
) -> AppResult<Response> {
    let rating = Rating::new(req.rating)?;
    let conn = state.db.get()?;
    Ok(rated(asset_comments::rate_comment(&conn, req.comment_id, rating)?))
}
