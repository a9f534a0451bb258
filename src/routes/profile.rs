use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use crate::error::AppResult;
use crate::extractors::{CurrentUser, JsonBody};
use crate::profile::{self, ProfileUpdate};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/profile/update", post(update))
        .route("/api/profile/{username}", get(show))
}

/// GET /api/profile/{username}
async fn show(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let profile = profile::get_profile(&conn, &username)?;
    Ok(Json(profile).into_response())
}

/// POST /api/profile/update: partial edit of the caller's own profile
async fn update(
    State(state): State<AppState>,
    user: CurrentUser,
    JsonBody(req): JsonBody<ProfileUpdate>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    profile::update_profile(&conn, &user.id, req, &state.config.content)?;

    tracing::info!("{} updated their profile", user.username);
    Ok(Json(json!({ "success": true })).into_response())
}
