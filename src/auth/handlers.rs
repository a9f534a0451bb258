use axum::extract::State;
use axum::http::header;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::Json;
use rusqlite::{params, OptionalExtension};
use serde::Deserialize;
use serde_json::json;

use crate::auth::{password, session};
use crate::config::AuthConfig;
use crate::error::{AppError, AppResult};
use crate::extractors::{CurrentUser, JsonBody, MaybeUser};
use crate::state::AppState;

const MAX_USERNAME_CHARS: usize = 32;
const MAX_FULL_NAME_CHARS: usize = 64;
const MAX_PASSWORD_CHARS: usize = 128;

// -- Request types --

#[derive(Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

// -- Cookie helpers --

fn session_cookie(auth: &AuthConfig, token: &str) -> String {
    let max_age_secs = auth.session_hours * 3600;
    let mut cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        auth.cookie_name, token, max_age_secs
    );
    if auth.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

fn clear_session_cookie(auth: &AuthConfig) -> String {
    let mut cookie = format!(
        "{}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0",
        auth.cookie_name
    );
    if auth.secure_cookie {
        cookie.push_str("; Secure");
    }
    cookie
}

// -- Validation --

fn required<'a>(value: &'a str, field: &str, max_chars: usize) -> AppResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::BadRequest(format!("{} is required", field)));
    }
    if trimmed.chars().count() > max_chars {
        return Err(AppError::BadRequest(format!(
            "{} must be at most {} characters",
            field, max_chars
        )));
    }
    Ok(trimmed)
}

fn check_password(password: &str) -> AppResult<()> {
    if password.is_empty() {
        return Err(AppError::BadRequest("Password is required".into()));
    }
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(AppError::BadRequest(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}

fn is_unique_violation(err: &rusqlite::Error) -> bool {
    matches!(
        err,
        rusqlite::Error::SqliteFailure(e, _)
            if e.extended_code == rusqlite::ffi::SQLITE_CONSTRAINT_UNIQUE
    )
}

// -- Handlers --

/// POST /api/register — create an account (does not log in)
pub async fn register(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<RegisterRequest>,
) -> AppResult<Response> {
    let full_name = required(&req.full_name, "Full name", MAX_FULL_NAME_CHARS)?.to_string();
    let username = required(&req.username, "Username", MAX_USERNAME_CHARS)?.to_string();
    check_password(&req.password)?;

    {
        let conn = state.db.get()?;
        let taken: bool = conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM users WHERE username = ?1)",
            params![username],
            |row| row.get(0),
        )?;
        if taken {
            return Err(AppError::BadRequest("Username is already taken".into()));
        }
    }

    let cost = state.config.auth.bcrypt_cost;
    let plain = req.password;
    let password_hash =
        tokio::task::spawn_blocking(move || password::hash_password(&plain, cost))
            .await
            .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
            .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))?;

    let user_id = uuid::Uuid::now_v7().to_string();
    let conn = state.db.get()?;
    match conn.execute(
        "INSERT INTO users (id, username, full_name, password_hash, created_at) \
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            user_id,
            username,
            full_name,
            password_hash,
            crate::db::now_timestamp()
        ],
    ) {
        Ok(_) => {}
        // Lost a race with a concurrent registration of the same handle.
        Err(e) if is_unique_violation(&e) => {
            return Err(AppError::BadRequest("Username is already taken".into()));
        }
        Err(e) => return Err(e.into()),
    }

    tracing::info!("Registered user {} ({})", username, user_id);
    Ok(Json(json!({ "success": true })).into_response())
}

/// POST /api/login — verify credentials and start a session
pub async fn login(
    State(state): State<AppState>,
    JsonBody(req): JsonBody<LoginRequest>,
) -> AppResult<Response> {
    let username = req.username.trim().to_string();
    if username.is_empty() || req.password.is_empty() {
        return Err(AppError::BadRequest(
            "Username and password are required".into(),
        ));
    }

    let found: Option<(String, String, String)> = {
        let conn = state.db.get()?;
        conn.query_row(
            "SELECT id, password_hash, avatar FROM users WHERE username = ?1",
            params![username],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
        )
        .optional()?
    };

    let Some((user_id, password_hash, avatar)) = found else {
        tracing::debug!("Login for unknown user {}", username);
        return Err(AppError::InvalidCredentials);
    };

    let plain = req.password;
    let verified =
        tokio::task::spawn_blocking(move || password::verify_password(&plain, &password_hash))
            .await
            .map_err(|e| AppError::Internal(format!("Verify task failed: {}", e)))?;
    if !verified {
        tracing::debug!("Wrong password for {}", username);
        return Err(AppError::InvalidCredentials);
    }

    let conn = state.db.get()?;
    let purged = session::purge_expired(&conn)?;
    if purged > 0 {
        tracing::debug!("Purged {} expired sessions", purged);
    }
    let token = session::create_session(&conn, &user_id, state.config.auth.session_hours)?;

    tracing::info!("User {} logged in", username);
    Ok((
        AppendHeaders([(header::SET_COOKIE, session_cookie(&state.config.auth, &token))]),
        Json(json!({
            "success": true,
            "username": username,
            "avatar": avatar,
        })),
    )
        .into_response())
}

/// GET /api/check-session — who is logged in, if anyone
pub async fn check_session(MaybeUser(user): MaybeUser) -> AppResult<Response> {
    let body = match user {
        Some(user) => json!({
            "logged_in": true,
            "username": user.username,
            "avatar": user.avatar,
            "profile_image": user.profile_image,
        }),
        None => json!({ "logged_in": false }),
    };
    Ok(Json(body).into_response())
}

/// POST /api/logout — delete session
pub async fn logout(State(state): State<AppState>, user: CurrentUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    session::delete_session(&conn, &user.token)?;

    tracing::info!("User {} logged out", user.username);
    Ok((
        AppendHeaders([(header::SET_COOKIE, clear_session_cookie(&state.config.auth))]),
        Json(json!({ "success": true })),
    )
        .into_response())
}
