pub mod asset_comments;
pub mod counters;
pub mod post_comments;
pub mod posts;
pub mod rating;

use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("Only the author can change this {0}")]
    Forbidden(&'static str),

    #[error("Content cannot be empty")]
    EmptyContent,

    #[error("Content is longer than {0} characters")]
    ContentTooLong(usize),

    #[error("Rating must be between 1 and 5 (got {0})")]
    InvalidRating(i64),

    #[error("Unknown symbol: {0}")]
    UnknownSymbol(String),

    #[error("SQL error: {0}")]
    Sql(#[from] rusqlite::Error),
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(what) => AppError::NotFound(format!("{} not found", what)),
            StoreError::Forbidden(_) => AppError::Forbidden,
            StoreError::EmptyContent
            | StoreError::ContentTooLong(_)
            | StoreError::InvalidRating(_)
            | StoreError::UnknownSymbol(_) => AppError::BadRequest(err.to_string()),
            StoreError::Sql(e) => AppError::Database(e),
        }
    }
}

/// Trimmed, non-empty, length-checked text of a post or comment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body(String);

impl Body {
    pub fn parse(raw: &str, max_chars: usize) -> Result<Self, StoreError> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return Err(StoreError::EmptyContent);
        }
        if trimmed.chars().count() > max_chars {
            return Err(StoreError::ContentTooLong(max_chars));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Display copy of the author taken when content is created.
pub(crate) struct AuthorSnapshot {
    pub username: String,
    pub avatar: String,
}

pub(crate) fn author_snapshot(conn: &Connection, user_id: &str) -> Result<AuthorSnapshot, StoreError> {
    conn.query_row(
        "SELECT username, avatar FROM users WHERE id = ?1",
        params![user_id],
        |row| {
            Ok(AuthorSnapshot {
                username: row.get(0)?,
                avatar: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(StoreError::NotFound("User"))
}

/// Owner of a row in `table`, or `NotFound(what)`.
pub(crate) fn owner_of(
    conn: &Connection,
    table: &str,
    id: i64,
    what: &'static str,
) -> Result<String, StoreError> {
    conn.query_row(
        &format!("SELECT user_id FROM {table} WHERE id = ?1"),
        params![id],
        |row| row.get(0),
    )
    .optional()?
    .ok_or(StoreError::NotFound(what))
}

/// Load-check-authorize step shared by every edit/delete.
pub(crate) fn ensure_owner(
    conn: &Connection,
    table: &str,
    id: i64,
    requester_id: &str,
    what: &'static str,
) -> Result<String, StoreError> {
    let owner = owner_of(conn, table, id, what)?;
    if owner != requester_id {
        return Err(StoreError::Forbidden(what));
    }
    Ok(owner)
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn body_is_trimmed() {
        assert_eq!(Body::parse("  hello \n", 10).unwrap().as_str(), "hello");
    }

    #[test]
    fn blank_body_is_rejected() {
        assert!(matches!(Body::parse(" \t\n", 10), Err(StoreError::EmptyContent)));
        assert!(matches!(Body::parse("", 10), Err(StoreError::EmptyContent)));
    }

    #[test]
    fn long_body_is_rejected_by_char_count() {
        assert!(Body::parse("çççç", 4).is_ok());
        assert!(matches!(
            Body::parse("ççççç", 4),
            Err(StoreError::ContentTooLong(4))
        ));
    }
}
