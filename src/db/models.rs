use chrono::DateTime;
use rusqlite::Row;
use serde::Serialize;

use crate::content::rating::RatingTally;

#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub full_name: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub bio: String,
    pub avatar: String,
    pub profile_image: Option<String>,
    pub total_posts: i64,
    pub total_comments: i64,
    pub created_at: String,
}

impl User {
    pub const COLUMNS: &'static str = "id, username, full_name, password_hash, bio, avatar, \
         profile_image, total_posts, total_comments, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            username: row.get(1)?,
            full_name: row.get(2)?,
            password_hash: row.get(3)?,
            bio: row.get(4)?,
            avatar: row.get(5)?,
            profile_image: row.get(6)?,
            total_posts: row.get(7)?,
            total_comments: row.get(8)?,
            created_at: row.get(9)?,
        })
    }
}

/// Feed/profile view of a post. `user` and `avatar` are copied at creation
/// time and intentionally do not follow later profile edits.
#[derive(Debug, Clone, Serialize)]
pub struct Post {
    pub id: i64,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub user: String,
    pub avatar: String,
    pub content: String,
    pub timestamp: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub like_count: i64,
    pub comment_count: i64,
    pub rating_avg: f64,
    pub rating_count: i64,
}

impl Post {
    pub const COLUMNS: &'static str = "id, user_id, author_username, author_avatar, content, \
         created_at, updated_at, like_count, comment_count, rating_sum, rating_count";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: String = row.get(5)?;
        let tally = RatingTally::new(row.get(9)?, row.get(10)?);
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            user: row.get(2)?,
            avatar: row.get(3)?,
            content: row.get(4)?,
            timestamp: display_timestamp(&created_at),
            created_at,
            updated_at: row.get(6)?,
            like_count: row.get(7)?,
            comment_count: row.get(8)?,
            rating_avg: tally.average(),
            rating_count: tally.count,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PostComment {
    pub id: i64,
    pub post_id: i64,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub username: String,
    pub avatar: String,
    pub content: String,
    pub timestamp: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub rating_avg: f64,
    pub rating_count: i64,
}

impl PostComment {
    pub const COLUMNS: &'static str = "id, post_id, user_id, author_username, author_avatar, \
         content, created_at, updated_at, rating_sum, rating_count";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: String = row.get(6)?;
        let tally = RatingTally::new(row.get(8)?, row.get(9)?);
        Ok(Self {
            id: row.get(0)?,
            post_id: row.get(1)?,
            user_id: row.get(2)?,
            username: row.get(3)?,
            avatar: row.get(4)?,
            content: row.get(5)?,
            timestamp: display_timestamp(&created_at),
            created_at,
            updated_at: row.get(7)?,
            rating_avg: tally.average(),
            rating_count: tally.count,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AssetComment {
    pub id: i64,
    pub symbol: String,
    #[serde(skip_serializing)]
    pub user_id: String,
    pub username: String,
    pub avatar: String,
    pub content: String,
    pub timestamp: String,
    pub created_at: String,
    pub updated_at: Option<String>,
    pub rating_avg: f64,
    pub rating_count: i64,
}

impl AssetComment {
    pub const COLUMNS: &'static str = "id, symbol, user_id, author_username, author_avatar, \
         content, created_at, updated_at, rating_sum, rating_count";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        let created_at: String = row.get(6)?;
        let tally = RatingTally::new(row.get(8)?, row.get(9)?);
        Ok(Self {
            id: row.get(0)?,
            symbol: row.get(1)?,
            user_id: row.get(2)?,
            username: row.get(3)?,
            avatar: row.get(4)?,
            content: row.get(5)?,
            timestamp: display_timestamp(&created_at),
            created_at,
            updated_at: row.get(7)?,
            rating_avg: tally.average(),
            rating_count: tally.count,
        })
    }
}

/// "2025-02-07T14:03:11.120Z" -> "2025-02-07 14:03". Unparseable input is returned as-is.
pub fn display_timestamp(rfc3339: &str) -> String {
    DateTime::parse_from_rfc3339(rfc3339)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|_| rfc3339.to_string())
}
