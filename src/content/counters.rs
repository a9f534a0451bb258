//! The only place that writes `users.total_posts` / `users.total_comments`
//! and `posts.comment_count`. Callers invoke these inside the transaction that
//! changes the content rows, so counters and rows commit or roll back together.

use rusqlite::{params, Connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserCounter {
    Posts,
    Comments,
}

impl UserCounter {
    fn column(self) -> &'static str {
        match self {
            UserCounter::Posts => "total_posts",
            UserCounter::Comments => "total_comments",
        }
    }
}

/// Add `delta` to a user counter. Never goes below zero.
pub fn adjust(
    conn: &Connection,
    user_id: &str,
    counter: UserCounter,
    delta: i64,
) -> rusqlite::Result<()> {
    let column = counter.column();
    conn.execute(
        &format!("UPDATE users SET {column} = MAX({column} + ?1, 0) WHERE id = ?2"),
        params![delta, user_id],
    )?;
    Ok(())
}

/// Add `delta` to a post's comment counter. Never goes below zero.
pub fn adjust_post_comments(conn: &Connection, post_id: i64, delta: i64) -> rusqlite::Result<()> {
    conn.execute(
        "UPDATE posts SET comment_count = MAX(comment_count + ?1, 0) WHERE id = ?2",
        params![delta, post_id],
    )?;
    Ok(())
}
