use rusqlite::{params, Connection, OptionalExtension};

use crate::content::counters::{self, UserCounter};
use crate::content::rating::{self, Rating, RatingSummary};
use crate::content::{author_snapshot, ensure_owner, Body, StoreError};
use crate::db::{self, models::PostComment};

const WHAT: &str = "Comment";

fn ensure_post_exists(conn: &Connection, post_id: i64) -> Result<(), StoreError> {
    let exists: bool = conn.query_row(
        "SELECT COUNT(*) > 0 FROM posts WHERE id = ?1",
        params![post_id],
        |row| row.get(0),
    )?;
    if exists {
        Ok(())
    } else {
        Err(StoreError::NotFound("Post"))
    }
}

/// Comments under a post, oldest first.
pub fn list_comments(conn: &Connection, post_id: i64) -> Result<Vec<PostComment>, StoreError> {
    ensure_post_exists(conn, post_id)?;
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM post_comments WHERE post_id = ?1 ORDER BY created_at ASC, id ASC",
        PostComment::COLUMNS
    ))?;
    let comments = stmt
        .query_map(params![post_id], PostComment::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn get_comment(conn: &Connection, comment_id: i64) -> Result<PostComment, StoreError> {
    conn.query_row(
        &format!(
            "SELECT {} FROM post_comments WHERE id = ?1",
            PostComment::COLUMNS
        ),
        params![comment_id],
        PostComment::from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(WHAT))
}

pub fn create_comment(
    conn: &Connection,
    post_id: i64,
    author_id: &str,
    body: &Body,
) -> Result<i64, StoreError> {
    db::atomic(conn, |conn| {
        ensure_post_exists(conn, post_id)?;
        let author = author_snapshot(conn, author_id)?;
        conn.execute(
            "INSERT INTO post_comments (post_id, user_id, author_username, author_avatar, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                post_id,
                author_id,
                author.username,
                author.avatar,
                body.as_str(),
                db::now_timestamp()
            ],
        )?;
        let comment_id = conn.last_insert_rowid();
        counters::adjust_post_comments(conn, post_id, 1)?;
        counters::adjust(conn, author_id, UserCounter::Comments, 1)?;
        Ok(comment_id)
    })
}

pub fn edit_comment(
    conn: &Connection,
    comment_id: i64,
    requester_id: &str,
    body: &Body,
) -> Result<(), StoreError> {
    ensure_owner(conn, "post_comments", comment_id, requester_id, WHAT)?;
    conn.execute(
        "UPDATE post_comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
        params![body.as_str(), db::now_timestamp(), comment_id],
    )?;
    Ok(())
}

pub fn delete_comment(
    conn: &Connection,
    comment_id: i64,
    requester_id: &str,
) -> Result<(), StoreError> {
    db::atomic(conn, |conn| {
        let owner = ensure_owner(conn, "post_comments", comment_id, requester_id, WHAT)?;
        let post_id: i64 = conn.query_row(
            "SELECT post_id FROM post_comments WHERE id = ?1",
            params![comment_id],
            |row| row.get(0),
        )?;

        conn.execute(
            "DELETE FROM post_comments WHERE id = ?1",
            params![comment_id],
        )?;
        counters::adjust_post_comments(conn, post_id, -1)?;
        counters::adjust(conn, &owner, UserCounter::Comments, -1)?;
        Ok(())
    })
}

pub fn rate_comment(
    conn: &Connection,
    comment_id: i64,
    rating: Rating,
) -> Result<RatingSummary, StoreError> {
    rating::record(conn, "post_comments", comment_id, rating, WHAT)
}
