use rusqlite::{params, Connection, OptionalExtension};

use crate::content::counters::{self, UserCounter};
use crate::content::rating::{self, Rating, RatingSummary};
use crate::content::{author_snapshot, ensure_owner, Body, StoreError};
use crate::db::{self, models::Post};

const WHAT: &str = "Post";

pub fn create_post(conn: &Connection, author_id: &str, body: &Body) -> Result<i64, StoreError> {
    db::atomic(conn, |conn| {
        let author = author_snapshot(conn, author_id)?;
        conn.execute(
            "INSERT INTO posts (user_id, author_username, author_avatar, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                author_id,
                author.username,
                author.avatar,
                body.as_str(),
                db::now_timestamp()
            ],
        )?;
        let post_id = conn.last_insert_rowid();
        counters::adjust(conn, author_id, UserCounter::Posts, 1)?;
        Ok(post_id)
    })
}

pub fn get_post(conn: &Connection, post_id: i64) -> Result<Post, StoreError> {
    conn.query_row(
        &format!("SELECT {} FROM posts WHERE id = ?1", Post::COLUMNS),
        params![post_id],
        Post::from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(WHAT))
}

pub fn edit_post(
    conn: &Connection,
    post_id: i64,
    requester_id: &str,
    body: &Body,
) -> Result<(), StoreError> {
    ensure_owner(conn, "posts", post_id, requester_id, WHAT)?;
    conn.execute(
        "UPDATE posts SET content = ?1, updated_at = ?2 WHERE id = ?3",
        params![body.as_str(), db::now_timestamp(), post_id],
    )?;
    Ok(())
}

/// Removes the post and its comments, and settles every affected counter.
pub fn delete_post(conn: &Connection, post_id: i64, requester_id: &str) -> Result<(), StoreError> {
    db::atomic(conn, |conn| {
        let owner = ensure_owner(conn, "posts", post_id, requester_id, WHAT)?;

        let per_author: Vec<(String, i64)> = {
            let mut stmt = conn.prepare(
                "SELECT user_id, COUNT(*) FROM post_comments WHERE post_id = ?1 GROUP BY user_id",
            )?;
            let rows = stmt
                .query_map(params![post_id], |row| Ok((row.get(0)?, row.get(1)?)))?
                .collect::<Result<Vec<_>, _>>()?;
            rows
        };
        for (commenter, count) in &per_author {
            counters::adjust(conn, commenter, UserCounter::Comments, -count)?;
        }

        conn.execute(
            "DELETE FROM post_comments WHERE post_id = ?1",
            params![post_id],
        )?;
        conn.execute("DELETE FROM posts WHERE id = ?1", params![post_id])?;
        counters::adjust(conn, &owner, UserCounter::Posts, -1)?;

        tracing::debug!(
            "Deleted post {} with {} comment author(s)",
            post_id,
            per_author.len()
        );
        Ok(())
    })
}

/// Latest `limit` posts, newest first.
pub fn list_feed(conn: &Connection, limit: usize) -> Result<Vec<Post>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts ORDER BY created_at DESC, id DESC LIMIT ?1",
        Post::COLUMNS
    ))?;
    let posts = stmt
        .query_map(params![limit as i64], Post::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Every post by one user, newest first.
pub fn posts_by_user(conn: &Connection, user_id: &str) -> Result<Vec<Post>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM posts WHERE user_id = ?1 ORDER BY created_at DESC, id DESC",
        Post::COLUMNS
    ))?;
    let posts = stmt
        .query_map(params![user_id], Post::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

/// Any authenticated user may rate, any number of times.
pub fn rate_post(conn: &Connection, post_id: i64, rating: Rating) -> Result<RatingSummary, StoreError> {
    rating::record(conn, "posts", post_id, rating, WHAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::post_comments;
    use crate::content::test_support::{insert_user, test_conn, user_counters};

    fn body(s: &str) -> Body {
        Body::parse(s, 1000).unwrap()
    }

    #[test]
    fn create_post_snapshots_author_and_counts() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");

        let id = create_post(&conn, &alice, &body("hello")).unwrap();
        let post = get_post(&conn, id).unwrap();

        assert_eq!(post.user, "alice");
        assert_eq!(post.avatar, "👤");
        assert_eq!(post.content, "hello");
        assert_eq!(post.comment_count, 0);
        assert_eq!(post.rating_count, 0);
        assert_eq!(user_counters(&conn, &alice), (1, 0));
    }

    #[test]
    fn snapshot_does_not_follow_profile_edits() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let id = create_post(&conn, &alice, &body("hello")).unwrap();

        conn.execute(
            "UPDATE users SET avatar = '🦊' WHERE id = ?1",
            params![alice],
        )
        .unwrap();

        assert_eq!(get_post(&conn, id).unwrap().avatar, "👤");
    }

    #[test]
    fn create_post_for_unknown_user_leaves_nothing_behind() {
        let (_tmp, conn) = test_conn();
        let err = create_post(&conn, "ghost", &body("hello")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound("User")));

        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn only_owner_can_edit() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bob");
        let id = create_post(&conn, &alice, &body("hello")).unwrap();

        let err = edit_post(&conn, id, &bob, &body("hijacked")).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        assert_eq!(get_post(&conn, id).unwrap().content, "hello");

        edit_post(&conn, id, &alice, &body("hello again")).unwrap();
        let post = get_post(&conn, id).unwrap();
        assert_eq!(post.content, "hello again");
        assert!(post.updated_at.is_some());
    }

    #[test]
    fn edit_missing_post_is_not_found() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let err = edit_post(&conn, 42, &alice, &body("x")).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn non_owner_delete_is_forbidden_and_changes_nothing() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bob");
        let id = create_post(&conn, &alice, &body("hello")).unwrap();

        let err = delete_post(&conn, id, &bob).unwrap_err();
        assert!(matches!(err, StoreError::Forbidden(_)));
        assert!(get_post(&conn, id).is_ok());
        assert_eq!(user_counters(&conn, &alice), (1, 0));
    }

    #[test]
    fn delete_cascades_comments_and_settles_counters() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bob");
        let id = create_post(&conn, &alice, &body("hello")).unwrap();
        post_comments::create_comment(&conn, id, &bob, &body("nice")).unwrap();
        post_comments::create_comment(&conn, id, &bob, &body("very nice")).unwrap();
        post_comments::create_comment(&conn, id, &alice, &body("thanks")).unwrap();

        assert_eq!(user_counters(&conn, &bob), (0, 2));
        assert_eq!(get_post(&conn, id).unwrap().comment_count, 3);

        delete_post(&conn, id, &alice).unwrap();

        assert!(matches!(get_post(&conn, id), Err(StoreError::NotFound(_))));
        let remaining: i64 = conn
            .query_row("SELECT COUNT(*) FROM post_comments", [], |row| row.get(0))
            .unwrap();
        assert_eq!(remaining, 0);
        assert_eq!(user_counters(&conn, &alice), (0, 0));
        assert_eq!(user_counters(&conn, &bob), (0, 0));
    }

    #[test]
    fn delete_floors_out_of_sync_counter() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let id = create_post(&conn, &alice, &body("hello")).unwrap();
        conn.execute("UPDATE users SET total_posts = 0", []).unwrap();

        delete_post(&conn, id, &alice).unwrap();
        assert_eq!(user_counters(&conn, &alice), (0, 0));
    }

    #[test]
    fn feed_is_newest_first_and_limited() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        for i in 0..5 {
            create_post(&conn, &alice, &body(&format!("post {}", i))).unwrap();
        }

        let feed = list_feed(&conn, 3).unwrap();
        assert_eq!(feed.len(), 3);
        assert_eq!(feed[0].content, "post 4");
        assert_eq!(feed[1].content, "post 3");
        assert_eq!(feed[2].content, "post 2");
    }

    #[test]
    fn posts_by_user_only_returns_theirs() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bob");
        create_post(&conn, &alice, &body("a1")).unwrap();
        create_post(&conn, &bob, &body("b1")).unwrap();
        create_post(&conn, &alice, &body("a2")).unwrap();

        let posts = posts_by_user(&conn, &alice).unwrap();
        let contents: Vec<_> = posts.iter().map(|p| p.content.as_str()).collect();
        assert_eq!(contents, vec!["a2", "a1"]);
    }

    #[test]
    fn rating_scenario() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let id = create_post(&conn, &alice, &body("hello")).unwrap();

        let summary = rate_post(&conn, id, Rating::new(5).unwrap()).unwrap();
        assert_eq!(summary.rating_avg, 5.0);
        assert_eq!(summary.rating_count, 1);

        // Same rater again: repeat votes are counted
        let summary = rate_post(&conn, id, Rating::new(1).unwrap()).unwrap();
        assert_eq!(summary.rating_avg, 3.0);
        assert_eq!(summary.rating_count, 2);

        let post = get_post(&conn, id).unwrap();
        assert_eq!(post.rating_avg, 3.0);
        assert_eq!(post.rating_count, 2);
    }

    #[test]
    fn rating_missing_post_is_not_found() {
        let (_tmp, conn) = test_conn();
        let err = rate_post(&conn, 7, Rating::new(3).unwrap()).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}
