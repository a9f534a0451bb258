use rusqlite::{params, Connection, OptionalExtension};

use crate::content::counters::{self, UserCounter};
use crate::content::rating::{self, Rating, RatingSummary};
use crate::content::{author_snapshot, ensure_owner, Body, StoreError};
use crate::db::{self, models::AssetComment};
use crate::market::Symbol;

const WHAT: &str = "Comment";

/// Comments on one symbol, newest first.
pub fn list_comments(conn: &Connection, symbol: Symbol) -> Result<Vec<AssetComment>, StoreError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM asset_comments WHERE symbol = ?1 ORDER BY created_at DESC, id DESC",
        AssetComment::COLUMNS
    ))?;
    let comments = stmt
        .query_map(params![symbol.key()], AssetComment::from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(comments)
}

pub fn get_comment(conn: &Connection, comment_id: i64) -> Result<AssetComment, StoreError> {
    conn.query_row(
        &format!(
            "SELECT {} FROM asset_comments WHERE id = ?1",
            AssetComment::COLUMNS
        ),
        params![comment_id],
        AssetComment::from_row,
    )
    .optional()?
    .ok_or(StoreError::NotFound(WHAT))
}

pub fn create_comment(
    conn: &Connection,
    symbol: Symbol,
    author_id: &str,
    body: &Body,
) -> Result<i64, StoreError> {
    db::atomic(conn, |conn| {
        let author = author_snapshot(conn, author_id)?;
        conn.execute(
            "INSERT INTO asset_comments (symbol, user_id, author_username, author_avatar, content, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                symbol.key(),
                author_id,
                author.username,
                author.avatar,
                body.as_str(),
                db::now_timestamp()
            ],
        )?;
        let comment_id = conn.last_insert_rowid();
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
    ensure_owner(conn, "asset_comments", comment_id, requester_id, WHAT)?;
    conn.execute(
        "UPDATE asset_comments SET content = ?1, updated_at = ?2 WHERE id = ?3",
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
        let owner = ensure_owner(conn, "asset_comments", comment_id, requester_id, WHAT)?;
        conn.execute(
            "DELETE FROM asset_comments WHERE id = ?1",
            params![comment_id],
        )?;
        counters::adjust(conn, &owner, UserCounter::Comments, -1)?;
        Ok(())
    })
}

pub fn rate_comment(
    conn: &Connection,
    comment_id: i64,
    rating: Rating,
) -> Result<RatingSummary, StoreError> {
    rating::record(conn, "asset_comments", comment_id, rating, WHAT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::test_support::{insert_user, test_conn, user_counters};

    fn body(s: &str) -> Body {
        Body::parse(s, 500).unwrap()
    }

    #[test]
    fn comments_are_scoped_by_symbol() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");

        create_comment(&conn, Symbol::Bitcoin, &alice, &body("to the moon")).unwrap();
        create_comment(&conn, Symbol::GoldGram, &alice, &body("safe haven")).unwrap();
        create_comment(&conn, Symbol::Bitcoin, &alice, &body("or not")).unwrap();

        let btc = list_comments(&conn, Symbol::Bitcoin).unwrap();
        let contents: Vec<_> = btc.iter().map(|c| c.content.as_str()).collect();
        assert_eq!(contents, vec!["or not", "to the moon"]);
        assert!(btc.iter().all(|c| c.symbol == "bitcoin"));

        assert_eq!(list_comments(&conn, Symbol::GoldGram).unwrap().len(), 1);
        assert!(list_comments(&conn, Symbol::Ethereum).unwrap().is_empty());
        assert_eq!(user_counters(&conn, &alice), (0, 3));
    }

    #[test]
    fn delete_is_owner_only_and_decrements() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let bob = insert_user(&conn, "bob");
        let id = create_comment(&conn, Symbol::UsdTry, &alice, &body("hmm")).unwrap();

        assert!(matches!(
            delete_comment(&conn, id, &bob),
            Err(StoreError::Forbidden(_))
        ));
        assert!(get_comment(&conn, id).is_ok());

        delete_comment(&conn, id, &alice).unwrap();
        assert!(matches!(get_comment(&conn, id), Err(StoreError::NotFound(_))));
        assert_eq!(user_counters(&conn, &alice), (0, 0));
    }

    #[test]
    fn edit_and_rate() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        let id = create_comment(&conn, Symbol::Ethereum, &alice, &body("eth")).unwrap();

        edit_comment(&conn, id, &alice, &body("ether")).unwrap();
        let summary = rate_comment(&conn, id, Rating::new(2).unwrap()).unwrap();

        let comment = get_comment(&conn, id).unwrap();
        assert_eq!(comment.content, "ether");
        assert_eq!(comment.rating_avg, 2.0);
        assert_eq!(summary.rating_count, 1);
    }

    #[test]
    fn missing_comment_is_not_found() {
        let (_tmp, conn) = test_conn();
        let alice = insert_user(&conn, "alice");
        assert!(matches!(
            delete_comment(&conn, 5, &alice),
            Err(StoreError::NotFound(_))
        ));
        assert!(matches!(
            rate_comment(&conn, 5, Rating::new(3).unwrap()),
            Err(StoreError::NotFound(_))
        ));
    }
}
