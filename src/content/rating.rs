use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;

use crate::content::StoreError;

pub const MIN_RATING: i64 = 1;
pub const MAX_RATING: i64 = 5;

/// A single vote, validated to lie in `1..=5`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rating(i64);

impl Rating {
    pub fn new(value: i64) -> Result<Self, StoreError> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Self(value))
        } else {
            Err(StoreError::InvalidRating(value))
        }
    }

    pub fn value(self) -> i64 {
        self.0
    }
}

/// Running (sum, count) pair. The average is derived on read and never stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RatingTally {
    pub sum: i64,
    pub count: i64,
}

impl RatingTally {
    pub fn new(sum: i64, count: i64) -> Self {
        Self { sum, count }
    }

    /// Mean rating rounded to one decimal; 0.0 before the first vote.
    pub fn average(&self) -> f64 {
        if self.count <= 0 {
            return 0.0;
        }
        let raw = self.sum as f64 / self.count as f64;
        (raw * 10.0).round() / 10.0
    }
}

/// Result of a rating submission, returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct RatingSummary {
    pub rating_avg: f64,
    pub rating_count: i64,
}

impl From<RatingTally> for RatingSummary {
    fn from(tally: RatingTally) -> Self {
        Self {
            rating_avg: tally.average(),
            rating_count: tally.count,
        }
    }
}

/// Add one vote to the accumulator of row `id` in `table` with a single
/// atomic UPDATE and return the new totals.
pub(crate) fn record(
    conn: &Connection,
    table: &str,
    id: i64,
    rating: Rating,
    what: &'static str,
) -> Result<RatingSummary, StoreError> {
    let tally = conn
        .query_row(
            &format!(
                "UPDATE {table} SET rating_sum = rating_sum + ?1, rating_count = rating_count + 1
                 WHERE id = ?2
                 RETURNING rating_sum, rating_count"
            ),
            params![rating.value(), id],
            |row| Ok(RatingTally::new(row.get(0)?, row.get(1)?)),
        )
        .optional()?
        .ok_or(StoreError::NotFound(what))?;

    Ok(tally.into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_one_through_five() {
        for v in 1..=5 {
            assert_eq!(Rating::new(v).unwrap().value(), v);
        }
    }

    #[test]
    fn rejects_out_of_range() {
        for v in [-1, 0, 6, 100] {
            assert!(matches!(Rating::new(v), Err(StoreError::InvalidRating(x)) if x == v));
        }
    }

    #[test]
    fn empty_tally_averages_to_zero() {
        assert_eq!(RatingTally::default().average(), 0.0);
    }

    #[test]
    fn average_rounds_to_one_decimal() {
        // 5 + 4 + 4 = 13 / 3 = 4.333..
        let tally = RatingTally::new(13, 3);
        assert_eq!(tally.average(), 4.3);
        // 5 + 4 + 5 = 14 / 3 = 4.666..
        assert_eq!(RatingTally::new(14, 3).average(), 4.7);
    }
}
