//! Ranking queries over a loaded store.

use serde::Serialize;
use thiserror::Error;

use crate::query::card::RecommendedBook;
use crate::store::{PredictedRating, Store, UserId};

/// Convenience alias for fallible query operations.
pub type QueryResult<T> = std::result::Result<T, QueryError>;

/// Errors raised by ranking queries.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    /// An extremes query ran against zero rows. Callers are expected to
    /// check for data first; this keeps the empty case typed instead of
    /// panicking inside a reduction.
    #[error("no recommendation rows available")]
    EmptyDataset,
}

/// Best and worst rated rows of some row set.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Extremes {
    /// Row with the highest resolved rating; earliest row wins ties.
    pub best: RecommendedBook,
    /// Row with the lowest resolved rating; earliest row wins ties.
    pub worst: RecommendedBook,
}

impl Extremes {
    /// Extremes of an already-computed row set, typically a Top-N result.
    ///
    /// Comparisons are strict, so among equally rated rows the earliest one
    /// in the slice wins both titles. Fails with
    /// [`QueryError::EmptyDataset`] on an empty slice.
    pub fn of(rows: &[RecommendedBook]) -> QueryResult<Self> {
        let first = rows.first().ok_or(QueryError::EmptyDataset)?;
        let mut best = first;
        let mut worst = first;
        for row in &rows[1..] {
            if row.rating() > best.rating() {
                best = row;
            }
            if row.rating() < worst.rating() {
                worst = row;
            }
        }
        Ok(Self {
            best: best.clone(),
            worst: worst.clone(),
        })
    }
}

/// Stateless query layer over a [`Store`].
///
/// Every call recomputes from the raw tables. With tables in the tens of
/// thousands of rows a full pass is cheaper than maintaining a cache, and
/// it keeps results trivially consistent with the loaded data.
#[derive(Debug, Clone, Copy)]
pub struct QueryEngine<'a> {
    store: &'a Store,
}

impl<'a> QueryEngine<'a> {
    /// Engine reading from the given store.
    pub fn new(store: &'a Store) -> Self {
        Self { store }
    }

    /// The `n` highest-rated rows for one user, joined with catalog
    /// metadata, ordered by resolved rating descending.
    ///
    /// The sort is stable, so equally rated rows keep their ratings-file
    /// order. Unknown users get an empty result; `n` larger than the user's
    /// row count returns every row. `n` is taken as given here, presentation
    /// layers clamp it to their own widget ranges.
    pub fn top_n(&self, user: UserId, n: usize) -> Vec<RecommendedBook> {
        let mut rows: Vec<RecommendedBook> =
            self.store.ratings_for(user).map(|r| self.join(r)).collect();
        rows.sort_by(|a, b| b.rating().total_cmp(&a.rating()));
        rows.truncate(n);
        rows
    }

    /// Best and worst rated rows across the whole ratings table.
    ///
    /// Scans ratings only and joins just the two winners, so missing
    /// catalog metadata cannot influence the ranking. Earliest row wins
    /// ties on both ends. Fails with [`QueryError::EmptyDataset`] when the
    /// ratings table is empty.
    pub fn extremes_global(&self) -> QueryResult<Extremes> {
        let ratings = self.store.ratings();
        let first = ratings.first().ok_or(QueryError::EmptyDataset)?;
        let mut best = first;
        let mut worst = first;
        for row in &ratings[1..] {
            if row.resolved_rating() > best.resolved_rating() {
                best = row;
            }
            if row.resolved_rating() < worst.resolved_rating() {
                worst = row;
            }
        }
        Ok(Extremes {
            best: self.join(best),
            worst: self.join(worst),
        })
    }

    fn join(&self, rating: &PredictedRating) -> RecommendedBook {
        RecommendedBook::joined(
            rating.user_id,
            rating.book_index,
            rating.predicted_rating,
            self.store.book_at(rating.book_index),
        )
    }
}
