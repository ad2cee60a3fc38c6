//! Recommendation query engine.
//!
//! Joins the ratings table to the catalog through the positional index and
//! answers the three query shapes the dashboard needs: Top-N per user,
//! best/worst within a Top-N subset, and global best/worst.

/// Display resolution of joined rows into presentable cards.
pub mod card;

/// Ranking queries over a loaded store.
pub mod engine;

pub use card::{
    BookCard, RatingBand, RecommendedBook, MISSING_FIELD, PLACEHOLDER_COVER, UNKNOWN_AUTHOR,
    UNKNOWN_TITLE,
};
pub use engine::{Extremes, QueryEngine, QueryError, QueryResult};
