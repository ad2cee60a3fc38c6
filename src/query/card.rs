//! Display resolution: joined rows to presentable cards.
//!
//! Missing metadata never fails a query. It travels as `None` through
//! [`RecommendedBook`] and is substituted with a fixed fallback only at the
//! card boundary, so every consumer renders the same text for a gap.

use serde::Serialize;

use crate::store::{Book, UserId};

/// Title shown when the catalog row has none.
pub const UNKNOWN_TITLE: &str = "Unknown Title";

/// Author shown when the catalog row has none.
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";

/// Placeholder for a missing year or publisher.
pub const MISSING_FIELD: &str = "—";

/// Cover image used when the catalog row has no usable URL.
pub const PLACEHOLDER_COVER: &str = "https://via.placeholder.com/120x180.png?text=No+Cover";

/// Color band a card falls into, derived from its resolved rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RatingBand {
    /// Resolved rating of 4.0 or higher.
    High,
    /// Resolved rating of at least 3.0 but below 4.0.
    Mid,
    /// Everything below 3.0, including rows with no rating at all.
    Low,
}

impl RatingBand {
    /// Band for a resolved rating.
    pub fn of(rating: f64) -> Self {
        if rating >= 4.0 {
            RatingBand::High
        } else if rating >= 3.0 {
            RatingBand::Mid
        } else {
            RatingBand::Low
        }
    }
}

/// One ratings row joined with its catalog metadata.
///
/// The metadata fields are all optional: they are `None` both when the
/// catalog cell was blank and when [`book_index`](Self::book_index) pointed
/// past the end of the catalog. The two cases are indistinguishable on
/// purpose; either way the card shows the fallback text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecommendedBook {
    /// User the row was predicted for.
    pub user_id: UserId,
    /// Position of the book in the catalog table.
    pub book_index: u32,
    /// Predicted score as loaded, `None` when the cell was unusable.
    pub predicted_rating: Option<f64>,
    /// ISBN from the joined catalog row.
    pub isbn: Option<String>,
    /// Title from the joined catalog row.
    pub title: Option<String>,
    /// Author from the joined catalog row.
    pub author: Option<String>,
    /// Publication year from the joined catalog row.
    pub year_of_publication: Option<String>,
    /// Publisher from the joined catalog row.
    pub publisher: Option<String>,
    /// Cover image URL from the joined catalog row.
    pub cover_image_url: Option<String>,
}

impl RecommendedBook {
    /// Join a ratings row with an optional catalog row.
    pub fn joined(
        user_id: UserId,
        book_index: u32,
        predicted_rating: Option<f64>,
        book: Option<&Book>,
    ) -> Self {
        Self {
            user_id,
            book_index,
            predicted_rating,
            isbn: book.and_then(|b| b.isbn.clone()),
            title: book.and_then(|b| b.title.clone()),
            author: book.and_then(|b| b.author.clone()),
            year_of_publication: book.and_then(|b| b.year_of_publication.clone()),
            publisher: book.and_then(|b| b.publisher.clone()),
            cover_image_url: book.and_then(|b| b.cover_image_url.clone()),
        }
    }

    /// Score used for ranking and display; a missing prediction counts as 0.0.
    pub fn rating(&self) -> f64 {
        self.predicted_rating.unwrap_or(0.0)
    }

    /// Resolve the row into presentable text.
    pub fn to_card(&self) -> BookCard {
        let rating = self.rating();
        BookCard {
            user_id: self.user_id,
            book_index: self.book_index,
            isbn: self.isbn.clone(),
            title: self
                .title
                .clone()
                .unwrap_or_else(|| UNKNOWN_TITLE.to_string()),
            author: self
                .author
                .clone()
                .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string()),
            year: self
                .year_of_publication
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            publisher: self
                .publisher
                .clone()
                .unwrap_or_else(|| MISSING_FIELD.to_string()),
            cover_url: self
                .cover_image_url
                .clone()
                .unwrap_or_else(|| PLACEHOLDER_COVER.to_string()),
            rating,
            band: RatingBand::of(rating),
        }
    }
}

/// Fully resolved card: every display field holds text, gaps replaced by the
/// documented fallbacks.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookCard {
    /// User the card was computed for.
    pub user_id: UserId,
    /// Position of the book in the catalog table.
    pub book_index: u32,
    /// ISBN, kept optional since it has no display fallback.
    pub isbn: Option<String>,
    /// Title, or [`UNKNOWN_TITLE`].
    pub title: String,
    /// Author, or [`UNKNOWN_AUTHOR`].
    pub author: String,
    /// Publication year, or [`MISSING_FIELD`].
    pub year: String,
    /// Publisher, or [`MISSING_FIELD`].
    pub publisher: String,
    /// Cover image URL, or [`PLACEHOLDER_COVER`].
    pub cover_url: String,
    /// Resolved rating; 0.0 stands in for a missing prediction.
    pub rating: f64,
    /// Color band derived from the resolved rating.
    pub band: RatingBand,
}
