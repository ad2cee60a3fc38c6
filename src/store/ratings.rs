//! Predicted-ratings table: the model output joining users to catalog rows.

use std::fmt;
use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::store::{csv_error, find_column, open_error, parse_index};

/// Identifier of a user in the recommendation output.
///
/// These are dense model-side indices, not account ids; they only have
/// meaning relative to the run that produced the ratings table.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct UserId(pub u32);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One predicted rating: a user, a catalog row position, and a score.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PredictedRating {
    /// User the prediction was made for.
    pub user_id: UserId,
    /// Position of the rated book in the catalog table. May point past the
    /// end of the catalog when the two files come from different runs.
    pub book_index: u32,
    /// Predicted score, usually inside 0.0..=5.0. `None` when the source
    /// cell was blank or not a finite number.
    pub predicted_rating: Option<f64>,
}

impl PredictedRating {
    /// Score used for ranking and display. A missing prediction counts
    /// as 0.0, which sorts it to the bottom of any list.
    pub fn resolved_rating(&self) -> f64 {
        self.predicted_rating.unwrap_or(0.0)
    }
}

#[derive(Debug)]
pub(crate) struct RatingsTable {
    pub rows: Vec<PredictedRating>,
    /// Cells that held text but did not parse as a finite number.
    pub invalid_ratings: u64,
}

pub(crate) fn read_ratings(path: &Path) -> Result<RatingsTable> {
    let file = File::open(path).map_err(|err| open_error(path, err))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers().map_err(|err| csv_error(path, err))?.clone();

    let idx_user = find_column(path, &headers, "user_idx")?;
    let idx_book = find_column(path, &headers, "book_idx")?;
    let idx_rating = find_column(path, &headers, "predicted_rating")?;

    let mut rows = Vec::new();
    let mut invalid_ratings = 0u64;
    for result in reader.records() {
        let record = result.map_err(|err| csv_error(path, err))?;
        let user_id = UserId(parse_index(path, &record, idx_user, "user_idx")?);
        let book_index = parse_index(path, &record, idx_book, "book_idx")?;

        let raw = record
            .get(idx_rating)
            .map(str::trim)
            .filter(|text| !text.is_empty());
        let predicted_rating = match raw {
            None => None,
            Some(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => Some(value),
                _ => {
                    invalid_ratings += 1;
                    None
                }
            },
        };

        rows.push(PredictedRating {
            user_id,
            book_index,
            predicted_rating,
        });
    }
    Ok(RatingsTable {
        rows,
        invalid_ratings,
    })
}
