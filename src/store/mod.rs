//! Immutable in-memory store over the two source tables.
//!
//! The store is loaded once at startup and never mutated afterwards, so it
//! can be shared behind an [`Arc`](std::sync::Arc) without locking. Queries
//! recompute from the raw rows on every call; there is no result cache to
//! invalidate.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use csv::StringRecord;
use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::error::{Result, StoreError};

mod books;
mod ratings;

pub use books::Book;
pub use ratings::{PredictedRating, UserId};

/// Locations of the two source tables.
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// CSV file holding the book catalog.
    pub books_path: PathBuf,
    /// CSV file holding the predicted ratings.
    pub ratings_path: PathBuf,
}

impl StoreOptions {
    /// Options pointing at the given catalog and ratings files.
    pub fn new(books_path: impl Into<PathBuf>, ratings_path: impl Into<PathBuf>) -> Self {
        Self {
            books_path: books_path.into(),
            ratings_path: ratings_path.into(),
        }
    }
}

/// Load outcome of a single source table.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TableStatus {
    /// The file was read in full.
    Loaded {
        /// Number of data rows.
        rows: usize,
    },
    /// The file was absent; the table is empty.
    Missing {
        /// Path that was probed.
        path: PathBuf,
    },
}

impl TableStatus {
    /// Whether the table had to be substituted with an empty one.
    pub fn is_missing(&self) -> bool {
        matches!(self, TableStatus::Missing { .. })
    }
}

/// What happened while loading the store, kept for status surfaces.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoadReport {
    /// Outcome for the catalog table.
    pub books: TableStatus,
    /// Outcome for the ratings table.
    pub ratings: TableStatus,
    /// Rating cells that held text but not a finite number.
    pub invalid_ratings: u64,
}

/// Headline counters shown on every status surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Summary {
    /// Rows in the catalog table.
    pub total_books: usize,
    /// Distinct users in the ratings table.
    pub total_users: usize,
    /// Rows in the ratings table.
    pub total_recommendations: usize,
}

/// The loaded tables plus a per-user row index.
#[derive(Debug)]
pub struct Store {
    books: Vec<Book>,
    ratings: Vec<PredictedRating>,
    by_user: BTreeMap<UserId, Vec<usize>>,
    report: LoadReport,
}

impl Store {
    /// Load both tables from disk.
    ///
    /// A table whose file does not exist degrades to an empty table and is
    /// recorded as [`TableStatus::Missing`]; a file that exists but cannot
    /// be parsed fails the whole load.
    pub fn open(options: &StoreOptions) -> Result<Self> {
        let (books, books_status) = if options.books_path.exists() {
            let rows = books::read_books(&options.books_path)?;
            debug!(
                path = %options.books_path.display(),
                rows = rows.len(),
                "catalog table loaded"
            );
            let status = TableStatus::Loaded { rows: rows.len() };
            (rows, status)
        } else {
            error!(
                path = %options.books_path.display(),
                "catalog file not found; serving an empty catalog"
            );
            let status = TableStatus::Missing {
                path: options.books_path.clone(),
            };
            (Vec::new(), status)
        };

        let (ratings, invalid_ratings, ratings_status) = if options.ratings_path.exists() {
            let table = ratings::read_ratings(&options.ratings_path)?;
            debug!(
                path = %options.ratings_path.display(),
                rows = table.rows.len(),
                "ratings table loaded"
            );
            let status = TableStatus::Loaded {
                rows: table.rows.len(),
            };
            (table.rows, table.invalid_ratings, status)
        } else {
            error!(
                path = %options.ratings_path.display(),
                "ratings file not found; serving an empty ratings table"
            );
            let status = TableStatus::Missing {
                path: options.ratings_path.clone(),
            };
            (Vec::new(), 0, status)
        };

        if invalid_ratings > 0 {
            warn!(
                count = invalid_ratings,
                "rating cells could not be parsed and were kept as missing"
            );
        }

        let store = Self::assemble(
            books,
            ratings,
            LoadReport {
                books: books_status,
                ratings: ratings_status,
                invalid_ratings,
            },
        );
        let summary = store.summary();
        info!(
            books = summary.total_books,
            users = summary.total_users,
            recommendations = summary.total_recommendations,
            degraded = store.is_degraded(),
            "store ready"
        );
        Ok(store)
    }

    /// Build a fully loaded store from in-memory tables.
    ///
    /// Intended for fixtures and benchmarks; both tables are reported as
    /// loaded.
    pub fn from_tables(books: Vec<Book>, ratings: Vec<PredictedRating>) -> Self {
        let report = LoadReport {
            books: TableStatus::Loaded { rows: books.len() },
            ratings: TableStatus::Loaded {
                rows: ratings.len(),
            },
            invalid_ratings: 0,
        };
        Self::assemble(books, ratings, report)
    }

    fn assemble(books: Vec<Book>, ratings: Vec<PredictedRating>, report: LoadReport) -> Self {
        let mut by_user: BTreeMap<UserId, Vec<usize>> = BTreeMap::new();
        for (row, rating) in ratings.iter().enumerate() {
            by_user.entry(rating.user_id).or_default().push(row);
        }
        Self {
            books,
            ratings,
            by_user,
            report,
        }
    }

    /// The full catalog table in file order.
    pub fn books(&self) -> &[Book] {
        &self.books
    }

    /// The full ratings table in file order.
    pub fn ratings(&self) -> &[PredictedRating] {
        &self.ratings
    }

    /// Catalog row at the given position, `None` when the index points past
    /// the end of the catalog.
    pub fn book_at(&self, index: u32) -> Option<&Book> {
        self.books.get(index as usize)
    }

    /// Rating rows for one user, in file order. Empty for unknown users.
    pub fn ratings_for(&self, user: UserId) -> impl Iterator<Item = &PredictedRating> + '_ {
        self.by_user
            .get(&user)
            .into_iter()
            .flatten()
            .map(move |&row| &self.ratings[row])
    }

    /// Distinct user ids in ascending order.
    pub fn user_ids(&self) -> impl Iterator<Item = UserId> + '_ {
        self.by_user.keys().copied()
    }

    /// Headline counters over the loaded tables.
    pub fn summary(&self) -> Summary {
        Summary {
            total_books: self.books.len(),
            total_users: self.by_user.len(),
            total_recommendations: self.ratings.len(),
        }
    }

    /// What happened at load time.
    pub fn report(&self) -> &LoadReport {
        &self.report
    }

    /// Whether any source table had to be substituted with an empty one.
    pub fn is_degraded(&self) -> bool {
        self.report.books.is_missing() || self.report.ratings.is_missing()
    }
}

fn open_error(path: &Path, source: std::io::Error) -> StoreError {
    StoreError::Io {
        path: path.to_path_buf(),
        source,
    }
}

fn csv_error(path: &Path, source: csv::Error) -> StoreError {
    StoreError::Csv {
        path: path.to_path_buf(),
        source,
    }
}

fn find_column(path: &Path, headers: &StringRecord, column: &'static str) -> Result<usize> {
    headers
        .iter()
        .position(|header| header.eq_ignore_ascii_case(column))
        .ok_or_else(|| StoreError::MissingColumn {
            path: path.to_path_buf(),
            column,
        })
}

fn get_optional(record: &StringRecord, index: usize) -> Option<String> {
    record
        .get(index)
        .filter(|value| !value.is_empty())
        .map(str::to_owned)
}

fn parse_index(
    path: &Path,
    record: &StringRecord,
    index: usize,
    column: &'static str,
) -> Result<u32> {
    let raw = record.get(index).unwrap_or("").trim();
    raw.parse::<u32>().map_err(|_| StoreError::InvalidField {
        path: path.to_path_buf(),
        line: record.position().map(|pos| pos.line()).unwrap_or(0),
        column,
        value: raw.to_string(),
    })
}
