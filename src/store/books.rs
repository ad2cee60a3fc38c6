//! Catalog table: one row per book, addressed by file position.

use std::fs::File;
use std::path::Path;

use csv::ReaderBuilder;
use serde::Serialize;

use crate::error::Result;
use crate::store::{csv_error, find_column, get_optional, open_error};

/// One catalog row.
///
/// Every field is optional: the source data is scraped and sparse, and a
/// blank cell is normal rather than exceptional. Consumers that need a
/// displayable value go through [`BookCard`], which substitutes the
/// documented fallbacks.
///
/// [`BookCard`]: crate::query::BookCard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Book {
    /// ISBN as printed in the source file, not validated or normalized.
    pub isbn: Option<String>,
    /// Title of the book.
    pub title: Option<String>,
    /// Primary author.
    pub author: Option<String>,
    /// Publication year, kept as text because the source mixes formats.
    pub year_of_publication: Option<String>,
    /// Publishing house.
    pub publisher: Option<String>,
    /// URL of the medium-size cover image.
    pub cover_image_url: Option<String>,
}

pub(crate) fn read_books(path: &Path) -> Result<Vec<Book>> {
    let file = File::open(path).map_err(|err| open_error(path, err))?;
    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.headers().map_err(|err| csv_error(path, err))?.clone();

    let idx_isbn = find_column(path, &headers, "ISBN")?;
    let idx_title = find_column(path, &headers, "Book-Title")?;
    let idx_author = find_column(path, &headers, "Book-Author")?;
    let idx_year = find_column(path, &headers, "Year-Of-Publication")?;
    let idx_publisher = find_column(path, &headers, "Publisher")?;
    let idx_cover = find_column(path, &headers, "Image-URL-M")?;

    let mut books = Vec::new();
    for result in reader.records() {
        let record = result.map_err(|err| csv_error(path, err))?;
        books.push(Book {
            isbn: get_optional(&record, idx_isbn),
            title: get_optional(&record, idx_title),
            author: get_optional(&record, idx_author),
            year_of_publication: get_optional(&record, idx_year),
            publisher: get_optional(&record, idx_publisher),
            cover_image_url: get_optional(&record, idx_cover),
        });
    }
    Ok(books)
}
