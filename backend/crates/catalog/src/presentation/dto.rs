//! API DTOs (Data Transfer Objects)
//!
//! Request side only; response shapes live in `projection`.

use chrono::{DateTime, Utc};
use kernel::error::field_errors::FieldErrors;
use serde::Deserialize;

use crate::application::{BookInput, FinishRunInput, GenreInput, RunCountsInput};
use crate::domain::repository::{BookFilter, GenreFilter};

// ============================================================================
// Book listing query
// ============================================================================

/// `GET /scraping/books` query string
///
/// Everything is read as text so that bad values come back as field errors.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookQuery {
    pub title: Option<String>,
    pub author: Option<String>,
    pub genre: Option<String>,
    #[serde(rename = "fromYear")]
    pub from_year: Option<String>,
    #[serde(rename = "toYear")]
    pub to_year: Option<String>,
    pub in_stock: Option<String>,
    pub page: Option<String>,
    pub page_size: Option<String>,
}

/// Parsed listing query
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BookListing {
    pub filter: BookFilter,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

impl BookQuery {
    pub fn parse(self) -> Result<BookListing, FieldErrors> {
        let mut errors = FieldErrors::new();

        let filter = BookFilter {
            title: non_blank(self.title),
            author: non_blank(self.author),
            genre: self.genre.as_deref().and_then(GenreFilter::parse),
            from_year: parse_number(&mut errors, "fromYear", self.from_year),
            to_year: parse_number(&mut errors, "toYear", self.to_year),
            in_stock: parse_flag(&mut errors, "in_stock", self.in_stock),
        };
        let page = parse_number(&mut errors, "page", self.page);
        let page_size = parse_number(&mut errors, "page_size", self.page_size);

        errors.into_result()?;
        Ok(BookListing {
            filter,
            page,
            page_size,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

fn parse_number<T: std::str::FromStr>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<String>,
) -> Option<T> {
    let value = non_blank(value)?;
    match value.parse() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, "Enter a whole number.");
            None
        }
    }
}

fn parse_flag(errors: &mut FieldErrors, field: &str, value: Option<String>) -> Option<bool> {
    let value = non_blank(value)?;
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => {
            errors.add(field, "Must be a valid boolean.");
            None
        }
    }
}

// ============================================================================
// Genre writes
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct GenreRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

impl From<GenreRequest> for GenreInput {
    fn from(req: GenreRequest) -> Self {
        Self {
            name: req.name,
            description: req.description,
        }
    }
}

// ============================================================================
// Book writes
// ============================================================================

/// Price may arrive as a JSON string or number
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceValue {
    Text(String),
    Number(serde_json::Number),
}

impl PriceValue {
    fn into_text(self) -> String {
        match self {
            PriceValue::Text(text) => text,
            PriceValue::Number(number) => number.to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct BookRequest {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    /// Genre id
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publication_year: Option<i64>,
    pub price: Option<PriceValue>,
    pub rating: Option<i64>,
    pub in_stock: Option<bool>,
    pub availability: Option<String>,
    pub source_url: Option<String>,
    /// Path relative to the media root
    pub image: Option<String>,
    pub last_scraped: Option<DateTime<Utc>>,
}

impl From<BookRequest> for BookInput {
    fn from(req: BookRequest) -> Self {
        Self {
            title: req.title,
            author: req.author,
            isbn: req.isbn,
            genre: req.genre,
            description: req.description,
            publication_year: req.publication_year,
            price: req.price.map(PriceValue::into_text),
            rating: req.rating,
            in_stock: req.in_stock,
            availability: req.availability,
            source_url: req.source_url,
            image: req.image,
            last_scraped: req.last_scraped,
        }
    }
}

// ============================================================================
// Scraping run writes
// ============================================================================

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RunCountsRequest {
    pub total_books_found: Option<i64>,
    pub books_created: Option<i64>,
    pub books_updated: Option<i64>,
    pub errors_count: Option<i64>,
}

impl From<RunCountsRequest> for RunCountsInput {
    fn from(req: RunCountsRequest) -> Self {
        Self {
            total_books_found: req.total_books_found,
            books_created: req.books_created,
            books_updated: req.books_updated,
            errors_count: req.errors_count,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FinishRunRequest {
    pub status: Option<String>,
    pub error_message: Option<String>,
    #[serde(flatten)]
    pub counts: RunCountsRequest,
}

impl From<FinishRunRequest> for FinishRunInput {
    fn from(req: FinishRunRequest) -> Self {
        Self {
            status: req.status,
            counts: req.counts.into(),
            error_message: req.error_message,
        }
    }
}
