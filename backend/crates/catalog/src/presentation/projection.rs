//! Response Projections
//!
//! Each endpoint picks one named projection; derived fields (stars,
//! currency, live counts, image metadata, durations) are computed here.

use axum::http::{HeaderMap, header};
use chrono::{DateTime, Utc};
use kernel::id::{BookId, GenreId, ScrapingLogId};
use serde::Serialize;

use crate::application::config::CatalogConfig;
use crate::domain::entities::{Book, GenreWithCount, ScrapingLog};
use crate::domain::services::{format_duration, human_size};
use crate::domain::value_objects::{MediaPath, Price, PublicationYear, ScrapingStatus};

// ============================================================================
// Media links
// ============================================================================

/// Builds relative and absolute media URLs for one request
pub struct MediaLinks<'a> {
    config: &'a CatalogConfig,
    origin: String,
}

impl<'a> MediaLinks<'a> {
    pub fn new(config: &'a CatalogConfig, origin: String) -> Self {
        Self { config, origin }
    }

    /// Origin from `X-Forwarded-Proto` + `Host`, else the configured base URL
    pub fn from_headers(config: &'a CatalogConfig, headers: &HeaderMap) -> Self {
        let origin = request_origin(headers)
            .unwrap_or_else(|| config.public_base_url.trim_end_matches('/').to_string());
        Self::new(config, origin)
    }

    pub fn url(&self, path: &MediaPath) -> String {
        self.config.media_url_for(path.as_str())
    }

    pub fn absolute_url(&self, path: &MediaPath) -> String {
        let url = self.url(path);
        if url.starts_with("http://") || url.starts_with("https://") {
            url
        } else if url.starts_with('/') {
            format!("{}{}", self.origin, url)
        } else {
            format!("{}/{}", self.origin, url)
        }
    }
}

fn request_origin(headers: &HeaderMap) -> Option<String> {
    let host = headers.get(header::HOST)?.to_str().ok()?.trim();
    if host.is_empty() || host.contains(['/', ' ', '\\', '@']) {
        return None;
    }

    let scheme = headers
        .get("x-forwarded-proto")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(|v| v.trim().to_ascii_lowercase())
        .filter(|v| v == "http" || v == "https")
        .unwrap_or_else(|| "http".to_string());

    Some(format!("{scheme}://{host}"))
}

// ============================================================================
// Genres
// ============================================================================

/// Genre as embedded in book projections
#[derive(Debug, Clone, Serialize)]
pub struct GenreSummary {
    pub id: GenreId,
    pub name: String,
    pub books_count: u64,
}

impl From<&GenreWithCount> for GenreSummary {
    fn from(g: &GenreWithCount) -> Self {
        Self {
            id: g.genre.id,
            name: g.genre.name.clone(),
            books_count: g.books_count,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct GenreView {
    pub id: GenreId,
    pub name: String,
    pub description: Option<String>,
    pub books_count: u64,
    pub created_at: DateTime<Utc>,
}

impl From<&GenreWithCount> for GenreView {
    fn from(g: &GenreWithCount) -> Self {
        Self {
            id: g.genre.id,
            name: g.genre.name.clone(),
            description: g.genre.description.clone(),
            books_count: g.books_count,
            created_at: g.genre.created_at,
        }
    }
}

// ============================================================================
// Books
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ImageInfo {
    pub has_image: bool,
    pub filename: Option<String>,
    pub extension: Option<String>,
    pub size_bytes: Option<u64>,
    pub size_display: Option<String>,
    pub url: Option<String>,
    pub absolute_url: Option<String>,
}

impl ImageInfo {
    pub fn none() -> Self {
        Self {
            has_image: false,
            filename: None,
            extension: None,
            size_bytes: None,
            size_display: None,
            url: None,
            absolute_url: None,
        }
    }

    /// `size` is `None` when the file is missing from the media root
    pub fn build(path: &MediaPath, size: Option<u64>, links: &MediaLinks<'_>) -> Self {
        Self {
            has_image: true,
            filename: Some(path.file_name().to_string()),
            extension: path.extension(),
            size_bytes: size,
            size_display: size.map(human_size),
            url: Some(links.url(path)),
            absolute_url: Some(links.absolute_url(path)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SimilarBook {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub thumbnail_url: Option<String>,
}

impl SimilarBook {
    pub fn build(book: &Book, links: &MediaLinks<'_>) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            thumbnail_url: book.image.as_ref().map(|p| links.absolute_url(p)),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookDetail {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre: Option<GenreSummary>,
    pub description: Option<String>,
    pub publication_year: Option<PublicationYear>,
    pub price: Price,
    pub price_display: String,
    pub rating: u8,
    pub rating_display: String,
    pub in_stock: bool,
    pub availability: String,
    pub source_url: Option<String>,
    pub image: ImageInfo,
    pub similar_books: Vec<SimilarBook>,
    pub last_scraped: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl BookDetail {
    pub fn build(
        book: &Book,
        genre: Option<&GenreWithCount>,
        image: ImageInfo,
        similar: &[Book],
        links: &MediaLinks<'_>,
    ) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            isbn: book.isbn.clone(),
            genre: genre.map(GenreSummary::from),
            description: book.description.clone(),
            publication_year: book.publication_year,
            price: book.price,
            price_display: book.price.display(),
            rating: book.rating.value(),
            rating_display: book.rating.stars(),
            in_stock: book.in_stock,
            availability: book.availability.clone(),
            source_url: book.source_url.as_ref().map(|u| u.as_str().to_string()),
            image,
            similar_books: similar.iter().map(|b| SimilarBook::build(b, links)).collect(),
            last_scraped: book.last_scraped,
            created_at: book.created_at,
            updated_at: book.updated_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct BookListItem {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub genre: Option<GenreSummary>,
    pub publication_year: Option<PublicationYear>,
    pub price: Price,
    pub price_display: String,
    pub rating: u8,
    pub in_stock: bool,
    pub image_url: Option<String>,
}

impl BookListItem {
    pub fn build(book: &Book, genre: Option<&GenreWithCount>, links: &MediaLinks<'_>) -> Self {
        Self {
            id: book.id,
            title: book.title.clone(),
            author: book.author.clone(),
            genre: genre.map(GenreSummary::from),
            publication_year: book.publication_year,
            price: book.price,
            price_display: book.price.display(),
            rating: book.rating.value(),
            in_stock: book.in_stock,
            image_url: book.image.as_ref().map(|p| links.absolute_url(p)),
        }
    }
}

// ============================================================================
// Scraping logs
// ============================================================================

#[derive(Debug, Clone, Serialize)]
pub struct ScrapingLogView {
    pub id: ScrapingLogId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    /// `H:MM:SS`, null while the run is going
    pub duration: Option<String>,
    pub total_books_found: u32,
    pub books_created: u32,
    pub books_updated: u32,
    pub errors_count: u32,
    pub status: ScrapingStatus,
    pub error_message: Option<String>,
}

impl From<&ScrapingLog> for ScrapingLogView {
    fn from(log: &ScrapingLog) -> Self {
        Self {
            id: log.id,
            started_at: log.started_at,
            finished_at: log.finished_at,
            duration: log.duration().map(format_duration),
            total_books_found: log.counts.total_books_found,
            books_created: log.counts.books_created,
            books_updated: log.counts.books_updated,
            errors_count: log.counts.errors_count,
            status: log.status,
            error_message: log.error_message.clone(),
        }
    }
}
