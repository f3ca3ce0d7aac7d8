//! Domain Entities
//!
//! Core business entities for the catalog domain.

use chrono::{DateTime, TimeDelta, Utc};
use kernel::id::{BookId, GenreId, ScrapingLogId};
use thiserror::Error;

use crate::domain::value_objects::{
    MediaPath, Price, PublicationYear, Rating, ScrapingStatus, SourceUrl,
};

/// Genre entity - a named shelf books can be filed under
#[derive(Debug, Clone, PartialEq)]
pub struct Genre {
    pub id: GenreId,
    pub name: String,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Genre {
    pub fn new(name: String, description: Option<String>, now: DateTime<Utc>) -> Self {
        Self {
            id: GenreId::new(),
            name,
            description,
            created_at: now,
        }
    }
}

/// Genre with the live number of books filed under it
#[derive(Debug, Clone, PartialEq)]
pub struct GenreWithCount {
    pub genre: Genre,
    pub books_count: u64,
}

/// Writable book fields, already validated
#[derive(Debug, Clone, PartialEq)]
pub struct BookFields {
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre_id: Option<GenreId>,
    pub description: Option<String>,
    pub publication_year: Option<PublicationYear>,
    pub price: Price,
    pub rating: Rating,
    pub in_stock: bool,
    pub availability: String,
    pub source_url: Option<SourceUrl>,
    pub image: Option<MediaPath>,
    pub last_scraped: Option<DateTime<Utc>>,
}

/// Book entity
#[derive(Debug, Clone, PartialEq)]
pub struct Book {
    pub id: BookId,
    pub title: String,
    pub author: String,
    pub isbn: Option<String>,
    pub genre_id: Option<GenreId>,
    pub description: Option<String>,
    pub publication_year: Option<PublicationYear>,
    pub price: Price,
    pub rating: Rating,
    pub in_stock: bool,
    pub availability: String,
    pub source_url: Option<SourceUrl>,
    pub image: Option<MediaPath>,
    pub last_scraped: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Book {
    pub fn new(fields: BookFields, now: DateTime<Utc>) -> Self {
        let BookFields {
            title,
            author,
            isbn,
            genre_id,
            description,
            publication_year,
            price,
            rating,
            in_stock,
            availability,
            source_url,
            image,
            last_scraped,
        } = fields;

        Self {
            id: BookId::new(),
            title,
            author,
            isbn,
            genre_id,
            description,
            publication_year,
            price,
            rating,
            in_stock,
            availability,
            source_url,
            image,
            last_scraped,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace every writable field and bump `updated_at`
    pub fn apply(&mut self, fields: BookFields, now: DateTime<Utc>) {
        let created_at = self.created_at;
        let id = self.id;
        *self = Self::new(fields, now);
        self.id = id;
        self.created_at = created_at;
    }
}

/// Counters reported by a scraping run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunCounts {
    pub total_books_found: u32,
    pub books_created: u32,
    pub books_updated: u32,
    pub errors_count: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Scraping run already finished with status '{0}'")]
    AlreadyFinished(ScrapingStatus),

    #[error("A run can only finish as completed, failed or interrupted.")]
    NotTerminal,
}

/// ScrapingLog entity - bookkeeping for one scraper run
///
/// `running` moves to exactly one of the terminal statuses; terminal
/// runs are frozen.
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapingLog {
    pub id: ScrapingLogId,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub counts: RunCounts,
    pub status: ScrapingStatus,
    pub error_message: Option<String>,
}

impl ScrapingLog {
    pub fn start(now: DateTime<Utc>) -> Self {
        Self {
            id: ScrapingLogId::new(),
            started_at: now,
            finished_at: None,
            counts: RunCounts::default(),
            status: ScrapingStatus::Running,
            error_message: None,
        }
    }

    pub fn record_progress(&mut self, counts: RunCounts) -> Result<(), TransitionError> {
        self.ensure_running()?;
        self.counts = counts;
        Ok(())
    }

    pub fn finish(
        &mut self,
        status: ScrapingStatus,
        counts: Option<RunCounts>,
        error_message: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<(), TransitionError> {
        self.ensure_running()?;
        if !status.is_terminal() {
            return Err(TransitionError::NotTerminal);
        }
        if let Some(counts) = counts {
            self.counts = counts;
        }
        self.status = status;
        self.error_message = error_message;
        self.finished_at = Some(now);
        Ok(())
    }

    /// Elapsed time, only once the run has finished
    pub fn duration(&self) -> Option<TimeDelta> {
        self.finished_at.map(|finished| finished - self.started_at)
    }

    fn ensure_running(&self) -> Result<(), TransitionError> {
        if self.status.is_terminal() {
            return Err(TransitionError::AlreadyFinished(self.status));
        }
        Ok(())
    }
}
