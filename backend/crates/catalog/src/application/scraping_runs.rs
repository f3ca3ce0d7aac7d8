//! Scraping Run Use Cases
//!
//! Read access to the run log, plus the writes a scraper performs while
//! it runs: start, progress, finish.

use std::sync::Arc;

use chrono::Utc;
use kernel::error::field_errors::FieldErrors;
use kernel::id::ScrapingLogId;

use crate::application::validation::optional_text;
use crate::domain::entities::{RunCounts, ScrapingLog, TransitionError};
use crate::domain::repository::ScrapingLogRepository;
use crate::domain::value_objects::{ScrapingStatus, ValueError};
use crate::error::{CatalogError, CatalogResult};

/// Counter updates; absent counters keep their current value
#[derive(Debug, Default, Clone, Copy)]
pub struct RunCountsInput {
    pub total_books_found: Option<i64>,
    pub books_created: Option<i64>,
    pub books_updated: Option<i64>,
    pub errors_count: Option<i64>,
}

impl RunCountsInput {
    pub fn is_empty(&self) -> bool {
        self.total_books_found.is_none()
            && self.books_created.is_none()
            && self.books_updated.is_none()
            && self.errors_count.is_none()
    }

    fn resolve(self, current: RunCounts, errors: &mut FieldErrors) -> RunCounts {
        let mut field = |name: &str, value: Option<i64>, fallback: u32| match value {
            None => fallback,
            Some(v) if v < 0 => {
                errors.add(name, ValueError::BelowMin(0).to_string());
                fallback
            }
            Some(v) if v > i64::from(i32::MAX) => {
                errors.add(name, ValueError::AboveMax(i64::from(i32::MAX)).to_string());
                fallback
            }
            Some(v) => v as u32,
        };

        RunCounts {
            total_books_found: field(
                "total_books_found",
                self.total_books_found,
                current.total_books_found,
            ),
            books_created: field("books_created", self.books_created, current.books_created),
            books_updated: field("books_updated", self.books_updated, current.books_updated),
            errors_count: field("errors_count", self.errors_count, current.errors_count),
        }
    }
}

pub struct FinishRunInput {
    pub status: Option<String>,
    pub counts: RunCountsInput,
    pub error_message: Option<String>,
}

fn transition_error(err: TransitionError) -> CatalogError {
    match err {
        TransitionError::AlreadyFinished(status) => CatalogError::RunFinished(status.to_string()),
        TransitionError::NotTerminal => {
            CatalogError::Validation(FieldErrors::single("status", err.to_string()))
        }
    }
}

// ============================================================================
// Read
// ============================================================================

pub struct ListScrapingRunsUseCase<R>
where
    R: ScrapingLogRepository,
{
    repo: Arc<R>,
}

impl<R> ListScrapingRunsUseCase<R>
where
    R: ScrapingLogRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> CatalogResult<Vec<ScrapingLog>> {
        self.repo.list_runs().await
    }
}

pub struct GetScrapingRunUseCase<R>
where
    R: ScrapingLogRepository,
{
    repo: Arc<R>,
}

impl<R> GetScrapingRunUseCase<R>
where
    R: ScrapingLogRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: &ScrapingLogId) -> CatalogResult<ScrapingLog> {
        self.repo
            .find_run(id)
            .await?
            .ok_or(CatalogError::ScrapingLogNotFound)
    }
}

// ============================================================================
// Write
// ============================================================================

pub struct StartScrapingRunUseCase<R>
where
    R: ScrapingLogRepository,
{
    repo: Arc<R>,
}

impl<R> StartScrapingRunUseCase<R>
where
    R: ScrapingLogRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> CatalogResult<ScrapingLog> {
        let log = ScrapingLog::start(Utc::now());
        self.repo.create_run(&log).await?;

        tracing::info!(run_id = %log.id, "Scraping run started");
        Ok(log)
    }
}

pub struct RecordRunProgressUseCase<R>
where
    R: ScrapingLogRepository,
{
    repo: Arc<R>,
}

impl<R> RecordRunProgressUseCase<R>
where
    R: ScrapingLogRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: &ScrapingLogId, input: RunCountsInput) -> CatalogResult<ScrapingLog> {
        let mut log = self
            .repo
            .find_run(id)
            .await?
            .ok_or(CatalogError::ScrapingLogNotFound)?;

        let mut errors = FieldErrors::new();
        let counts = input.resolve(log.counts, &mut errors);
        errors.into_result()?;

        log.record_progress(counts).map_err(transition_error)?;
        self.repo.update_run(&log).await?;

        tracing::debug!(
            run_id = %log.id,
            found = counts.total_books_found,
            created = counts.books_created,
            updated = counts.books_updated,
            errors = counts.errors_count,
            "Scraping run progress"
        );
        Ok(log)
    }
}

pub struct FinishScrapingRunUseCase<R>
where
    R: ScrapingLogRepository,
{
    repo: Arc<R>,
}

impl<R> FinishScrapingRunUseCase<R>
where
    R: ScrapingLogRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: &ScrapingLogId, input: FinishRunInput) -> CatalogResult<ScrapingLog> {
        let mut log = self
            .repo
            .find_run(id)
            .await?
            .ok_or(CatalogError::ScrapingLogNotFound)?;

        let mut errors = FieldErrors::new();
        let status = match errors.require("status", input.status.as_deref()) {
            Some(raw) => match raw.parse::<ScrapingStatus>() {
                Ok(status) => Some(status),
                Err(e) => {
                    errors.add("status", e.to_string());
                    None
                }
            },
            None => None,
        };
        let counts = (!input.counts.is_empty()).then(|| input.counts.resolve(log.counts, &mut errors));
        errors.into_result()?;

        let status = status.ok_or_else(|| CatalogError::Internal("validated run without status".into()))?;
        log.finish(status, counts, optional_text(input.error_message), Utc::now())
            .map_err(transition_error)?;
        self.repo.update_run(&log).await?;

        match status {
            ScrapingStatus::Completed => {
                tracing::info!(run_id = %log.id, "Scraping run completed");
            }
            _ => {
                tracing::warn!(
                    run_id = %log.id,
                    status = %status,
                    error = log.error_message.as_deref().unwrap_or_default(),
                    "Scraping run ended early"
                );
            }
        }
        Ok(log)
    }
}
