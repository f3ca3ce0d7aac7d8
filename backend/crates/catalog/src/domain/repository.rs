//! Repository Traits
//!
//! Interfaces for data persistence. Implementation is in infrastructure layer.

use chrono::{DateTime, Utc};
use kernel::id::{BookId, GenreId, ScrapingLogId, UserId};
use kernel::pagination::PageRequest;

use crate::domain::entities::{Book, Genre, GenreWithCount, ScrapingLog};
use crate::error::CatalogResult;

/// How a book listing narrows by genre
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenreFilter {
    Id(GenreId),
    /// Case-insensitive exact name
    Name(String),
}

impl GenreFilter {
    /// Ids win over names when the value parses as one
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();
        if value.is_empty() {
            return None;
        }
        Some(match value.parse::<GenreId>() {
            Ok(id) => GenreFilter::Id(id),
            Err(_) => GenreFilter::Name(value.to_string()),
        })
    }
}

/// Book listing filters; every `None` means "don't filter"
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookFilter {
    /// Case-insensitive substring of the title
    pub title: Option<String>,
    /// Case-insensitive substring of the author
    pub author: Option<String>,
    pub genre: Option<GenreFilter>,
    /// Inclusive lower bound on publication year
    pub from_year: Option<i32>,
    /// Inclusive upper bound on publication year
    pub to_year: Option<i32>,
    pub in_stock: Option<bool>,
}

/// Genre repository trait
#[trait_variant::make(GenreRepository: Send)]
pub trait LocalGenreRepository {
    /// All genres with live book counts, ordered by name
    async fn list_genres(&self) -> CatalogResult<Vec<GenreWithCount>>;

    async fn find_genre(&self, id: &GenreId) -> CatalogResult<Option<GenreWithCount>>;

    /// Counts for the given genres only (missing ids are skipped)
    async fn genre_summaries(&self, ids: &[GenreId]) -> CatalogResult<Vec<GenreWithCount>>;

    /// Case-insensitive name check, optionally ignoring one genre
    async fn genre_name_taken(&self, name: &str, except: Option<&GenreId>) -> CatalogResult<bool>;

    async fn create_genre(&self, genre: &Genre) -> CatalogResult<()>;

    async fn update_genre(&self, genre: &Genre) -> CatalogResult<()>;

    /// Delete a genre; books filed under it keep existing without a genre.
    /// Returns false when nothing was deleted.
    async fn delete_genre(&self, id: &GenreId) -> CatalogResult<bool>;
}

/// Book repository trait
#[trait_variant::make(BookRepository: Send)]
pub trait LocalBookRepository {
    /// One page of books, newest first, plus the total match count
    async fn search_books(
        &self,
        filter: &BookFilter,
        page: PageRequest,
    ) -> CatalogResult<(Vec<Book>, u64)>;

    async fn find_book(&self, id: &BookId) -> CatalogResult<Option<Book>>;

    /// Newest books of `genre`, excluding `exclude`
    async fn similar_books(
        &self,
        genre: &GenreId,
        exclude: &BookId,
        limit: u32,
    ) -> CatalogResult<Vec<Book>>;

    /// Title + author pair check, optionally ignoring one book
    async fn book_exists(
        &self,
        title: &str,
        author: &str,
        except: Option<&BookId>,
    ) -> CatalogResult<bool>;

    async fn create_book(&self, book: &Book) -> CatalogResult<()>;

    async fn update_book(&self, book: &Book) -> CatalogResult<()>;

    async fn delete_book(&self, id: &BookId) -> CatalogResult<bool>;
}

/// ScrapingLog repository trait
#[trait_variant::make(ScrapingLogRepository: Send)]
pub trait LocalScrapingLogRepository {
    /// Newest run first
    async fn list_runs(&self) -> CatalogResult<Vec<ScrapingLog>>;

    async fn find_run(&self, id: &ScrapingLogId) -> CatalogResult<Option<ScrapingLog>>;

    async fn create_run(&self, log: &ScrapingLog) -> CatalogResult<()>;

    async fn update_run(&self, log: &ScrapingLog) -> CatalogResult<()>;
}

/// Per-user favorite books
#[trait_variant::make(FavoriteRepository: Send)]
pub trait LocalFavoriteRepository {
    /// The user's favorites, most recently added first
    async fn list_favorites(&self, user: &UserId) -> CatalogResult<Vec<Book>>;

    /// Returns false when the book was already a favorite
    async fn add_favorite(
        &self,
        user: &UserId,
        book: &BookId,
        at: DateTime<Utc>,
    ) -> CatalogResult<bool>;

    /// Returns false when the book was not a favorite
    async fn remove_favorite(&self, user: &UserId, book: &BookId) -> CatalogResult<bool>;
}

/// Everything the catalog routers need from storage
pub trait CatalogRepository:
    GenreRepository + BookRepository + ScrapingLogRepository + FavoriteRepository
{
}

impl<T> CatalogRepository for T where
    T: GenreRepository + BookRepository + ScrapingLogRepository + FavoriteRepository
{
}
