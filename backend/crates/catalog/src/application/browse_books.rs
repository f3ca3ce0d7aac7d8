//! Browse Books Use Cases
//!
//! Read-side book queries: filtered listing, detail and recommendations.

use std::sync::Arc;

use kernel::id::BookId;
use kernel::pagination::{Page, PageRequest};

use crate::application::config::CatalogConfig;
use crate::domain::entities::{Book, GenreWithCount};
use crate::domain::repository::{BookFilter, BookRepository, GenreRepository};
use crate::error::{CatalogError, CatalogResult};

/// One page of books and the genres they reference
pub struct ListBooksOutput {
    pub books: Page<Book>,
    pub genres: Vec<GenreWithCount>,
}

/// The summary for a book's genre among already loaded ones
pub fn genre_of<'a>(genres: &'a [GenreWithCount], book: &Book) -> Option<&'a GenreWithCount> {
    let id = book.genre_id?;
    genres.iter().find(|g| g.genre.id == id)
}

/// Live summaries for every genre the books reference, one query
pub(crate) async fn genres_for<R: GenreRepository>(
    repo: &R,
    books: &[Book],
) -> CatalogResult<Vec<GenreWithCount>> {
    let mut genre_ids: Vec<_> = books.iter().filter_map(|b| b.genre_id).collect();
    genre_ids.sort_by_key(|id| *id.as_uuid());
    genre_ids.dedup();
    if genre_ids.is_empty() {
        return Ok(Vec::new());
    }
    repo.genre_summaries(&genre_ids).await
}

pub struct ListBooksUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    repo: Arc<R>,
    config: Arc<CatalogConfig>,
}

impl<R> ListBooksUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CatalogConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(
        &self,
        filter: BookFilter,
        page: Option<u32>,
        page_size: Option<u32>,
    ) -> CatalogResult<ListBooksOutput> {
        let request = PageRequest::new(
            page,
            page_size,
            self.config.default_page_size,
            self.config.max_page_size,
        );

        let (books, count) = self.repo.search_books(&filter, request).await?;

        let genres = genres_for(self.repo.as_ref(), &books).await?;

        tracing::debug!(count, page = request.page(), "Listed books");

        Ok(ListBooksOutput {
            books: Page::new(books, count, request),
            genres,
        })
    }
}

/// A book with its genre and same-genre neighbours
pub struct BookDetailOutput {
    pub book: Book,
    pub genre: Option<GenreWithCount>,
    pub similar: Vec<Book>,
}

pub struct BookDetailUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    repo: Arc<R>,
    config: Arc<CatalogConfig>,
}

impl<R> BookDetailUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CatalogConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, id: &BookId) -> CatalogResult<BookDetailOutput> {
        let book = self
            .repo
            .find_book(id)
            .await?
            .ok_or(CatalogError::BookNotFound)?;

        let genre = match &book.genre_id {
            Some(genre_id) => self.repo.find_genre(genre_id).await?,
            None => None,
        };
        let similar = similar_to(self.repo.as_ref(), &book, self.config.similar_books_limit).await?;

        Ok(BookDetailOutput {
            book,
            genre,
            similar,
        })
    }
}

pub struct RecommendedBooksUseCase<R>
where
    R: BookRepository,
{
    repo: Arc<R>,
    config: Arc<CatalogConfig>,
}

impl<R> RecommendedBooksUseCase<R>
where
    R: BookRepository,
{
    pub fn new(repo: Arc<R>, config: Arc<CatalogConfig>) -> Self {
        Self { repo, config }
    }

    pub async fn execute(&self, id: &BookId) -> CatalogResult<Vec<Book>> {
        let book = self
            .repo
            .find_book(id)
            .await?
            .ok_or(CatalogError::BookNotFound)?;

        similar_to(self.repo.as_ref(), &book, self.config.similar_books_limit).await
    }
}

/// Books without a genre have no neighbours
async fn similar_to<R: BookRepository>(repo: &R, book: &Book, limit: u32) -> CatalogResult<Vec<Book>> {
    match &book.genre_id {
        Some(genre_id) => repo.similar_books(genre_id, &book.id, limit).await,
        None => Ok(Vec::new()),
    }
}
