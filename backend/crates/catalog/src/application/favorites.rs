//! Favorites Use Cases
//!
//! Per-user favorite books. The user id comes from the bearer guard in
//! front of the router; these use cases never see credentials.

use std::sync::Arc;

use chrono::Utc;
use kernel::id::{BookId, UserId};

use crate::application::browse_books::{genre_of, genres_for};
use crate::domain::entities::{Book, GenreWithCount};
use crate::domain::repository::{BookRepository, FavoriteRepository, GenreRepository};
use crate::error::{CatalogError, CatalogResult};

/// A user's favorite books and the genres they reference
pub struct FavoritesOutput {
    pub books: Vec<Book>,
    pub genres: Vec<GenreWithCount>,
}

impl FavoritesOutput {
    pub fn genre_of(&self, book: &Book) -> Option<&GenreWithCount> {
        genre_of(&self.genres, book)
    }
}

pub struct ListFavoritesUseCase<R>
where
    R: FavoriteRepository + GenreRepository,
{
    repo: Arc<R>,
}

impl<R> ListFavoritesUseCase<R>
where
    R: FavoriteRepository + GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user: &UserId) -> CatalogResult<FavoritesOutput> {
        let books = self.repo.list_favorites(user).await?;
        let genres = genres_for(self.repo.as_ref(), &books).await?;
        Ok(FavoritesOutput { books, genres })
    }
}

/// Result of adding a favorite
pub struct AddFavoriteOutput {
    pub book: Book,
    pub genre: Option<GenreWithCount>,
    /// False when the book was already a favorite
    pub added: bool,
}

pub struct AddFavoriteUseCase<R>
where
    R: FavoriteRepository + BookRepository + GenreRepository,
{
    repo: Arc<R>,
}

impl<R> AddFavoriteUseCase<R>
where
    R: FavoriteRepository + BookRepository + GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Adding twice is not an error
    pub async fn execute(&self, user: &UserId, book_id: &BookId) -> CatalogResult<AddFavoriteOutput> {
        let book = self
            .repo
            .find_book(book_id)
            .await?
            .ok_or(CatalogError::BookNotFound)?;

        let added = self.repo.add_favorite(user, book_id, Utc::now()).await?;
        let genre = match &book.genre_id {
            Some(genre_id) => self.repo.find_genre(genre_id).await?,
            None => None,
        };

        tracing::debug!(user_id = %user, book_id = %book_id, added, "Favorite added");

        Ok(AddFavoriteOutput { book, genre, added })
    }
}

pub struct RemoveFavoriteUseCase<R>
where
    R: FavoriteRepository,
{
    repo: Arc<R>,
}

impl<R> RemoveFavoriteUseCase<R>
where
    R: FavoriteRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, user: &UserId, book_id: &BookId) -> CatalogResult<()> {
        if !self.repo.remove_favorite(user, book_id).await? {
            return Err(CatalogError::FavoriteNotFound);
        }

        tracing::debug!(user_id = %user, book_id = %book_id, "Favorite removed");
        Ok(())
    }
}
