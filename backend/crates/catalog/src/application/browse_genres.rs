//! Browse Genres Use Cases

use std::sync::Arc;

use kernel::id::GenreId;

use crate::domain::entities::GenreWithCount;
use crate::domain::repository::GenreRepository;
use crate::error::{CatalogError, CatalogResult};

pub struct ListGenresUseCase<R>
where
    R: GenreRepository,
{
    repo: Arc<R>,
}

impl<R> ListGenresUseCase<R>
where
    R: GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self) -> CatalogResult<Vec<GenreWithCount>> {
        self.repo.list_genres().await
    }
}

pub struct GetGenreUseCase<R>
where
    R: GenreRepository,
{
    repo: Arc<R>,
}

impl<R> GetGenreUseCase<R>
where
    R: GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: &GenreId) -> CatalogResult<GenreWithCount> {
        self.repo
            .find_genre(id)
            .await?
            .ok_or(CatalogError::GenreNotFound)
    }
}
