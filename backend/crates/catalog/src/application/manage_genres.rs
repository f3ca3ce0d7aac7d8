//! Genre Write Use Cases (staff only)

use std::sync::Arc;

use chrono::Utc;
use kernel::error::field_errors::FieldErrors;
use kernel::id::GenreId;

use crate::application::validation::{check_max_chars, optional_text};
use crate::domain::entities::{Genre, GenreWithCount};
use crate::domain::repository::GenreRepository;
use crate::error::{CatalogError, CatalogResult};

pub const GENRE_NAME_MAX: usize = 100;

pub struct GenreInput {
    pub name: Option<String>,
    pub description: Option<String>,
}

/// Validated name + description
async fn validate<R: GenreRepository>(
    repo: &R,
    input: GenreInput,
    except: Option<&GenreId>,
) -> CatalogResult<(String, Option<String>)> {
    let mut errors = FieldErrors::new();

    let name = match errors.require("name", input.name.as_deref()) {
        Some(name) if check_max_chars(&mut errors, "name", name, GENRE_NAME_MAX) => {
            if repo.genre_name_taken(name, except).await? {
                errors.add("name", "genre with this name already exists.");
            }
            Some(name.to_string())
        }
        _ => None,
    };

    errors.into_result()?;
    let name = name.ok_or_else(|| CatalogError::Internal("validated genre without name".into()))?;
    Ok((name, optional_text(input.description)))
}

pub struct CreateGenreUseCase<R>
where
    R: GenreRepository,
{
    repo: Arc<R>,
}

impl<R> CreateGenreUseCase<R>
where
    R: GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: GenreInput) -> CatalogResult<GenreWithCount> {
        let (name, description) = validate(self.repo.as_ref(), input, None).await?;

        let genre = Genre::new(name, description, Utc::now());
        self.repo.create_genre(&genre).await?;

        tracing::info!(genre_id = %genre.id, name = %genre.name, "Genre created");

        Ok(GenreWithCount {
            genre,
            books_count: 0,
        })
    }
}

pub struct UpdateGenreUseCase<R>
where
    R: GenreRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateGenreUseCase<R>
where
    R: GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: &GenreId, input: GenreInput) -> CatalogResult<GenreWithCount> {
        let current = self
            .repo
            .find_genre(id)
            .await?
            .ok_or(CatalogError::GenreNotFound)?;

        let (name, description) = validate(self.repo.as_ref(), input, Some(id)).await?;

        let mut genre = current.genre;
        genre.name = name;
        genre.description = description;
        self.repo.update_genre(&genre).await?;

        tracing::info!(genre_id = %genre.id, "Genre updated");

        Ok(GenreWithCount {
            genre,
            books_count: current.books_count,
        })
    }
}

pub struct DeleteGenreUseCase<R>
where
    R: GenreRepository,
{
    repo: Arc<R>,
}

impl<R> DeleteGenreUseCase<R>
where
    R: GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Books filed under the genre lose their genre, they are not deleted
    pub async fn execute(&self, id: &GenreId) -> CatalogResult<()> {
        if !self.repo.delete_genre(id).await? {
            return Err(CatalogError::GenreNotFound);
        }
        tracing::info!(genre_id = %id, "Genre deleted");
        Ok(())
    }
}
