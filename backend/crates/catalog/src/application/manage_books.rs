//! Book Write Use Cases (staff only)
//!
//! Create and update share one validation pass that reports every
//! failing field at once.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use kernel::error::field_errors::FieldErrors;
use kernel::id::{BookId, GenreId};

use crate::application::validation::{check, check_max_chars, optional_text};
use crate::domain::entities::{Book, BookFields};
use crate::domain::repository::{BookRepository, GenreRepository};
use crate::domain::value_objects::{MediaPath, Price, PublicationYear, Rating, SourceUrl};
use crate::error::{CatalogError, CatalogResult};

pub const TITLE_MAX: usize = 255;
pub const AUTHOR_MAX: usize = 255;
pub const ISBN_MAX: usize = 20;
pub const AVAILABILITY_MAX: usize = 100;

/// Book input as it arrives; absent optional fields take their defaults
#[derive(Debug, Default)]
pub struct BookInput {
    pub title: Option<String>,
    pub author: Option<String>,
    pub isbn: Option<String>,
    /// Genre id
    pub genre: Option<String>,
    pub description: Option<String>,
    pub publication_year: Option<i64>,
    /// Decimal text, extra fractional digits are truncated
    pub price: Option<String>,
    pub rating: Option<i64>,
    pub in_stock: Option<bool>,
    pub availability: Option<String>,
    pub source_url: Option<String>,
    pub image: Option<String>,
    pub last_scraped: Option<DateTime<Utc>>,
}

async fn validate<R>(repo: &R, input: BookInput, except: Option<&BookId>) -> CatalogResult<BookFields>
where
    R: BookRepository + GenreRepository,
{
    let mut errors = FieldErrors::new();

    let title = errors
        .require("title", input.title.as_deref())
        .filter(|t| check_max_chars(&mut errors, "title", t, TITLE_MAX))
        .map(str::to_string);
    let author = errors
        .require("author", input.author.as_deref())
        .filter(|a| check_max_chars(&mut errors, "author", a, AUTHOR_MAX))
        .map(str::to_string);

    if let (Some(title), Some(author)) = (&title, &author) {
        if repo.book_exists(title, author, except).await? {
            errors.add("title", "A book with this title and author already exists.");
        }
    }

    let isbn = optional_text(input.isbn);
    if let Some(isbn) = &isbn {
        check_max_chars(&mut errors, "isbn", isbn, ISBN_MAX);
    }

    let genre_id = match optional_text(input.genre) {
        Some(raw) => match raw.parse::<GenreId>() {
            Ok(id) => {
                if repo.find_genre(&id).await?.is_none() {
                    errors.add("genre", format!("Invalid pk \"{raw}\" - object does not exist."));
                }
                Some(id)
            }
            Err(_) => {
                errors.add("genre", format!("\"{raw}\" is not a valid UUID."));
                None
            }
        },
        None => None,
    };

    let publication_year = match input.publication_year {
        Some(year) => check(&mut errors, "publication_year", PublicationYear::new(year)),
        None => None,
    };

    let price = match optional_text(input.price) {
        Some(raw) => check(&mut errors, "price", Price::parse(&raw)),
        None => Some(Price::default()),
    };

    let rating = match input.rating {
        Some(r) => check(&mut errors, "rating", Rating::new(r)),
        None => Some(Rating::default()),
    };

    let availability = input.availability.map(|a| a.trim().to_string()).unwrap_or_default();
    check_max_chars(&mut errors, "availability", &availability, AVAILABILITY_MAX);

    let source_url = match optional_text(input.source_url) {
        Some(raw) => check(&mut errors, "source_url", SourceUrl::new(&raw)),
        None => None,
    };

    let image = match optional_text(input.image) {
        Some(raw) => check(&mut errors, "image", MediaPath::new(&raw)),
        None => None,
    };

    errors.into_result()?;

    match (title, author, price, rating) {
        (Some(title), Some(author), Some(price), Some(rating)) => Ok(BookFields {
            title,
            author,
            isbn,
            genre_id,
            description: optional_text(input.description),
            publication_year,
            price,
            rating,
            in_stock: input.in_stock.unwrap_or(true),
            availability,
            source_url,
            image,
            last_scraped: input.last_scraped,
        }),
        _ => Err(CatalogError::Internal("validated book missing fields".into())),
    }
}

pub struct CreateBookUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    repo: Arc<R>,
}

impl<R> CreateBookUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, input: BookInput) -> CatalogResult<Book> {
        let fields = validate(self.repo.as_ref(), input, None).await?;

        let book = Book::new(fields, Utc::now());
        self.repo.create_book(&book).await?;

        tracing::info!(book_id = %book.id, title = %book.title, "Book created");
        Ok(book)
    }
}

pub struct UpdateBookUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    repo: Arc<R>,
}

impl<R> UpdateBookUseCase<R>
where
    R: BookRepository + GenreRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    /// Full replacement of the writable fields
    pub async fn execute(&self, id: &BookId, input: BookInput) -> CatalogResult<Book> {
        let mut book = self
            .repo
            .find_book(id)
            .await?
            .ok_or(CatalogError::BookNotFound)?;

        let fields = validate(self.repo.as_ref(), input, Some(id)).await?;
        book.apply(fields, Utc::now());
        self.repo.update_book(&book).await?;

        tracing::info!(book_id = %book.id, "Book updated");
        Ok(book)
    }
}

pub struct DeleteBookUseCase<R>
where
    R: BookRepository,
{
    repo: Arc<R>,
}

impl<R> DeleteBookUseCase<R>
where
    R: BookRepository,
{
    pub fn new(repo: Arc<R>) -> Self {
        Self { repo }
    }

    pub async fn execute(&self, id: &BookId) -> CatalogResult<()> {
        if !self.repo.delete_book(id).await? {
            return Err(CatalogError::BookNotFound);
        }
        tracing::info!(book_id = %id, "Book deleted");
        Ok(())
    }
}
