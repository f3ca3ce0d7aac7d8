//! Domain Layer - Business logic and entities
//!
//! This layer contains:
//! - Domain entities (Genre, Book, ScrapingLog)
//! - Domain value objects (Price, Rating, PublicationYear, ScrapingStatus, ...)
//! - Domain services (duration and file size formatting)
//! - Repository traits (interfaces)

pub mod entities;
pub mod repository;
pub mod services;
pub mod value_objects;

pub use entities::{Book, BookFields, Genre, GenreWithCount, RunCounts, ScrapingLog};
pub use repository::{
    BookFilter, BookRepository, CatalogRepository, FavoriteRepository, GenreFilter,
    GenreRepository, ScrapingLogRepository,
};
pub use value_objects::{Price, Rating, ScrapingStatus};
