//! Application Layer
//!
//! Use cases and application services.

pub mod browse_books;
pub mod browse_genres;
pub mod config;
pub mod favorites;
pub mod manage_books;
pub mod manage_genres;
pub mod scraping_runs;
pub mod validation;

// Re-exports
pub use browse_books::{
    BookDetailOutput, BookDetailUseCase, ListBooksOutput, ListBooksUseCase,
    RecommendedBooksUseCase,
};
pub use browse_genres::{GetGenreUseCase, ListGenresUseCase};
pub use config::CatalogConfig;
pub use favorites::{
    AddFavoriteOutput, AddFavoriteUseCase, FavoritesOutput, ListFavoritesUseCase,
    RemoveFavoriteUseCase,
};
pub use manage_books::{BookInput, CreateBookUseCase, DeleteBookUseCase, UpdateBookUseCase};
pub use manage_genres::{CreateGenreUseCase, DeleteGenreUseCase, GenreInput, UpdateGenreUseCase};
pub use scraping_runs::{
    FinishRunInput, FinishScrapingRunUseCase, GetScrapingRunUseCase, ListScrapingRunsUseCase,
    RecordRunProgressUseCase, RunCountsInput, StartScrapingRunUseCase,
};
