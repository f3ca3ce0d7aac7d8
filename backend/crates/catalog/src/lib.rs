//! Catalog Backend Module
//!
//! Clean Architecture structure:
//! - `domain/` - Entities, value objects, formatting rules, repository traits
//! - `application/` - Browse and write use cases
//! - `infra/` - Database implementations and media file access
//! - `presentation/` - HTTP handlers, DTOs, projections, routers
//!
//! ## Features
//! - Book listing with title/author/genre/year/stock filters and pagination
//! - Book detail with live genre counts, star ratings, currency display,
//!   image metadata and same-genre recommendations
//! - Genres with live book counts
//! - Scraping run log with derived durations
//! - Staff writes for genres, books and scraping runs
//! - Per-user favorite books

pub mod application;
pub mod domain;
pub mod error;
pub mod infra;
pub mod presentation;

// Re-exports for convenience
pub use application::config::CatalogConfig;
pub use error::{CatalogError, CatalogResult};
pub use infra::postgres::PgCatalogRepository;
pub use presentation::router::{
    catalog_admin_router, catalog_admin_router_generic, catalog_router, catalog_router_generic,
    favorites_router, favorites_router_generic,
};

#[cfg(test)]
mod tests;
