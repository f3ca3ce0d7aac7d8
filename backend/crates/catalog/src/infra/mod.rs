//! Infrastructure Layer
//!
//! PostgreSQL repositories and media file access.

pub mod media;
pub mod postgres;

pub use media::MediaStorage;
pub use postgres::PgCatalogRepository;
