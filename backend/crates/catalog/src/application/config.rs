//! Application Configuration
//!
//! Configuration for the Catalog application layer.

use std::path::PathBuf;

/// Catalog application configuration
#[derive(Debug, Clone)]
pub struct CatalogConfig {
    /// Directory book images are stored under
    pub media_root: PathBuf,
    /// URL prefix the media root is served from
    pub media_url: String,
    /// Origin used for absolute URLs when the request carries no Host
    pub public_base_url: String,
    /// Page size when the client sends none
    pub default_page_size: u32,
    /// Upper bound on client page sizes
    pub max_page_size: u32,
    /// Number of same-genre books shown with a book
    pub similar_books_limit: u32,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            media_root: PathBuf::from("media"),
            media_url: "/media/".to_string(),
            public_base_url: "http://localhost:8000".to_string(),
            default_page_size: 12,
            max_page_size: 100,
            similar_books_limit: 3,
        }
    }
}

impl CatalogConfig {
    /// Create config for development (media next to the working directory)
    pub fn development() -> Self {
        Self::default()
    }

    /// Public URL of a stored media file
    pub fn media_url_for(&self, path: &str) -> String {
        format!("{}/{}", self.media_url.trim_end_matches('/'), path)
    }
}
