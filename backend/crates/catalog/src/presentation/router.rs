//! Catalog Routers
//!
//! The public router serves reads. The admin router carries the writes and
//! the favorites router the per-user shelf; neither has access control of
//! its own. The binary layers the staff guard on the admin router and the
//! bearer guard, which supplies the caller's `UserId`, on favorites.

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::application::config::CatalogConfig;
use crate::domain::repository::CatalogRepository;
use crate::infra::postgres::PgCatalogRepository;
use crate::presentation::handlers::{self, CatalogAppState};

/// Create the read-only catalog router with PostgreSQL repository
pub fn catalog_router(repo: PgCatalogRepository, config: CatalogConfig) -> Router {
    catalog_router_generic(repo, config)
}

/// Create the read-only catalog router for any repository implementation
pub fn catalog_router_generic<R>(repo: R, config: CatalogConfig) -> Router
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let state = CatalogAppState::new(repo, config);

    Router::new()
        .route("/books", get(handlers::list_books::<R>))
        // Path used by the storefront's listing page
        .route("/book_list", get(handlers::list_books::<R>))
        .route("/books/{id}", get(handlers::book_detail::<R>))
        .route(
            "/books/{id}/recommended",
            get(handlers::recommended_books::<R>),
        )
        .route("/genres", get(handlers::list_genres::<R>))
        .route("/genres/{id}", get(handlers::genre_detail::<R>))
        .route("/logs", get(handlers::list_scraping_logs::<R>))
        .route("/logs/{id}", get(handlers::scraping_log_detail::<R>))
        .with_state(state)
}

/// Create the catalog write router with PostgreSQL repository
pub fn catalog_admin_router(repo: PgCatalogRepository, config: CatalogConfig) -> Router {
    catalog_admin_router_generic(repo, config)
}

/// Create the catalog write router for any repository implementation
pub fn catalog_admin_router_generic<R>(repo: R, config: CatalogConfig) -> Router
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let state = CatalogAppState::new(repo, config);

    Router::new()
        .route("/genres", post(handlers::create_genre::<R>))
        .route(
            "/genres/{id}",
            put(handlers::update_genre::<R>).delete(handlers::delete_genre::<R>),
        )
        .route("/books", post(handlers::create_book::<R>))
        .route(
            "/books/{id}",
            put(handlers::update_book::<R>).delete(handlers::delete_book::<R>),
        )
        .route("/logs", post(handlers::start_scraping_run::<R>))
        .route(
            "/logs/{id}/progress",
            put(handlers::record_scraping_progress::<R>),
        )
        .route(
            "/logs/{id}/finish",
            post(handlers::finish_scraping_run::<R>),
        )
        .with_state(state)
}

/// Create the favorites router with PostgreSQL repository
pub fn favorites_router(repo: PgCatalogRepository, config: CatalogConfig) -> Router {
    favorites_router_generic(repo, config)
}

/// Create the favorites router for any repository implementation
///
/// Requests must carry a `UserId` extension.
pub fn favorites_router_generic<R>(repo: R, config: CatalogConfig) -> Router
where
    R: CatalogRepository + Clone + Send + Sync + 'static,
{
    let state = CatalogAppState::new(repo, config);

    Router::new()
        .route("/favorites", get(handlers::list_favorites::<R>))
        .route(
            "/favorites/{id}",
            post(handlers::add_favorite::<R>).delete(handlers::remove_favorite::<R>),
        )
        .with_state(state)
}
