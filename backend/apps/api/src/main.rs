//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

mod config;

use auth::{AccessGuard, AuthConfig, PgAuthRepository, auth_router, require_access_token, require_staff};
use axum::{
    Router, ServiceExt, extract::Request, http,
    http::{Method, header},
    middleware,
};
use catalog::{
    CatalogConfig, PgCatalogRepository, catalog_admin_router, catalog_router, favorites_router,
};
use platform::mail::{LogMailer, Mailer, SmtpMailer};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower::{Layer, ServiceBuilder};
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::normalize_path::{NormalizePath, NormalizePathLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::ServerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "bookstore_api=info,auth=info,catalog=info,tower_http=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env()?;

    // Database connection
    let pool = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect(&config.database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../../database/migrations")
        .run(&pool)
        .await?;

    tracing::info!("Migrations completed");

    let cors = cors_layer(&config.frontend_origins);

    // Mail delivery: SMTP when configured, otherwise the log
    let app = match config.smtp {
        Some(settings) => {
            tracing::info!(host = %settings.host, "Password reset mail via SMTP");
            let mailer = SmtpMailer::new(settings)?;
            build_router(&pool, mailer, config.auth, config.catalog)
        }
        None => {
            tracing::warn!("SMTP_HOST not set, password reset mail goes to the log only");
            build_router(&pool, LogMailer, config.auth, config.catalog)
        }
    }
    .layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    );

    let app = trim_trailing_slash(app);

    // Start server
    tracing::info!("Listening on {}", config.bind_addr);

    let listener = TcpListener::bind(config.bind_addr).await?;
    axum::serve(
        listener,
        ServiceExt::<Request>::into_make_service_with_connect_info::<SocketAddr>(app),
    )
    .await?;

    Ok(())
}

/// Compose the auth and catalog routers
///
/// Catalog writes sit under `/scraping/admin` behind a staff access token;
/// favorites sit next to the auth routes under `/api` behind any access token.
fn build_router<M>(
    pool: &PgPool,
    mailer: M,
    auth_config: AuthConfig,
    catalog_config: CatalogConfig,
) -> Router
where
    M: Mailer + Clone + Send + Sync + 'static,
{
    tracing::info!(
        media_root = %catalog_config.media_root.display(),
        media_url = %catalog_config.media_url,
        "Catalog media"
    );

    let auth_repo = PgAuthRepository::new(pool.clone());
    let guard = AccessGuard::new(&auth_config, auth_repo.clone());

    let catalog_repo = PgCatalogRepository::new(pool.clone());
    let admin = catalog_admin_router(catalog_repo.clone(), catalog_config.clone())
        .route_layer(middleware::from_fn(require_staff))
        .route_layer(middleware::from_fn_with_state(
            guard.clone(),
            require_access_token::<PgAuthRepository>,
        ));
    let favorites = favorites_router(catalog_repo.clone(), catalog_config.clone()).route_layer(
        middleware::from_fn_with_state(guard, require_access_token::<PgAuthRepository>),
    );

    Router::new()
        .nest(
            "/api",
            auth_router(auth_repo, mailer, auth_config).merge(favorites),
        )
        .nest("/scraping/admin", admin)
        .nest("/scraping", catalog_router(catalog_repo, catalog_config))
}

/// `/api/login/` and `/api/login` reach the same route
///
/// Wraps the whole router so the path is rewritten before routing.
fn trim_trailing_slash(router: Router) -> NormalizePath<Router> {
    NormalizePathLayer::trim_trailing_slash().layer(router)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed_origins: Vec<http::HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "Ignoring invalid CORS origin");
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true)
}
