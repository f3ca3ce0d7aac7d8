//! Auth Router

use axum::{
    Router, middleware,
    routing::{get, post},
};

use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::domain::repository::UserRepository;
use crate::infra::postgres::PgAuthRepository;
use crate::presentation::handlers::{self, AuthAppState};
use crate::presentation::middleware::require_access_token;

/// Create the Auth router with PostgreSQL repository
pub fn auth_router<M>(repo: PgAuthRepository, mailer: M, config: AuthConfig) -> Router
where
    M: Mailer + Clone + Send + Sync + 'static,
{
    auth_router_generic(repo, mailer, config)
}

/// Create a generic Auth router for any repository implementation
pub fn auth_router_generic<R, M>(repo: R, mailer: M, config: AuthConfig) -> Router
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let state = AuthAppState::new(repo, mailer, config);

    let protected = Router::new()
        .route("/user", get(handlers::current_user::<R, M>))
        .route(
            "/profile",
            get(handlers::current_user::<R, M>).put(handlers::update_profile::<R, M>),
        )
        .route_layer(middleware::from_fn_with_state(
            state.access_guard(),
            require_access_token::<R>,
        ));

    Router::new()
        .route("/register", post(handlers::register::<R, M>))
        .route("/login", post(handlers::login::<R, M>))
        .route("/token/refresh", post(handlers::refresh_token::<R, M>))
        .route(
            "/password-reset",
            post(handlers::request_password_reset::<R, M>),
        )
        .route(
            "/password-reset/confirm/{uid}/{token}",
            post(handlers::confirm_password_reset::<R, M>),
        )
        .merge(protected)
        .with_state(state)
}
