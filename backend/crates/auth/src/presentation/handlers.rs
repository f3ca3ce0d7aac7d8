//! HTTP Handlers

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use std::sync::Arc;

use platform::mail::Mailer;

use crate::application::config::AuthConfig;
use crate::application::{
    ConfirmPasswordResetInput, ConfirmPasswordResetUseCase, CurrentUserUseCase, JwtService,
    LoginInput, LoginUseCase, RefreshTokenUseCase, RegisterInput, RegisterUseCase,
    RequestPasswordResetUseCase, UpdateProfileInput, UpdateProfileUseCase,
};
use crate::domain::repository::UserRepository;
use crate::error::AuthResult;
use crate::presentation::dto::{
    DetailResponse, LoginRequest, LoginResponse, PasswordResetConfirmRequest,
    PasswordResetRequest, ProfileRequest, RefreshRequest, RefreshResponse, RegisterRequest,
    UserResponse, UserSummary,
};
use crate::presentation::middleware::{AccessGuard, AuthenticatedUser};
use kernel::error::field_errors::FieldErrors;

/// Shared state for auth handlers
#[derive(Clone)]
pub struct AuthAppState<R, M>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    pub repo: Arc<R>,
    pub mailer: Arc<M>,
    pub config: Arc<AuthConfig>,
    pub tokens: Arc<JwtService>,
}

impl<R, M> AuthAppState<R, M>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    pub fn new(repo: R, mailer: M, config: AuthConfig) -> Self {
        let tokens = Arc::new(JwtService::new(&config));
        Self {
            repo: Arc::new(repo),
            mailer: Arc::new(mailer),
            config: Arc::new(config),
            tokens,
        }
    }

    /// Guard sharing this state's signing keys
    pub fn access_guard(&self) -> AccessGuard<R> {
        AccessGuard::from_parts(self.tokens.clone(), self.repo.clone())
    }
}

// ============================================================================
// Register
// ============================================================================

/// POST /api/register
pub async fn register<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RegisterRequest>,
) -> AuthResult<(StatusCode, Json<UserResponse>)>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = RegisterUseCase::new(state.repo.clone(), state.config.clone());

    let user = use_case
        .execute(RegisterInput {
            user_name: req.username,
            email: req.email,
            password: req.password,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(UserResponse::from(&user))))
}

// ============================================================================
// Login
// ============================================================================

/// POST /api/login
pub async fn login<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<LoginRequest>,
) -> AuthResult<Json<LoginResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = LoginUseCase::new(
        state.repo.clone(),
        state.tokens.clone(),
        state.config.clone(),
    );

    let output = use_case
        .execute(LoginInput {
            identifier: req.identifier(),
            password: req.password,
        })
        .await?;

    Ok(Json(LoginResponse {
        access: output.tokens.access,
        refresh: output.tokens.refresh,
        user: UserSummary::from(&output.user),
    }))
}

// ============================================================================
// Token refresh
// ============================================================================

/// POST /api/token/refresh
pub async fn refresh_token<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<RefreshRequest>,
) -> AuthResult<Json<RefreshResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let mut errors = FieldErrors::new();
    let Some(refresh) = errors.require("refresh", req.refresh.as_deref()) else {
        return Err(errors.into());
    };

    let use_case = RefreshTokenUseCase::new(state.repo.clone(), state.tokens.clone());
    let access = use_case.execute(refresh).await?;

    Ok(Json(RefreshResponse { access }))
}

// ============================================================================
// Current user
// ============================================================================

/// GET /api/user and GET /api/profile (behind `require_access_token`)
pub async fn current_user<R, M>(
    State(state): State<AuthAppState<R, M>>,
    auth: AuthenticatedUser,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = CurrentUserUseCase::new(state.repo.clone());
    let user = use_case.execute(&auth.user_id).await?;

    Ok(Json(UserResponse::from(&user)))
}

/// PUT /api/profile (behind `require_access_token`)
pub async fn update_profile<R, M>(
    State(state): State<AuthAppState<R, M>>,
    auth: AuthenticatedUser,
    Json(req): Json<ProfileRequest>,
) -> AuthResult<Json<UserResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = UpdateProfileUseCase::new(state.repo.clone());
    let user = use_case
        .execute(
            &auth.user_id,
            UpdateProfileInput {
                user_name: req.username,
                email: req.email,
            },
        )
        .await?;

    Ok(Json(UserResponse::from(&user)))
}

// ============================================================================
// Password reset
// ============================================================================

/// POST /api/password-reset
pub async fn request_password_reset<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Json(req): Json<PasswordResetRequest>,
) -> AuthResult<Json<DetailResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = RequestPasswordResetUseCase::new(
        state.repo.clone(),
        state.mailer.clone(),
        state.config.clone(),
    );
    use_case.execute(req.email).await?;

    Ok(Json(DetailResponse::new(
        "Password reset link has been sent to your email.",
    )))
}

/// POST /api/password-reset/confirm/{uid}/{token}
pub async fn confirm_password_reset<R, M>(
    State(state): State<AuthAppState<R, M>>,
    Path((uid, token)): Path<(String, String)>,
    Json(req): Json<PasswordResetConfirmRequest>,
) -> AuthResult<Json<DetailResponse>>
where
    R: UserRepository + Clone + Send + Sync + 'static,
    M: Mailer + Clone + Send + Sync + 'static,
{
    let use_case = ConfirmPasswordResetUseCase::new(state.repo.clone(), state.config.clone());
    use_case
        .execute(ConfirmPasswordResetInput {
            uid,
            token,
            password: req.password,
        })
        .await?;

    Ok(Json(DetailResponse::new("Password has been reset successfully.")))
}
