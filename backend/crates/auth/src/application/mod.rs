//! Application Layer
//!
//! Use cases and application services.

pub mod config;
pub mod current_user;
pub mod login;
pub mod password_reset;
pub mod refresh_token;
pub mod register;
pub mod tokens;
pub mod update_profile;

// Re-exports
pub use config::AuthConfig;
pub use current_user::CurrentUserUseCase;
pub use login::{LoginInput, LoginOutput, LoginUseCase};
pub use password_reset::{
    ConfirmPasswordResetInput, ConfirmPasswordResetUseCase, RequestPasswordResetUseCase,
};
pub use refresh_token::RefreshTokenUseCase;
pub use register::{RegisterInput, RegisterUseCase};
pub use tokens::{Claims, JwtService, TokenPair, TokenType};
pub use update_profile::{UpdateProfileInput, UpdateProfileUseCase};
