//! Domain Layer
//!
//! Contains entities, value objects, repository traits and domain services.

pub mod entity;
pub mod repository;
pub mod services;
pub mod value_object;

// Re-exports
pub use entity::user::User;
pub use repository::UserRepository;
pub use services::PasswordResetTokens;
