//! Shared Kernel - Domain-crossing minimal core
//!
//! This crate contains the "smallest core" of domain vocabulary:
//! - Common error types and result aliases
//! - Field-keyed validation errors
//! - Typed ID wrappers for users and catalog entities
//! - Pagination primitives shared by list endpoints
//!
//! **Design Principle**: Only include things that are "hard to change"
//! and have consistent meaning across all domains.

pub mod error {
    pub mod app_error;
    pub mod conversions;
    pub mod field_errors;
    pub mod kind;
}
pub mod id;
pub mod pagination;
