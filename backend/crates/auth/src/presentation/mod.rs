//! Presentation Layer
//!
//! HTTP handlers, DTOs, router, and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod router;

pub use handlers::AuthAppState;
pub use middleware::{AccessGuard, AuthenticatedUser, require_access_token, require_staff};
pub use router::{auth_router, auth_router_generic};
