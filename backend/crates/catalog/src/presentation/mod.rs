//! Presentation Layer
//!
//! HTTP handlers, DTOs, response projections, and routers.

pub mod dto;
pub mod handlers;
pub mod projection;
pub mod router;

pub use handlers::CatalogAppState;
pub use router::{
    catalog_admin_router, catalog_admin_router_generic, catalog_router, catalog_router_generic,
    favorites_router, favorites_router_generic,
};
