//! HTTP API.
//!
//! Exposes the drive operations over JSON and multipart endpoints:
//! `/`, `/uploadSingle`, `/upload`, `/retrieve`, `/virtualDirectory`,
//! `/delete`, plus `/health`.

pub mod dto;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod server;

pub use error::ApiError;
pub use handlers::AppState;
pub use router::{create_health_router, create_router};
pub use server::WebServer;
