//! API handlers.

pub mod drive;

pub use drive::*;

use crate::service::DriveService;

/// Shared state of the API handlers.
pub struct AppState {
    /// Drive operations.
    pub service: DriveService,
}

impl AppState {
    /// Create the handler state.
    pub fn new(service: DriveService) -> Self {
        Self { service }
    }
}
