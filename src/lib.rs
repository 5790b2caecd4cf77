//! dspace - chunked blob storage on chat attachment channels.
//!
//! Files are split into chunks, each posted as an attachment to one of a set
//! of channels, and tracked in a virtual directory tree that maps paths to
//! the ordered chunk locators.

pub mod archive;
pub mod backend;
pub mod config;
pub mod datetime;
pub mod error;
pub mod logging;
pub mod service;
pub mod transfer;
pub mod vdir;
pub mod web;

pub use backend::{BackendError, DiscordBackend, LocatorBackend, MemoryBackend};
pub use config::Config;
pub use error::{DspaceError, Result};
pub use service::{DriveService, RetrievedArtifact, RetrievedFile, UploadedFile};
pub use transfer::{DestinationRotator, TransferEngine, TransferFailure, TransferSettings};
pub use vdir::{JsonTreeStore, MemoryTreeStore, Record, RecordKind, TreeStore};
pub use web::WebServer;
