//! Locator backends.
//!
//! A backend stores a named byte blob at a destination and hands back an
//! opaque locator string; the same locator later resolves back to the blob.
//! The transfer engine only talks to this trait:
//! - [`discord::DiscordBackend`] posts blobs as message attachments
//! - [`memory::MemoryBackend`] keeps blobs in process memory

pub mod discord;
pub mod memory;

use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

pub use discord::{DiscordBackend, DiscordLocator};
pub use memory::{MemoryBackend, SentBlob};

/// A named blob resolved from a locator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Name the blob was sent under.
    pub name: String,
    /// Blob content.
    pub data: Bytes,
}

/// Errors reported by a backend.
#[derive(Error, Debug)]
pub enum BackendError {
    /// The HTTP request itself failed (connect, timeout, body read).
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The backend answered with a non-success status.
    #[error("unexpected status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, possibly truncated.
        body: String,
    },

    /// The backend asked us to slow down.
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited {
        /// Delay suggested by the backend, if any.
        retry_after: Option<Duration>,
    },

    /// The locator string could not be parsed.
    #[error("invalid locator: {0}")]
    InvalidLocator(String),

    /// The locator resolved to a message without an attachment.
    #[error("no attachment found at {0}")]
    MissingAttachment(String),

    /// The locator is well formed but nothing is stored there.
    #[error("nothing stored at {0}")]
    NotFound(String),

    /// The blob exceeds the backend's size ceiling.
    #[error("blob too large: {size} bytes (max {max})")]
    TooLarge {
        /// Blob size in bytes.
        size: usize,
        /// Backend ceiling in bytes.
        max: usize,
    },

    /// The backend is temporarily unavailable.
    #[error("backend unavailable: {0}")]
    Unavailable(String),

    /// The backend answered with a body we could not decode.
    #[error("malformed response: {0}")]
    Decode(String),
}

impl BackendError {
    /// Returns true if sending the same blob again may succeed.
    ///
    /// Only an oversized blob is rejected for good; every other failure is
    /// worth another attempt.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TooLarge { .. })
    }
}

/// Capability to store and resolve named blobs.
#[async_trait]
pub trait LocatorBackend: Send + Sync {
    /// Returns the backend name, for logs.
    fn name(&self) -> &str;

    /// Stores `data` as a blob called `name` at `destination`.
    ///
    /// Returns a locator that [`fetch`](Self::fetch) can resolve.
    async fn send(&self, destination: &str, data: Bytes, name: &str)
        -> Result<String, BackendError>;

    /// Resolves a locator back to the named blob.
    async fn fetch(&self, locator: &str) -> Result<Attachment, BackendError>;
}
