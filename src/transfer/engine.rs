//! Transfer engine: chunked upload with bounded retry, ordered download.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use bytes::{Bytes, BytesMut};
use thiserror::Error;

use super::planner::{chunk_stem, extension_of, plan_chunks, ChunkLimits};
use super::rotator::DestinationRotator;
use crate::backend::{BackendError, LocatorBackend};
use crate::datetime::unique_datetime_label;

/// Base name of every reassembled artifact.
pub const COMBINED_FILE_NAME: &str = "combinedFile";

/// Settings the engine is built with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferSettings {
    /// Chunking limits in bytes.
    pub limits: ChunkLimits,
    /// Send attempts per chunk (at least 1).
    pub attempts: u32,
    /// Constant delay between attempts on the same chunk.
    pub backoff: Duration,
}

/// Terminal failure of an upload or download.
#[derive(Error, Debug)]
pub enum TransferFailure {
    /// A chunk could not be sent. Earlier chunks stay in the backend.
    #[error("upload of chunk {index} ({name}) failed after {attempts} attempt(s): {source}")]
    Upload {
        /// Index of the failing chunk.
        index: usize,
        /// Name of the failing chunk.
        name: String,
        /// Attempts made before giving up.
        attempts: u32,
        /// Last backend error.
        #[source]
        source: BackendError,
    },

    /// A chunk could not be fetched.
    #[error("download of chunk {position} from {locator} failed: {source}")]
    Download {
        /// Position of the locator in the link list.
        position: usize,
        /// Locator that failed.
        locator: String,
        /// Backend error.
        #[source]
        source: BackendError,
    },
}

/// A reassembled file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadedFile {
    /// `combinedFile` plus the extension embedded in the first chunk name.
    pub name: String,
    /// Concatenated chunk bytes.
    pub bytes: Bytes,
}

impl DownloadedFile {
    /// Extension of the artifact name including the dot, or an empty string.
    pub fn extension(&self) -> String {
        extension_of(&self.name)
    }
}

/// Splits files into chunks, spreads them across destinations and puts them back together.
pub struct TransferEngine {
    backend: Arc<dyn LocatorBackend>,
    rotator: Arc<DestinationRotator>,
    settings: TransferSettings,
}

impl TransferEngine {
    /// Create an engine over the given backend and rotator.
    pub fn new(
        backend: Arc<dyn LocatorBackend>,
        rotator: Arc<DestinationRotator>,
        settings: TransferSettings,
    ) -> Self {
        Self {
            backend,
            rotator,
            settings,
        }
    }

    /// The settings this engine was built with.
    pub fn settings(&self) -> &TransferSettings {
        &self.settings
    }

    /// Upload a file and return its locators in chunk order.
    ///
    /// Chunks go up strictly one after another. Each chunk gets the next
    /// destination from the rotator and up to `attempts` tries with a
    /// constant `backoff` between them. If a chunk runs out of attempts the
    /// whole upload fails; chunks already sent are not deleted.
    pub async fn upload(&self, data: Bytes, extension: &str) -> Result<Vec<String>, TransferFailure> {
        let label = unique_datetime_label();
        let chunks = plan_chunks(data.len(), self.settings.limits, &label, extension);

        tracing::debug!(
            size = data.len(),
            chunks = chunks.len(),
            backend = self.backend.name(),
            "Beginning file upload"
        );

        let mut locators = Vec::with_capacity(chunks.len());
        for chunk in &chunks {
            let destination = self.rotator.next();
            let payload = data.slice(chunk.range.clone());

            let locator = self
                .send_with_retry(destination, payload, &chunk.name)
                .await
                .map_err(|(attempts, source)| TransferFailure::Upload {
                    index: chunk.index,
                    name: chunk.name.clone(),
                    attempts,
                    source,
                })?;

            tracing::info!(chunk = %chunk.name, destination, "Uploaded chunk");
            locators.push(locator);
        }

        tracing::debug!(chunks = locators.len(), "File upload complete");
        Ok(locators)
    }

    /// Upload a file, taking the extension from its original name.
    pub async fn upload_named(&self, data: Bytes, original_name: &str) -> Result<Vec<String>, TransferFailure> {
        self.upload(data, &extension_of(original_name)).await
    }

    /// Returns the locator, or the number of attempts made and the last error.
    async fn send_with_retry(
        &self,
        destination: &str,
        payload: Bytes,
        name: &str,
    ) -> Result<String, (u32, BackendError)> {
        let attempts = self.settings.attempts.max(1);
        let mut attempt = 1;
        loop {
            match self.backend.send(destination, payload.clone(), name).await {
                Ok(locator) => return Ok(locator),
                Err(e) if attempt < attempts && e.is_retryable() => {
                    tracing::warn!(
                        chunk = name,
                        attempt,
                        error = %e,
                        "Could not upload chunk, retrying"
                    );
                    tokio::time::sleep(self.settings.backoff).await;
                    attempt += 1;
                }
                Err(e) => {
                    tracing::error!(chunk = name, attempt, error = %e, "Giving up on chunk");
                    return Err((attempt, e));
                }
            }
        }
    }

    /// Fetch every locator in the given order and concatenate the chunks.
    ///
    /// There is no retry here: the first failed fetch fails the download.
    /// Nothing is checked against the recorded file size.
    pub async fn download(&self, locators: &[String]) -> Result<DownloadedFile, TransferFailure> {
        tracing::debug!(chunks = locators.len(), "Beginning file retrieval");

        let mut buffer = BytesMut::new();
        let mut first_name: Option<String> = None;

        for (position, locator) in locators.iter().enumerate() {
            let attachment =
                self.backend
                    .fetch(locator)
                    .await
                    .map_err(|source| TransferFailure::Download {
                        position,
                        locator: locator.clone(),
                        source,
                    })?;

            buffer.extend_from_slice(&attachment.data);
            if first_name.is_none() {
                first_name = Some(attachment.name);
            }
        }

        let name = combined_name(first_name.as_deref());
        tracing::debug!(size = buffer.len(), name = %name, "File retrieval complete");

        Ok(DownloadedFile {
            name,
            bytes: buffer.freeze(),
        })
    }
}

/// Name for a reassembled file, given the name of its first chunk.
fn combined_name(first_chunk: Option<&str>) -> String {
    let Some(chunk) = first_chunk else {
        return COMBINED_FILE_NAME.to_string();
    };

    let stem = chunk_stem(chunk).unwrap_or(chunk);
    match Path::new(stem).extension().and_then(|e| e.to_str()) {
        Some(ext) => format!("{COMBINED_FILE_NAME}.{ext}"),
        None => COMBINED_FILE_NAME.to_string(),
    }
}
