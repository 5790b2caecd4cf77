//! In-memory locator backend.
//!
//! Used by tests and for local runs without a chat account. Supports
//! failure injection so retry behaviour can be exercised deterministically.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use bytes::Bytes;

use super::{Attachment, BackendError, LocatorBackend};

/// Record of one successful send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentBlob {
    /// Destination the blob was sent to.
    pub destination: String,
    /// Blob name.
    pub name: String,
    /// Blob size in bytes.
    pub size: usize,
    /// Locator handed back for the blob.
    pub locator: String,
}

#[derive(Debug, Default)]
struct MemoryState {
    blobs: HashMap<String, Attachment>,
    sent: Vec<SentBlob>,
    send_calls: usize,
    fail_sends: usize,
    fail_send_status: Option<u16>,
    fail_fetches: usize,
    next_sequence: u64,
}

/// Backend that keeps every blob in process memory.
///
/// Locators have the form `memory://{destination}/{sequence}`.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    state: Mutex<MemoryState>,
    max_size: Option<usize>,
}

impl MemoryBackend {
    /// Create an empty backend without a size ceiling.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend that rejects blobs larger than `max_size`.
    pub fn with_max_size(max_size: usize) -> Self {
        Self {
            state: Mutex::default(),
            max_size: Some(max_size),
        }
    }

    /// Make the next `count` send calls fail with a transient error.
    pub fn fail_next_sends(&self, count: usize) {
        let mut state = self.lock();
        state.fail_sends = count;
        state.fail_send_status = None;
    }

    /// Make the next `count` send calls fail with an HTTP `status` error.
    pub fn fail_next_sends_with_status(&self, count: usize, status: u16) {
        let mut state = self.lock();
        state.fail_sends = count;
        state.fail_send_status = Some(status);
    }

    /// Make the next `count` fetch calls fail with a transient error.
    pub fn fail_next_fetches(&self, count: usize) {
        self.lock().fail_fetches = count;
    }

    /// Successful sends, in call order.
    pub fn sent(&self) -> Vec<SentBlob> {
        self.lock().sent.clone()
    }

    /// Number of send calls, including failed ones.
    pub fn send_calls(&self) -> usize {
        self.lock().send_calls
    }

    /// Number of blobs currently stored.
    pub fn len(&self) -> usize {
        self.lock().blobs.len()
    }

    /// Returns true if nothing is stored.
    pub fn is_empty(&self) -> bool {
        self.lock().blobs.is_empty()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        // A poisoned lock only means a test panicked mid-call; the map is still usable.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl LocatorBackend for MemoryBackend {
    fn name(&self) -> &str {
        "memory"
    }

    async fn send(
        &self,
        destination: &str,
        data: Bytes,
        name: &str,
    ) -> Result<String, BackendError> {
        let mut state = self.lock();
        state.send_calls += 1;

        if state.fail_sends > 0 {
            state.fail_sends -= 1;
            let message = format!("injected send failure for {name}");
            return Err(match state.fail_send_status {
                Some(status) => BackendError::Status {
                    status,
                    body: message,
                },
                None => BackendError::Unavailable(message),
            });
        }

        if let Some(max) = self.max_size {
            if data.len() > max {
                return Err(BackendError::TooLarge {
                    size: data.len(),
                    max,
                });
            }
        }

        let locator = format!("memory://{destination}/{}", state.next_sequence);
        state.next_sequence += 1;

        state.sent.push(SentBlob {
            destination: destination.to_string(),
            name: name.to_string(),
            size: data.len(),
            locator: locator.clone(),
        });
        state.blobs.insert(
            locator.clone(),
            Attachment {
                name: name.to_string(),
                data,
            },
        );

        Ok(locator)
    }

    async fn fetch(&self, locator: &str) -> Result<Attachment, BackendError> {
        let mut state = self.lock();

        if state.fail_fetches > 0 {
            state.fail_fetches -= 1;
            return Err(BackendError::Unavailable(format!(
                "injected fetch failure for {locator}"
            )));
        }

        if !locator.starts_with("memory://") {
            return Err(BackendError::InvalidLocator(locator.to_string()));
        }

        state
            .blobs
            .get(locator)
            .cloned()
            .ok_or_else(|| BackendError::NotFound(locator.to_string()))
    }
}
