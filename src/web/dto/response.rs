//! Response DTOs for Web API.
//!
//! Every body carries `message` and `success` next to its payload.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde::Serialize;

use crate::service::RetrievedArtifact;
use crate::vdir::Record;

/// Plain acknowledgement.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
    pub success: bool,
}

impl MessageResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            success: true,
        }
    }
}

/// The whole virtual directory.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeResponse {
    pub message: String,
    pub success: bool,
    pub virtual_directory: Record,
}

impl TreeResponse {
    pub fn ok(message: impl Into<String>, tree: Record) -> Self {
        Self {
            message: message.into(),
            success: true,
            virtual_directory: tree,
        }
    }
}

/// Result of an upload.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    pub message: String,
    pub success: bool,
    /// Elapsed time, `HH:MM:SS.mmm`.
    pub upload_time: String,
    pub virtual_directory: Record,
}

/// A retrieved file, base64 encoded.
#[derive(Debug, Serialize)]
pub struct FileObject {
    pub name: String,
    pub extension: String,
    pub buffer: String,
}

impl From<RetrievedArtifact> for FileObject {
    fn from(artifact: RetrievedArtifact) -> Self {
        Self {
            name: artifact.name,
            extension: artifact.extension,
            buffer: STANDARD.encode(&artifact.bytes),
        }
    }
}

/// Result of a retrieval.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RetrieveResponse {
    pub message: String,
    pub success: bool,
    /// Elapsed time, `HH:MM:SS.mmm`.
    pub retrieval_time: String,
    pub file: FileObject,
}
