//! Drive handlers: upload, retrieve, browse, delete.

use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Multipart, State};
use axum::Json;

use super::AppState;
use crate::datetime::format_elapsed;
use crate::service::UploadedFile;
use crate::vdir::Record;
use crate::web::dto::{
    FileObject, IdentifierRequest, MessageResponse, RetrieveResponse, TreeResponse, UploadResponse,
};
use crate::web::error::ApiError;

/// GET / - Liveness greeting.
pub async fn hello() -> Json<MessageResponse> {
    tracing::debug!("Root endpoint hit");
    Json(MessageResponse::ok("Hello"))
}

/// A multipart field read fully into memory.
enum FormValue {
    File(UploadedFile),
    Text(String),
}

/// Read every field of a multipart body. File fields are the ones with a
/// file name; everything else is read as text.
async fn read_form(mut multipart: Multipart) -> Result<Vec<(String, FormValue)>, ApiError> {
    let mut fields = Vec::new();

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        tracing::error!("Failed to read multipart field: {}", e);
        ApiError::bad_request("Invalid multipart data").with_detail(e.to_string())
    })? {
        let name = field.name().unwrap_or("").to_string();
        let value = match field.file_name().map(|s| s.to_string()) {
            Some(file_name) => {
                let data = field.bytes().await.map_err(|e| {
                    tracing::error!("Failed to read file content: {}", e);
                    ApiError::bad_request("Failed to read file").with_detail(e.to_string())
                })?;
                FormValue::File(UploadedFile {
                    name: file_name,
                    data,
                })
            }
            None => FormValue::Text(field.text().await.map_err(|e| {
                tracing::error!("Failed to read form field {}: {}", name, e);
                ApiError::bad_request("Invalid form field").with_detail(e.to_string())
            })?),
        };
        fields.push((name, value));
    }

    Ok(fields)
}

fn parse_record(field: &str, text: &str) -> Result<Record, ApiError> {
    serde_json::from_str(text).map_err(|e| {
        ApiError::unprocessable(format!("Invalid {field}")).with_detail(e.to_string())
    })
}

/// POST /uploadSingle - Upload one file into an existing job.
///
/// Request body: multipart/form-data with a `file` and a `record` (JSON text).
pub async fn upload_single(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let start = Instant::now();

    let mut file = None;
    let mut record = None;
    for (name, value) in read_form(multipart).await? {
        match (name.as_str(), value) {
            ("file", FormValue::File(f)) => file = Some(f),
            ("record", FormValue::Text(text)) => record = Some(parse_record("record", &text)?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ApiError::bad_request("No file provided"))?;
    let record = record.ok_or_else(|| ApiError::bad_request("No record provided"))?;

    let tree = state.service.upload_single(record, file).await?;

    Ok(Json(UploadResponse {
        message: "file uploaded successfully".to_string(),
        success: true,
        upload_time: format_elapsed(start.elapsed()),
        virtual_directory: tree,
    }))
}

/// POST /upload - Upload a whole job.
///
/// Request body: multipart/form-data with repeated `files` and a
/// `directoryStructure` (JSON text).
pub async fn upload(
    State(state): State<Arc<AppState>>,
    multipart: Multipart,
) -> Result<Json<UploadResponse>, ApiError> {
    let start = Instant::now();

    let mut files = Vec::new();
    let mut skeleton = None;
    for (name, value) in read_form(multipart).await? {
        match (name.as_str(), value) {
            ("files", FormValue::File(f)) => files.push(f),
            ("directoryStructure", FormValue::Text(text)) => {
                skeleton = Some(parse_record("directoryStructure", &text)?)
            }
            _ => {}
        }
    }

    let skeleton =
        skeleton.ok_or_else(|| ApiError::bad_request("No directoryStructure provided"))?;
    tracing::info!(job_id = ?skeleton.job_id, files = files.len(), "Beginning upload sequence");

    let tree = state.service.upload_job(skeleton, files).await?;

    Ok(Json(UploadResponse {
        message: "Files uploaded successfully".to_string(),
        success: true,
        upload_time: format_elapsed(start.elapsed()),
        virtual_directory: tree,
    }))
}

/// POST /retrieve - Download a file, or a directory as a zip archive.
pub async fn retrieve(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdentifierRequest>,
) -> Result<Json<RetrieveResponse>, ApiError> {
    let start = Instant::now();
    tracing::info!(record_id = %req.id(), "Beginning retrieval sequence");

    let artifact = state.service.retrieve(req.id()).await?;
    let message = if artifact.extension == crate::archive::ARCHIVE_EXTENSION {
        "folder retrieved successfully"
    } else {
        "File retrieved successfully"
    };

    Ok(Json(RetrieveResponse {
        message: message.to_string(),
        success: true,
        retrieval_time: format_elapsed(start.elapsed()),
        file: FileObject::from(artifact),
    }))
}

/// GET /virtualDirectory - The whole tree.
pub async fn virtual_directory(
    State(state): State<Arc<AppState>>,
) -> Result<Json<TreeResponse>, ApiError> {
    let tree = state.service.snapshot().await?;
    Ok(Json(TreeResponse::ok(
        "Virtual directory fetched successfully",
        tree,
    )))
}

/// POST /delete - Remove a record and its subtree.
pub async fn delete(
    State(state): State<Arc<AppState>>,
    Json(req): Json<IdentifierRequest>,
) -> Result<Json<TreeResponse>, ApiError> {
    let tree = state.service.delete(req.id()).await?;
    Ok(Json(TreeResponse::ok("resource deleted successfully", tree)))
}
