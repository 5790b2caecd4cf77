//! Drive service: uploads, retrievals and deletions against the virtual directory.
//!
//! Every mutation is load, modify, save of the whole snapshot. The
//! load-modify-save section is serialized with an async mutex so concurrent
//! requests cannot overwrite each other's changes. Chunk transfers run
//! outside of it.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use bytes::Bytes;
use tokio::sync::Mutex;

use crate::archive::{archive_name, zip_files, ARCHIVE_EXTENSION};
use crate::transfer::TransferEngine;
use crate::vdir::{
    assign_ids, check_insert_into_job, check_job_skeleton, collect_files, delete_by_id,
    find_among_immediate_children, find_by_id, insert_into_job, locate, new_id, node_at_mut,
    Record, RecordField, RecordKind, TreeStore,
};
use crate::{DspaceError, Result};

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    /// Original file name.
    pub name: String,
    /// File content.
    pub data: Bytes,
}

/// A file downloaded as part of a directory retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedFile {
    /// Path relative to the retrieved directory, segments joined by `/`.
    pub path: String,
    /// File content.
    pub bytes: Bytes,
}

/// Result of a retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetrievedArtifact {
    /// Record name, or `{name}.zip` for directories.
    pub name: String,
    /// Extension including the dot, or an empty string.
    pub extension: String,
    /// File or archive bytes.
    pub bytes: Bytes,
}

/// Coordinates the transfer engine and the tree store.
pub struct DriveService {
    engine: TransferEngine,
    store: Arc<dyn TreeStore>,
    write_lock: Mutex<()>,
    downloads_dir: Option<PathBuf>,
}

impl DriveService {
    /// Create a service. Retrieved artifacts are not saved to disk.
    pub fn new(engine: TransferEngine, store: Arc<dyn TreeStore>) -> Self {
        Self {
            engine,
            store,
            write_lock: Mutex::new(()),
            downloads_dir: None,
        }
    }

    /// Also save every retrieved artifact into `dir`.
    pub fn with_downloads_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.downloads_dir = Some(dir.into());
        self
    }

    /// The transfer engine.
    pub fn engine(&self) -> &TransferEngine {
        &self.engine
    }

    /// The current persisted tree.
    pub async fn snapshot(&self) -> Result<Record> {
        self.store.load().await
    }

    /// Upload one file and insert its record under an existing job root.
    ///
    /// The record gets a fresh id and the size of `file`. Returns the updated tree.
    pub async fn upload_single(&self, mut record: Record, file: UploadedFile) -> Result<Record> {
        if !record.is_file() {
            return Err(DspaceError::Validation(
                "record must have type \"file\"".to_string(),
            ));
        }
        let job_id = record
            .job_id
            .clone()
            .ok_or_else(|| DspaceError::Validation("record has no jobId".to_string()))?;

        // Fail before sending anything if the record cannot be placed.
        let tree = self.store.load().await?;
        check_insert_into_job(&record, &tree)?;

        record.id = new_id();
        let size = file.data.len() as u64;
        let links = self.engine.upload_named(file.data, &file.name).await?;
        record.set_upload(size, links);

        tracing::info!(job_id = %job_id, record_id = %record.id, path = %record.path, "Uploaded file");

        let _guard = self.write_lock.lock().await;
        let mut tree = self.store.load().await?;
        insert_into_job(record, &mut tree)?;
        self.store.save(&tree).await?;
        Ok(tree)
    }

    /// Upload a whole job: a directory skeleton plus the files named in it.
    ///
    /// Every node gets a fresh id. Each file is uploaded into the first file
    /// node with the same name that has no links yet; files matching no node
    /// are skipped. The job root is then appended under the tree root.
    /// Returns the updated tree.
    pub async fn upload_job(&self, mut skeleton: Record, files: Vec<UploadedFile>) -> Result<Record> {
        if !skeleton.is_directory() {
            return Err(DspaceError::Validation(
                "directory structure must have type \"directory\"".to_string(),
            ));
        }
        let job_id = skeleton
            .job_id
            .clone()
            .ok_or_else(|| DspaceError::Validation("directory structure has no jobId".to_string()))?;

        let tree = self.store.load().await?;
        ensure_new_job(&tree, &job_id)?;
        check_job_skeleton(&skeleton, &tree)?;

        tracing::info!(job_id = %job_id, files = files.len(), "Beginning job upload");
        assign_ids(&mut skeleton);

        for file in files {
            let route = locate(&skeleton, |n| {
                n.is_file() && n.name == file.name && n.links().is_empty()
            });
            let Some(route) = route else {
                tracing::warn!(job_id = %job_id, file = %file.name, "No record for uploaded file, skipping");
                continue;
            };

            let size = file.data.len() as u64;
            let links = self.engine.upload_named(file.data, &file.name).await?;
            if let Some(node) = node_at_mut(&mut skeleton, &route) {
                node.set_upload(size, links);
            }
        }

        let _guard = self.write_lock.lock().await;
        let mut tree = self.store.load().await?;
        ensure_new_job(&tree, &job_id)?;
        check_job_skeleton(&skeleton, &tree)?;
        tree.children_mut()
            .ok_or_else(|| DspaceError::Validation("tree root is not a directory".to_string()))?
            .push(skeleton);
        self.store.save(&tree).await?;

        tracing::info!(job_id = %job_id, "Job upload complete");
        Ok(tree)
    }

    /// Retrieve a file, or a directory packed as a zip archive.
    pub async fn retrieve(&self, id: &str) -> Result<RetrievedArtifact> {
        if id.is_empty() {
            return Err(DspaceError::Validation("identifier missing".to_string()));
        }

        let tree = self.store.load().await?;
        let record =
            find_by_id(&tree, id).ok_or_else(|| DspaceError::RecordNotFound(id.to_string()))?;

        let artifact = match &record.kind {
            RecordKind::File { links, .. } => {
                if links.is_empty() {
                    return Err(DspaceError::Validation(format!(
                        "file {id} has no uploaded content"
                    )));
                }
                let file = self.engine.download(links).await?;
                RetrievedArtifact {
                    name: record.name.clone(),
                    extension: file.extension(),
                    bytes: file.bytes,
                }
            }
            RecordKind::Directory { .. } => {
                let retrieved = self.retrieve_directory(record).await?;
                RetrievedArtifact {
                    name: archive_name(&record.name),
                    extension: ARCHIVE_EXTENSION.to_string(),
                    bytes: Bytes::from(zip_files(&retrieved)?),
                }
            }
        };

        if let Some(dir) = &self.downloads_dir {
            save_artifact(dir, &artifact).await?;
        }
        Ok(artifact)
    }

    /// Download every file with links under `directory`, in tree order.
    pub async fn retrieve_directory(&self, directory: &Record) -> Result<Vec<RetrievedFile>> {
        let mut retrieved = Vec::new();
        for entry in collect_files(directory) {
            let file = self.engine.download(entry.record.links()).await?;
            retrieved.push(RetrievedFile {
                path: entry.relative.join("/"),
                bytes: file.bytes,
            });
        }
        Ok(retrieved)
    }

    /// Delete a record and its subtree. Returns the updated tree.
    ///
    /// Chunks referenced by deleted records stay in the backend.
    pub async fn delete(&self, id: &str) -> Result<Record> {
        if id.is_empty() {
            return Err(DspaceError::Validation("identifier missing".to_string()));
        }

        let _guard = self.write_lock.lock().await;
        let mut tree = self.store.load().await?;
        if !delete_by_id(&mut tree, id) {
            return Err(DspaceError::RecordNotFound(id.to_string()));
        }
        self.store.save(&tree).await?;

        tracing::info!(record_id = %id, "Deleted record");
        Ok(tree)
    }
}

fn ensure_new_job(tree: &Record, job_id: &str) -> Result<()> {
    if find_among_immediate_children(tree, RecordField::JobId, job_id).is_some() {
        return Err(DspaceError::Validation(format!("job {job_id} already exists")));
    }
    Ok(())
}

async fn save_artifact(dir: &Path, artifact: &RetrievedArtifact) -> Result<()> {
    let Some(file_name) = Path::new(&artifact.name).file_name() else {
        tracing::warn!(name = %artifact.name, "Artifact name is not a file name, not saving");
        return Ok(());
    };

    tokio::fs::create_dir_all(dir).await?;
    let target = dir.join(file_name);
    tokio::fs::write(&target, &artifact.bytes).await?;
    tracing::info!(path = %target.display(), "Saved retrieved file");
    Ok(())
}
