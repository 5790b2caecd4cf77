//! Snapshot persistence for the virtual directory.
//!
//! The whole tree is one document. Loading reads all of it, saving replaces
//! all of it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use super::record::Record;
use crate::{DspaceError, Result};

/// Load and save the whole tree.
#[async_trait]
pub trait TreeStore: Send + Sync {
    /// Read the current snapshot. Fails with [`DspaceError::NotInitialized`]
    /// when there is none.
    async fn load(&self) -> Result<Record>;

    /// Replace the snapshot with `tree`.
    async fn save(&self, tree: &Record) -> Result<()>;
}

/// Tree store backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonTreeStore {
    path: PathBuf,
}

impl JsonTreeStore {
    /// Create a store for the snapshot at `path`. Nothing is read or written yet.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Snapshot file path.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write an empty root unless a non-empty snapshot already exists.
    ///
    /// Returns true if a new snapshot was written.
    pub async fn initialize(&self) -> Result<bool> {
        if self.has_snapshot().await? {
            tracing::info!(path = %self.path.display(), "Virtual directory already initialized");
            return Ok(false);
        }

        self.save(&Record::root()).await?;
        tracing::info!(path = %self.path.display(), "Virtual directory initialized");
        Ok(true)
    }

    async fn has_snapshot(&self) -> Result<bool> {
        match tokio::fs::metadata(&self.path).await {
            Ok(meta) => Ok(meta.len() > 0),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[async_trait]
impl TreeStore for JsonTreeStore {
    async fn load(&self) -> Result<Record> {
        let data = match tokio::fs::read(&self.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(DspaceError::NotInitialized(self.path.display().to_string()));
            }
            Err(e) => return Err(e.into()),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Err(DspaceError::NotInitialized(self.path.display().to_string()));
        }

        Ok(serde_json::from_slice(&data)?)
    }

    async fn save(&self, tree: &Record) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let data = serde_json::to_vec(tree)?;
        let temp = self.temp_path();
        tokio::fs::write(&temp, &data).await?;
        tokio::fs::rename(&temp, &self.path).await?;

        tracing::debug!(path = %self.path.display(), size = data.len(), "Saved virtual directory");
        Ok(())
    }
}

/// In-process tree store.
#[derive(Debug, Default)]
pub struct MemoryTreeStore {
    tree: Mutex<Option<Record>>,
}

impl MemoryTreeStore {
    /// An uninitialized store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store holding an empty root.
    pub fn initialized() -> Self {
        Self::with_tree(Record::root())
    }

    /// A store holding `tree`.
    pub fn with_tree(tree: Record) -> Self {
        Self {
            tree: Mutex::new(Some(tree)),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<Record>> {
        // A poisoned lock still holds a whole snapshot.
        self.tree.lock().unwrap_or_else(|e| e.into_inner())
    }
}

#[async_trait]
impl TreeStore for MemoryTreeStore {
    async fn load(&self) -> Result<Record> {
        self.lock()
            .clone()
            .ok_or_else(|| DspaceError::NotInitialized("memory store".to_string()))
    }

    async fn save(&self, tree: &Record) -> Result<()> {
        *self.lock() = Some(tree.clone());
        Ok(())
    }
}
