//! Virtual directory records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Name and path of the tree root.
pub const ROOT_NAME: &str = "root";

/// A node of the virtual directory.
///
/// Serialized as the flat JSON object clients already use:
/// `{ "id", "name", "path", "jobId"?, "type": "file" | "directory", ... }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    /// Identifier, unique within the tree.
    #[serde(default)]
    pub id: String,
    /// Display name, the last segment of `path`.
    #[serde(default)]
    pub name: String,
    /// Full path, segments joined by `\`.
    #[serde(default)]
    pub path: String,
    /// Upload job this record belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<String>,
    /// File or directory payload.
    #[serde(flatten)]
    pub kind: RecordKind,
}

/// Variant-specific record fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum RecordKind {
    /// A stored file.
    File {
        /// Size in bytes as reported at upload time.
        #[serde(default)]
        size: u64,
        /// Chunk locators in upload order.
        #[serde(default)]
        links: Vec<String>,
    },
    /// A directory.
    Directory {
        /// Children in insertion order.
        #[serde(default)]
        children: Vec<Record>,
    },
}

/// Field selector for [`find_by_field`](super::tree::find_by_field).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordField {
    Id,
    Name,
    Path,
    JobId,
    Type,
}

impl RecordField {
    /// Value of this field on `record`, if it has one.
    pub fn value<'a>(&self, record: &'a Record) -> Option<&'a str> {
        match self {
            RecordField::Id => Some(&record.id),
            RecordField::Name => Some(&record.name),
            RecordField::Path => Some(&record.path),
            RecordField::JobId => record.job_id.as_deref(),
            RecordField::Type => Some(record.kind.type_name()),
        }
    }
}

/// Generate a fresh record id.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

impl RecordKind {
    /// The `type` discriminator as serialized.
    pub fn type_name(&self) -> &'static str {
        match self {
            RecordKind::File { .. } => "file",
            RecordKind::Directory { .. } => "directory",
        }
    }
}

impl Record {
    /// An empty tree root with a fresh id.
    pub fn root() -> Self {
        Self::directory(new_id(), ROOT_NAME, ROOT_NAME, None)
    }

    /// An empty directory.
    pub fn directory(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        job_id: Option<String>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            job_id,
            kind: RecordKind::Directory {
                children: Vec::new(),
            },
        }
    }

    /// A file with no links yet.
    pub fn file(
        id: impl Into<String>,
        name: impl Into<String>,
        path: impl Into<String>,
        job_id: Option<String>,
        size: u64,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            path: path.into(),
            job_id,
            kind: RecordKind::File {
                size,
                links: Vec::new(),
            },
        }
    }

    /// Builder-style helper to add a child to a directory. No-op on files.
    pub fn with_child(mut self, child: Record) -> Self {
        if let Some(children) = self.children_mut() {
            children.push(child);
        }
        self
    }

    pub fn is_file(&self) -> bool {
        matches!(self.kind, RecordKind::File { .. })
    }

    pub fn is_directory(&self) -> bool {
        matches!(self.kind, RecordKind::Directory { .. })
    }

    /// Children of a directory; empty for files.
    pub fn children(&self) -> &[Record] {
        match &self.kind {
            RecordKind::Directory { children } => children,
            RecordKind::File { .. } => &[],
        }
    }

    /// Mutable children of a directory, `None` for files.
    pub fn children_mut(&mut self) -> Option<&mut Vec<Record>> {
        match &mut self.kind {
            RecordKind::Directory { children } => Some(children),
            RecordKind::File { .. } => None,
        }
    }

    /// Locators of a file; empty for directories.
    pub fn links(&self) -> &[String] {
        match &self.kind {
            RecordKind::File { links, .. } => links,
            RecordKind::Directory { .. } => &[],
        }
    }

    /// Store the size and locators of an uploaded file. No-op on directories.
    pub fn set_upload(&mut self, uploaded_size: u64, locators: Vec<String>) {
        if let RecordKind::File { size, links } = &mut self.kind {
            *size = uploaded_size;
            *links = locators;
        }
    }
}
