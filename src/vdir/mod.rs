//! Virtual directory: the persisted tree of files and directories.
//!
//! Records only hold metadata and chunk locators; file bytes live in the
//! backend.

pub mod path;
pub mod record;
pub mod store;
pub mod tree;

pub use path::{VirtualPath, SEPARATOR};
pub use record::{new_id, Record, RecordField, RecordKind, ROOT_NAME};
pub use store::{JsonTreeStore, MemoryTreeStore, TreeStore};
pub use tree::{
    assign_ids, check_insert_into_job, check_job_skeleton, collect_files, delete_by_id,
    find_among_immediate_children, find_by_field, find_by_id, insert, insert_into_job, locate,
    node_at_mut, FileEntry, MAX_DEPTH,
};
