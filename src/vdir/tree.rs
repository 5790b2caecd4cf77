//! Tree operations: search, path-based insertion, deletion.
//!
//! Every walk uses an explicit stack, so deeply nested trees cannot exhaust
//! the call stack. Children are visited left to right, matching a recursive
//! pre-order walk.

use std::collections::HashSet;

use super::path::VirtualPath;
use super::record::{new_id, Record, RecordField, RecordKind};
use crate::{DspaceError, Result};

/// Depth-first pre-order search for the first record whose `field` equals `value`.
pub fn find_by_field<'a>(root: &'a Record, field: RecordField, value: &str) -> Option<&'a Record> {
    let mut stack = vec![root];
    while let Some(node) = stack.pop() {
        if field.value(node) == Some(value) {
            return Some(node);
        }
        stack.extend(node.children().iter().rev());
    }
    None
}

/// Find a record by id anywhere in the tree.
pub fn find_by_id<'a>(root: &'a Record, id: &str) -> Option<&'a Record> {
    find_by_field(root, RecordField::Id, id)
}

/// Search only the immediate children of `directory`. Never descends further.
pub fn find_among_immediate_children<'a>(
    directory: &'a Record,
    field: RecordField,
    value: &str,
) -> Option<&'a Record> {
    directory
        .children()
        .iter()
        .find(|child| field.value(child) == Some(value))
}

/// Pre-order search returning the child-index route from `root` to the first
/// node matching `pred`. The root itself is the empty route.
pub fn locate<F>(root: &Record, pred: F) -> Option<Vec<usize>>
where
    F: Fn(&Record) -> bool,
{
    let mut stack: Vec<(&Record, Vec<usize>)> = vec![(root, Vec::new())];
    while let Some((node, route)) = stack.pop() {
        if pred(node) {
            return Some(route);
        }
        for (i, child) in node.children().iter().enumerate().rev() {
            let mut child_route = route.clone();
            child_route.push(i);
            stack.push((child, child_route));
        }
    }
    None
}

/// Follow a route produced by [`locate`].
pub fn node_at_mut<'a>(root: &'a mut Record, route: &[usize]) -> Option<&'a mut Record> {
    let mut node = root;
    for &i in route {
        node = node.children_mut()?.get_mut(i)?;
    }
    Some(node)
}

fn path_matches(record: &Record, target: &VirtualPath) -> bool {
    VirtualPath::parse(&record.path)
        .map(|p| p == *target)
        .unwrap_or(false)
}

/// Deepest record path allowed, counted in segments including the root.
///
/// Each level nests two JSON containers in the snapshot, and the snapshot
/// reader stops at 128.
pub const MAX_DEPTH: usize = 32;

/// Where an inserted record ends up.
enum Placement {
    /// The path is already held compatibly; nothing to do.
    Present,
    /// Attach under the directory at `route`, creating `missing` ancestors
    /// (nearest first) on the way.
    Attach {
        path: VirtualPath,
        route: Vec<usize>,
        missing: Vec<VirtualPath>,
    },
}

fn parse_within_depth(path: &str) -> Result<VirtualPath> {
    let parsed = VirtualPath::parse(path)?;
    if parsed.depth() > MAX_DEPTH {
        return Err(DspaceError::InvalidPath(format!(
            "{parsed} is deeper than {MAX_DEPTH} levels"
        )));
    }
    Ok(parsed)
}

fn place(record: &Record, job_root: &Record) -> Result<Placement> {
    let root_path = VirtualPath::parse(&job_root.path)?;
    let record_path = parse_within_depth(&record.path)?;

    if record_path == root_path {
        return Ok(Placement::Present);
    }
    if !record_path.starts_with(&root_path) {
        return Err(DspaceError::InvalidPath(format!(
            "{} is not under {}",
            record.path, job_root.path
        )));
    }

    if let Some(existing) = find_path(job_root, &record_path) {
        if existing.is_directory() && record.is_directory() {
            return Ok(Placement::Present);
        }
        return Err(DspaceError::PathConflict(record_path.to_string()));
    }

    // Walk up until an existing ancestor is found. The job root always
    // matches, so this terminates within the subtree.
    let mut missing = Vec::new();
    let mut ancestor = record_path.parent();
    let route = loop {
        let Some(current) = ancestor else {
            return Err(DspaceError::InvalidPath(record_path.to_string()));
        };
        if let Some(route) = locate(job_root, |n| path_matches(n, &current)) {
            break route;
        }
        ancestor = current.parent();
        missing.push(current);
    };

    let parent = node_at(job_root, &route)
        .ok_or_else(|| DspaceError::InvalidPath(record_path.to_string()))?;
    if !parent.is_directory() {
        return Err(DspaceError::PathConflict(parent.path.clone()));
    }

    Ok(Placement::Attach {
        path: record_path,
        route,
        missing,
    })
}

/// Insert `record` into the subtree of `job_root` at the place its path names.
///
/// Missing ancestor directories between the job root and the record are
/// created with fresh ids and the record's `jobId`. Inserting a directory at
/// a path already held by a directory, or at the job root's own path, leaves
/// the tree unchanged. Any other occupied path is a [`DspaceError::PathConflict`].
/// Paths deeper than [`MAX_DEPTH`] are a [`DspaceError::InvalidPath`].
/// The stored path is rewritten with the canonical separator.
pub fn insert(mut record: Record, job_root: &mut Record) -> Result<()> {
    let Placement::Attach {
        path,
        route,
        missing,
    } = place(&record, job_root)?
    else {
        return Ok(());
    };

    record.path = path.to_string();
    let mut node = record;
    for dir_path in missing {
        let mut dir = Record::directory(
            new_id(),
            dir_path.name(),
            dir_path.to_string(),
            node.job_id.clone(),
        );
        tracing::debug!(path = %dir.path, "Synthesized directory");
        if let Some(children) = dir.children_mut() {
            children.push(node);
        }
        node = dir;
    }

    let parent = node_at_mut(job_root, &route)
        .ok_or_else(|| DspaceError::InvalidPath(path.to_string()))?;
    match parent.children_mut() {
        Some(children) => {
            children.push(node);
            Ok(())
        }
        None => Err(DspaceError::PathConflict(parent.path.clone())),
    }
}

fn node_at<'a>(root: &'a Record, route: &[usize]) -> Option<&'a Record> {
    let mut node = root;
    for &i in route {
        node = node.children().get(i)?;
    }
    Some(node)
}

fn find_path<'a>(root: &'a Record, target: &VirtualPath) -> Option<&'a Record> {
    let route = locate(root, |n| path_matches(n, target))?;
    node_at(root, &route)
}

fn record_job_id(record: &Record) -> Result<&str> {
    record
        .job_id
        .as_deref()
        .ok_or_else(|| DspaceError::Validation("record has no jobId".to_string()))
}

/// Check that [`insert_into_job`] would accept `record`, without changing anything.
pub fn check_insert_into_job(record: &Record, tree_root: &Record) -> Result<()> {
    let job_id = record_job_id(record)?;
    let job_root = find_among_immediate_children(tree_root, RecordField::JobId, job_id)
        .ok_or_else(|| DspaceError::JobNotFound(job_id.to_string()))?;
    place(record, job_root).map(|_| ())
}

/// Insert `record` under the job root among `tree_root`'s immediate children
/// whose `jobId` matches the record's.
pub fn insert_into_job(record: Record, tree_root: &mut Record) -> Result<()> {
    let job_id = record_job_id(&record)?.to_string();

    let job_root = tree_root
        .children_mut()
        .and_then(|children| {
            children
                .iter_mut()
                .find(|c| c.job_id.as_deref() == Some(job_id.as_str()))
        })
        .ok_or_else(|| DspaceError::JobNotFound(job_id.clone()))?;

    insert(record, job_root)
}

/// Check a client-built job skeleton before it is attached under `tree_root`.
///
/// The job root must sit directly under the tree root at a path no other
/// job holds. Every child path must be its parent's path plus one segment,
/// no deeper than [`MAX_DEPTH`], and unique among its siblings.
pub fn check_job_skeleton(skeleton: &Record, tree_root: &Record) -> Result<()> {
    let root_path = VirtualPath::parse(&tree_root.path)?;
    let job_path = VirtualPath::parse(&skeleton.path)?;
    if job_path.parent().as_ref() != Some(&root_path) {
        return Err(DspaceError::InvalidPath(format!(
            "job root {} is not directly under {}",
            skeleton.path, tree_root.path
        )));
    }
    let taken = tree_root
        .children()
        .iter()
        .any(|c| VirtualPath::parse(&c.path).is_ok_and(|p| p == job_path));
    if taken {
        return Err(DspaceError::PathConflict(job_path.to_string()));
    }

    let mut stack = vec![(skeleton, job_path)];
    while let Some((node, node_path)) = stack.pop() {
        let mut siblings = HashSet::new();
        for child in node.children() {
            let child_path = parse_within_depth(&child.path)?;
            if child_path.parent().as_ref() != Some(&node_path) {
                return Err(DspaceError::InvalidPath(format!(
                    "{} is not directly under {}",
                    child.path, node.path
                )));
            }
            if !siblings.insert(child_path.clone()) {
                return Err(DspaceError::PathConflict(child_path.to_string()));
            }
            stack.push((child, child_path));
        }
    }
    Ok(())
}

/// Remove the record with `id` and its whole subtree.
///
/// At each directory the immediate children are checked before descending.
/// The node passed in is never matched itself, so the root cannot be deleted.
/// Returns false when no record has that id.
pub fn delete_by_id(root: &mut Record, id: &str) -> bool {
    let mut found = None;
    let mut stack: Vec<(&Record, Vec<usize>)> = vec![(&*root, Vec::new())];
    while let Some((node, route)) = stack.pop() {
        if let Some(pos) = node.children().iter().position(|c| c.id == id) {
            found = Some((route, pos));
            break;
        }
        for (i, child) in node.children().iter().enumerate().rev() {
            let mut child_route = route.clone();
            child_route.push(i);
            stack.push((child, child_route));
        }
    }

    let Some((route, pos)) = found else {
        return false;
    };
    match node_at_mut(root, &route).and_then(Record::children_mut) {
        Some(children) => {
            children.remove(pos);
            true
        }
        None => false,
    }
}

/// Give every node of a fresh skeleton a new id and every file an empty link list.
pub fn assign_ids(node: &mut Record) {
    let mut stack = vec![node];
    while let Some(node) = stack.pop() {
        let Record { id, kind, .. } = node;
        *id = new_id();
        match kind {
            RecordKind::File { links, .. } => links.clear(),
            RecordKind::Directory { children } => stack.extend(children.iter_mut()),
        }
    }
}

/// A file found under a directory, with its path relative to that directory.
#[derive(Debug, Clone, PartialEq)]
pub struct FileEntry<'a> {
    /// Names from the directory's child down to the file.
    pub relative: Vec<String>,
    /// The file record.
    pub record: &'a Record,
}

/// All files with at least one link under `directory`, in pre-order.
///
/// Relative paths are built from record names. Files without links are skipped.
pub fn collect_files(directory: &Record) -> Vec<FileEntry<'_>> {
    let mut files = Vec::new();
    let mut stack: Vec<(&Record, Vec<String>)> = directory
        .children()
        .iter()
        .rev()
        .map(|c| (c, vec![c.name.clone()]))
        .collect();

    while let Some((node, relative)) = stack.pop() {
        match &node.kind {
            RecordKind::File { links, .. } => {
                if !links.is_empty() {
                    files.push(FileEntry {
                        relative,
                        record: node,
                    });
                }
            }
            RecordKind::Directory { children } => {
                for child in children.iter().rev() {
                    let mut child_relative = relative.clone();
                    child_relative.push(child.name.clone());
                    stack.push((child, child_relative));
                }
            }
        }
    }
    files
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree_with_job() -> Record {
        let job = Record::directory("J1", "job-1", r"root\job-1", Some("job-1".into()));
        let mut root = Record::directory("R", "root", "root", None);
        root.children_mut().unwrap().push(job);
        root
    }

    fn file(id: &str, path: &str) -> Record {
        let name = path.rsplit('\\').next().unwrap();
        Record::file(id, name, path, Some("job-1".into()), 1)
    }

    #[test]
    fn test_find_by_field_pre_order() {
        let tree = Record::directory("R", "root", "root", None)
            .with_child(
                Record::directory("A", "x", r"root\a", None).with_child(file("A1", r"root\a\x")),
            )
            .with_child(file("B", r"root\x"));

        // Pre-order reaches the directory "x" before the deeper file and the later sibling.
        assert_eq!(find_by_field(&tree, RecordField::Name, "x").unwrap().id, "A");
        assert_eq!(find_by_id(&tree, "A1").unwrap().path, r"root\a\x");
        assert_eq!(find_by_id(&tree, "R").unwrap().name, "root");
        assert!(find_by_id(&tree, "missing").is_none());
    }

    #[test]
    fn test_find_among_immediate_children_does_not_recurse() {
        let mut tree = tree_with_job();
        let nested = Record::directory("N", "n", r"root\job-1\n", Some("deep".into()));
        tree.children_mut().unwrap()[0].children_mut().unwrap().push(nested);

        assert_eq!(
            find_among_immediate_children(&tree, RecordField::JobId, "job-1").unwrap().id,
            "J1"
        );
        assert!(find_among_immediate_children(&tree, RecordField::JobId, "deep").is_none());
    }

    #[test]
    fn test_insert_synthesizes_missing_directory() {
        let mut tree = tree_with_job();

        insert_into_job(file("F", r"root\job-1\dir\a.txt"), &mut tree).unwrap();

        let job = &tree.children()[0];
        assert_eq!(job.children().len(), 1);
        let dir = &job.children()[0];
        assert!(dir.is_directory());
        assert_eq!(dir.path, r"root\job-1\dir");
        assert_eq!(dir.name, "dir");
        assert_eq!(dir.job_id.as_deref(), Some("job-1"));
        assert!(!dir.id.is_empty());
        assert_eq!(dir.children().len(), 1);
        assert_eq!(dir.children()[0].id, "F");
    }

    #[test]
    fn test_insert_synthesizes_whole_chain() {
        let mut tree = tree_with_job();

        insert_into_job(file("F", r"root\job-1\a\b\c\f.bin"), &mut tree).unwrap();

        let mut node = &tree.children()[0];
        for expected in [r"root\job-1\a", r"root\job-1\a\b", r"root\job-1\a\b\c"] {
            assert_eq!(node.children().len(), 1);
            node = &node.children()[0];
            assert!(node.is_directory());
            assert_eq!(node.path, expected);
        }
        assert_eq!(node.children().len(), 1);
        assert_eq!(node.children()[0].id, "F");
    }

    #[test]
    fn test_insert_reuses_existing_parent() {
        let mut tree = tree_with_job();
        insert_into_job(file("F1", r"root\job-1\dir\a.txt"), &mut tree).unwrap();
        insert_into_job(file("F2", r"root\job-1\dir\b.txt"), &mut tree).unwrap();

        let dir = &tree.children()[0].children()[0];
        let ids: Vec<_> = dir.children().iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, ["F1", "F2"]);
        assert_eq!(tree.children()[0].children().len(), 1);
    }

    #[test]
    fn test_insert_existing_directory_is_noop() {
        let mut tree = tree_with_job();
        insert_into_job(file("F", r"root\job-1\dir\a.txt"), &mut tree).unwrap();
        let before = tree.clone();

        let dir = Record::directory("D2", "dir", r"root\job-1\dir", Some("job-1".into()));
        insert_into_job(dir, &mut tree).unwrap();
        let job_again = Record::directory("J2", "job-1", r"root\job-1", Some("job-1".into()));
        insert_into_job(job_again, &mut tree).unwrap();

        assert_eq!(tree, before);
    }

    #[test]
    fn test_insert_accepts_forward_slashes() {
        let mut tree = tree_with_job();
        insert_into_job(file("F", "root/job-1/dir/a.txt"), &mut tree).unwrap();

        let dir = &tree.children()[0].children()[0];
        assert_eq!(dir.path, r"root\job-1\dir");
        assert_eq!(dir.children()[0].path, r"root\job-1\dir\a.txt");
    }

    #[test]
    fn test_insert_conflicts() {
        let mut tree = tree_with_job();
        insert_into_job(file("F", r"root\job-1\a.txt"), &mut tree).unwrap();

        let again = insert_into_job(file("F2", r"root\job-1\a.txt"), &mut tree);
        assert!(matches!(again, Err(DspaceError::PathConflict(_))));

        let under_file = insert_into_job(file("F3", r"root\job-1\a.txt\b"), &mut tree);
        assert!(matches!(under_file, Err(DspaceError::PathConflict(_))));
    }

    #[test]
    fn test_insert_outside_job_is_invalid() {
        let mut tree = tree_with_job();
        let result = insert_into_job(file("F", r"root\other\a.txt"), &mut tree);
        assert!(matches!(result, Err(DspaceError::InvalidPath(_))));
    }

    #[test]
    fn test_insert_unknown_job() {
        let mut tree = tree_with_job();
        let mut record = file("F", r"root\job-2\a.txt");
        record.job_id = Some("job-2".into());

        let result = insert_into_job(record, &mut tree);
        assert!(matches!(result, Err(DspaceError::JobNotFound(id)) if id == "job-2"));
    }

    #[test]
    fn test_insert_without_job_id() {
        let mut tree = tree_with_job();
        let mut record = file("F", r"root\job-1\a.txt");
        record.job_id = None;

        let result = insert_into_job(record, &mut tree);
        assert!(matches!(result, Err(DspaceError::Validation(_))));
    }

    #[test]
    fn test_delete_by_id_removes_subtree() {
        let mut tree = tree_with_job();
        insert_into_job(file("F1", r"root\job-1\dir\a.txt"), &mut tree).unwrap();
        insert_into_job(file("F2", r"root\job-1\b.txt"), &mut tree).unwrap();
        let dir_id = tree.children()[0].children()[0].id.clone();

        assert!(delete_by_id(&mut tree, &dir_id));

        assert!(find_by_id(&tree, &dir_id).is_none());
        assert!(find_by_id(&tree, "F1").is_none());
        assert!(find_by_id(&tree, "F2").is_some());
    }

    #[test]
    fn test_delete_keeps_empty_parent() {
        let mut tree = tree_with_job();
        insert_into_job(file("F1", r"root\job-1\dir\a.txt"), &mut tree).unwrap();

        assert!(delete_by_id(&mut tree, "F1"));

        let dir = &tree.children()[0].children()[0];
        assert_eq!(dir.path, r"root\job-1\dir");
        assert!(dir.children().is_empty());
    }

    #[test]
    fn test_delete_unknown_and_root() {
        let mut tree = tree_with_job();
        let before = tree.clone();

        assert!(!delete_by_id(&mut tree, "nope"));
        assert!(!delete_by_id(&mut tree, "R"));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_assign_ids() {
        let mut skeleton = Record::directory("", "job", r"root\job", Some("j".into()))
            .with_child(Record::directory("", "d", r"root\job\d", None).with_child({
                let mut f = Record::file("", "a", r"root\job\d\a", None, 1);
                f.set_upload(1, vec!["stale".into()]);
                f
            }))
            .with_child(Record::file("", "b", r"root\job\b", None, 1));

        assign_ids(&mut skeleton);

        let mut ids = vec![skeleton.id.clone()];
        let d = &skeleton.children()[0];
        ids.push(d.id.clone());
        ids.push(d.children()[0].id.clone());
        ids.push(skeleton.children()[1].id.clone());
        assert!(ids.iter().all(|id| !id.is_empty()));
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 4);
        assert!(d.children()[0].links().is_empty());
    }

    #[test]
    fn test_collect_files_order_and_relative_paths() {
        let linked = |id: &str, name: &str| {
            let mut f = Record::file(id, name, "", None, 1);
            f.set_upload(1, vec![format!("l-{id}")]);
            f
        };
        let dir = Record::directory("D", "top", r"root\top", None)
            .with_child(linked("1", "a.txt"))
            .with_child(
                Record::directory("S", "sub", r"root\top\sub", None)
                    .with_child(linked("2", "b.txt"))
                    .with_child(Record::file("3", "empty.txt", "", None, 0)),
            )
            .with_child(linked("4", "c.txt"));

        let files = collect_files(&dir);

        let found: Vec<_> = files.iter().map(|f| f.relative.join("/")).collect();
        assert_eq!(found, ["a.txt", "sub/b.txt", "c.txt"]);
        assert_eq!(files[1].record.id, "2");
    }

    #[test]
    fn test_deep_tree_walks_do_not_recurse() {
        let mut node = file("LEAF", r"root\job-1\leaf.txt");
        for i in (0..1_000).rev() {
            node = Record::directory(format!("D{i}"), format!("d{i}"), format!(r"root\job-1\d{i}"), None)
                .with_child(node);
        }
        let mut tree = tree_with_job();
        tree.children_mut().unwrap()[0].children_mut().unwrap().push(node);

        assert_eq!(find_by_id(&tree, "D999").unwrap().name, "d999");
        assert!(find_by_id(&tree, "LEAF").is_some());
        assert!(collect_files(&tree).is_empty());
        assert!(delete_by_id(&mut tree, "LEAF"));
        assert!(find_by_id(&tree, "LEAF").is_none());
        assert!(delete_by_id(&mut tree, "D0"));
    }

    fn path_of_depth(depth: usize) -> String {
        let mut path = String::from(r"root\job-1");
        for i in 2..depth - 1 {
            path.push_str(&format!("\\d{i}"));
        }
        path.push_str("\\leaf.txt");
        path
    }

    #[test]
    fn test_insert_depth_limit() {
        let mut tree = tree_with_job();
        let deepest = path_of_depth(MAX_DEPTH);
        assert_eq!(VirtualPath::parse(&deepest).unwrap().depth(), MAX_DEPTH);

        insert_into_job(file("OK", &deepest), &mut tree).unwrap();
        assert_eq!(find_by_id(&tree, "OK").unwrap().path, deepest);

        let before = tree.clone();
        let too_deep = file("NO", &path_of_depth(MAX_DEPTH + 1));
        assert!(matches!(
            check_insert_into_job(&too_deep, &tree),
            Err(DspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            insert_into_job(too_deep, &mut tree),
            Err(DspaceError::InvalidPath(_))
        ));
        assert_eq!(tree, before);
    }

    #[test]
    fn test_check_insert_matches_insert() {
        let mut tree = tree_with_job();
        insert_into_job(file("F", r"root\job-1\a.txt"), &mut tree).unwrap();
        let before = tree.clone();

        assert!(check_insert_into_job(&file("G", r"root\job-1\new\b.txt"), &tree).is_ok());
        assert!(matches!(
            check_insert_into_job(&file("G", r"root\other\b.txt"), &tree),
            Err(DspaceError::InvalidPath(_))
        ));
        assert!(matches!(
            check_insert_into_job(&file("G", r"root\job-1\a.txt"), &tree),
            Err(DspaceError::PathConflict(_))
        ));
        assert!(matches!(
            check_insert_into_job(&file("G", r"root\job-1\a.txt\b"), &tree),
            Err(DspaceError::PathConflict(_))
        ));
        assert!(matches!(
            check_insert_into_job(&file("G", r"root\job-1\\b"), &tree),
            Err(DspaceError::InvalidPath(_))
        ));
        let mut other_job = file("G", r"root\job-2\b.txt");
        other_job.job_id = Some("job-2".into());
        assert!(matches!(
            check_insert_into_job(&other_job, &tree),
            Err(DspaceError::JobNotFound(_))
        ));
        assert_eq!(tree, before);
    }

    fn skeleton(job_path: &str) -> Record {
        Record::directory("", "job", job_path, Some("job-2".into()))
            .with_child(Record::file("", "a.txt", format!("{job_path}\\a.txt"), None, 0))
            .with_child(
                Record::directory("", "sub", format!("{job_path}\\sub"), None)
                    .with_child(Record::file("", "b.txt", format!("{job_path}\\sub\\b.txt"), None, 0)),
            )
    }

    #[test]
    fn test_check_job_skeleton_accepts_consistent_paths() {
        let tree = tree_with_job();
        check_job_skeleton(&skeleton(r"root\job-2"), &tree).unwrap();
        check_job_skeleton(&skeleton("root/job-2"), &tree).unwrap();
    }

    #[test]
    fn test_check_job_skeleton_job_root_placement() {
        let tree = tree_with_job();

        for bad in [r"root", r"root\a\job-2", r"elsewhere\job-2"] {
            assert!(
                matches!(
                    check_job_skeleton(&skeleton(bad), &tree),
                    Err(DspaceError::InvalidPath(_))
                ),
                "{bad}"
            );
        }
        assert!(matches!(
            check_job_skeleton(&skeleton(r"root\job-1"), &tree),
            Err(DspaceError::PathConflict(_))
        ));
    }

    #[test]
    fn test_check_job_skeleton_child_paths() {
        let tree = tree_with_job();

        let stray = Record::directory("", "job", r"root\job-2", Some("job-2".into()))
            .with_child(Record::file("", "a.txt", r"root\job-1\a.txt", None, 0));
        assert!(matches!(
            check_job_skeleton(&stray, &tree),
            Err(DspaceError::InvalidPath(_))
        ));

        let skipped_level = Record::directory("", "job", r"root\job-2", Some("job-2".into()))
            .with_child(
                Record::directory("", "sub", r"root\job-2\sub", None)
                    .with_child(Record::file("", "b.txt", r"root\job-2\b.txt", None, 0)),
            );
        assert!(matches!(
            check_job_skeleton(&skipped_level, &tree),
            Err(DspaceError::InvalidPath(_))
        ));

        let twins = Record::directory("", "job", r"root\job-2", Some("job-2".into()))
            .with_child(Record::file("", "a.txt", r"root\job-2\a.txt", None, 0))
            .with_child(Record::file("", "a.txt", r"root\job-2\a.txt", None, 0));
        assert!(matches!(
            check_job_skeleton(&twins, &tree),
            Err(DspaceError::PathConflict(_))
        ));
    }

    #[test]
    fn test_check_job_skeleton_depth_limit() {
        let tree = tree_with_job();
        let mut path = String::from(r"root\job-2");
        let mut chain = Vec::new();
        for i in 2..MAX_DEPTH {
            path.push_str(&format!("\\d{i}"));
            chain.push(path.clone());
        }
        let build = |paths: &[String]| {
            let mut node: Option<Record> = None;
            for p in paths.iter().rev() {
                let mut dir = Record::directory("", "d", p.clone(), None);
                if let Some(child) = node.take() {
                    dir = dir.with_child(child);
                }
                node = Some(dir);
            }
            let job = Record::directory("", "job", r"root\job-2", Some("job-2".into()));
            match node {
                Some(child) => job.with_child(child),
                None => job,
            }
        };

        assert_eq!(VirtualPath::parse(chain.last().unwrap()).unwrap().depth(), MAX_DEPTH);
        check_job_skeleton(&build(&chain), &tree).unwrap();

        chain.push(format!("{path}\\deeper"));
        assert!(matches!(
            check_job_skeleton(&build(&chain), &tree),
            Err(DspaceError::InvalidPath(_))
        ));
    }
}
