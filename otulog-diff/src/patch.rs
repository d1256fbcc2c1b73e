//! Applying a delta to a document.

use crate::delta::{Delta, DeltaOp, Entry, Segment};
use crate::error::{DiffError, DiffResult};
use serde_json::Value;

/// Applies `delta` to `doc`, producing the transformed document.
///
/// Structural mismatches (a path that does not resolve, a removal of a
/// missing entry, a sequence insertion past the end) fail with
/// [`DiffError::MalformedDiff`] and never panic. A `Change` op replaces
/// whatever value sits at its path without comparing it to the recorded old
/// value, so replays over slightly divergent documents degrade to a
/// best-effort overwrite rather than an error.
pub fn apply(delta: &Delta, doc: Value) -> DiffResult<Value> {
    let mut root = doc;

    for op in delta.iter() {
        match op {
            DeltaOp::Change { path, new, .. } => {
                if path.is_empty() {
                    root = new.clone();
                } else {
                    let target = resolve_mut(&mut root, path)?;
                    *target = new.clone();
                }
            }
            DeltaOp::Add { path, entries } => {
                let container = resolve_mut(&mut root, path)?;
                for entry in entries {
                    insert_entry(container, entry, path)?;
                }
            }
            DeltaOp::Remove { path, entries } => {
                let container = resolve_mut(&mut root, path)?;
                // Reverse order keeps earlier sequence positions stable.
                for entry in entries.iter().rev() {
                    remove_entry(container, entry, path)?;
                }
            }
        }
    }

    Ok(root)
}

fn resolve_mut<'a>(root: &'a mut Value, path: &[Segment]) -> DiffResult<&'a mut Value> {
    let mut node = root;

    for segment in path {
        node = match (segment, node) {
            (Segment::Key(key), Value::Object(map)) => map
                .get_mut(key)
                .ok_or_else(|| DiffError::malformed(format!("missing key: {key}")))?,
            (Segment::Index(i), Value::Array(items)) => {
                let len = items.len();
                items
                    .get_mut(*i)
                    .ok_or_else(|| DiffError::malformed(format!("index {i} out of bounds ({len})")))?
            }
            (segment, _) => {
                return Err(DiffError::malformed(format!(
                    "path segment {segment} does not match document shape"
                )));
            }
        };
    }

    Ok(node)
}

fn insert_entry(container: &mut Value, entry: &Entry, path: &[Segment]) -> DiffResult<()> {
    match (&entry.key, container) {
        (Segment::Key(key), Value::Object(map)) => {
            map.insert(key.clone(), entry.value.clone());
            Ok(())
        }
        (Segment::Index(i), Value::Array(items)) => {
            if *i > items.len() {
                return Err(DiffError::malformed(format!(
                    "cannot insert at {i}, sequence has {} elements",
                    items.len()
                )));
            }
            items.insert(*i, entry.value.clone());
            Ok(())
        }
        (key, _) => Err(DiffError::malformed(format!(
            "cannot add {key} at {}: not a matching container",
            format_path(path)
        ))),
    }
}

fn remove_entry(container: &mut Value, entry: &Entry, path: &[Segment]) -> DiffResult<()> {
    match (&entry.key, container) {
        (Segment::Key(key), Value::Object(map)) => map
            .remove(key)
            .map(|_| ())
            .ok_or_else(|| DiffError::malformed(format!("cannot remove missing key: {key}"))),
        (Segment::Index(i), Value::Array(items)) => {
            if *i >= items.len() {
                return Err(DiffError::malformed(format!(
                    "cannot remove index {i}, sequence has {} elements",
                    items.len()
                )));
            }
            items.remove(*i);
            Ok(())
        }
        (key, _) => Err(DiffError::malformed(format!(
            "cannot remove {key} at {}: not a matching container",
            format_path(path)
        ))),
    }
}

fn format_path(path: &[Segment]) -> String {
    if path.is_empty() {
        return "<root>".to_string();
    }
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(".")
}
