//! Structural comparison of two documents.

use crate::delta::{Delta, DeltaOp, Entry, Segment};
use serde_json::Value;

/// Computes the delta transforming `old` into `new`.
///
/// Mappings are compared by key: keys only in `new` become an `Add`, keys
/// only in `old` a `Remove` (both sorted for determinism), and keys present
/// on both sides are compared recursively. Sequences are compared by
/// position over the common prefix, with the longer side's tail becoming a
/// single `Add` or `Remove`. Anything else that differs, scalars included,
/// becomes a `Change` of the whole subtree; so does a node whose container
/// type changed.
///
/// Equal documents produce an empty delta.
#[must_use]
pub fn diff(old: &Value, new: &Value) -> Delta {
    let mut ops = Vec::new();
    diff_value(&mut Vec::new(), old, new, &mut ops);
    Delta(ops)
}

fn diff_value(path: &mut Vec<Segment>, old: &Value, new: &Value, ops: &mut Vec<DeltaOp>) {
    match (old, new) {
        (Value::Object(o), Value::Object(n)) => {
            let mut added = Vec::new();
            let mut removed = Vec::new();

            for (key, value) in n {
                if !o.contains_key(key) {
                    added.push(Entry::new(key.as_str(), value.clone()));
                }
            }

            for (key, value) in o {
                match n.get(key) {
                    None => removed.push(Entry::new(key.as_str(), value.clone())),
                    Some(new_value) => {
                        path.push(Segment::Key(key.clone()));
                        diff_value(path, value, new_value, ops);
                        path.pop();
                    }
                }
            }

            added.sort_by(|a, b| a.key.to_string().cmp(&b.key.to_string()));
            removed.sort_by(|a, b| a.key.to_string().cmp(&b.key.to_string()));

            if !removed.is_empty() {
                ops.push(DeltaOp::Remove {
                    path: path.clone(),
                    entries: removed,
                });
            }

            if !added.is_empty() {
                ops.push(DeltaOp::Add {
                    path: path.clone(),
                    entries: added,
                });
            }
        }

        (Value::Array(o), Value::Array(n)) => {
            let common = o.len().min(n.len());

            for i in 0..common {
                path.push(Segment::Index(i));
                diff_value(path, &o[i], &n[i], ops);
                path.pop();
            }

            if n.len() > o.len() {
                let entries = (common..n.len())
                    .map(|i| Entry::new(i, n[i].clone()))
                    .collect();
                ops.push(DeltaOp::Add {
                    path: path.clone(),
                    entries,
                });
            } else if o.len() > n.len() {
                let entries = (common..o.len())
                    .map(|i| Entry::new(i, o[i].clone()))
                    .collect();
                ops.push(DeltaOp::Remove {
                    path: path.clone(),
                    entries,
                });
            }
        }

        _ => {
            if old != new {
                ops.push(DeltaOp::Change {
                    path: path.clone(),
                    old: old.clone(),
                    new: new.clone(),
                });
            }
        }
    }
}
