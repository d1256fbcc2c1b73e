//! Joining and splitting OTU documents.
//!
//! In storage an OTU is a root document plus flat sequence documents, each
//! sequence carrying `otu_id` and `isolate_id` fields. The joined form nests
//! the sequences inside their isolates under a `sequences` key. These are
//! pure structural transforms; `merge_otu(split_otu(x)) == x` for any
//! well-formed joined document.

use serde_json::Value;

/// Merges flat sequence documents into an OTU root document.
///
/// Each isolate in the root gains a `sequences` array holding the sequences
/// whose `isolate_id` matches its `id`. A root without an `isolates` array
/// is returned unchanged.
#[must_use]
pub fn merge_otu(mut root: Value, sequences: Vec<Value>) -> Value {
    if let Some(isolates) = root.get_mut("isolates").and_then(Value::as_array_mut) {
        for isolate in isolates {
            let isolate_id = isolate
                .get("id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let matching: Vec<Value> = sequences
                .iter()
                .filter(|sequence| {
                    sequence.get("isolate_id").and_then(Value::as_str)
                        == Some(isolate_id.as_str())
                })
                .cloned()
                .collect();

            if let Some(isolate) = isolate.as_object_mut() {
                isolate.insert("sequences".to_string(), Value::Array(matching));
            }
        }
    }

    root
}

/// Splits a joined OTU document into a root document and its flat sequence
/// documents.
///
/// The `sequences` arrays are removed from each isolate and their contents
/// returned separately, ready for insertion into the sequence collection.
#[must_use]
pub fn split_otu(joined: &Value) -> (Value, Vec<Value>) {
    let mut root = joined.clone();
    let mut sequences = Vec::new();

    if let Some(isolates) = root.get_mut("isolates").and_then(Value::as_array_mut) {
        for isolate in isolates {
            if let Some(isolate) = isolate.as_object_mut() {
                if let Some(Value::Array(isolate_sequences)) = isolate.remove("sequences") {
                    sequences.extend(isolate_sequences);
                }
            }
        }
    }

    (root, sequences)
}

/// Returns the isolate with the given id from a joined OTU document.
#[must_use]
pub fn find_isolate<'a>(joined: &'a Value, isolate_id: &str) -> Option<&'a Value> {
    joined
        .get("isolates")?
        .as_array()?
        .iter()
        .find(|isolate| isolate.get("id").and_then(Value::as_str) == Some(isolate_id))
}

/// Returns the ids of all isolates in a joined OTU document.
#[must_use]
pub fn extract_isolate_ids(joined: &Value) -> Vec<String> {
    joined
        .get("isolates")
        .and_then(Value::as_array)
        .map(|isolates| {
            isolates
                .iter()
                .filter_map(|isolate| isolate.get("id").and_then(Value::as_str))
                .map(ToString::to_string)
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the ids of all sequences in a joined OTU document.
#[must_use]
pub fn extract_sequence_ids(joined: &Value) -> Vec<String> {
    let Some(isolates) = joined.get("isolates").and_then(Value::as_array) else {
        return Vec::new();
    };

    isolates
        .iter()
        .filter_map(|isolate| isolate.get("sequences").and_then(Value::as_array))
        .flatten()
        .filter_map(|sequence| sequence.get("id").and_then(Value::as_str))
        .map(ToString::to_string)
        .collect()
}
