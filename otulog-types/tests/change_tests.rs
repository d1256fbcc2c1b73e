use chrono::Utc;
use otulog_diff::diff;
use otulog_types::{
    ChangeDiff, ChangeId, ChangeMethod, ChangeRecord, IndexRef, OtuId, OtuRef, OtuVersion,
    ReferenceRef, UserRef,
};
use pretty_assertions::assert_eq;
use serde_json::json;

fn make_record(diff: ChangeDiff) -> ChangeRecord {
    let otu_id = OtuId::from_string("8dpwlo1x");
    ChangeRecord {
        id: ChangeId::new(&otu_id, OtuVersion::Finite(1)),
        method: ChangeMethod::Modify,
        otu: OtuRef {
            id: otu_id,
            name: "Prunus virus F".to_string(),
            version: OtuVersion::Finite(1),
        },
        reference: ReferenceRef {
            id: "ref_original".to_string(),
        },
        index: IndexRef::unbuilt(),
        diff,
        description: "Edited name".to_string(),
        created_at: Utc::now(),
        user: UserRef {
            id: "igboyes".to_string(),
        },
    }
}

// ── Change ids ──────────────────────────────────────────────────

#[test]
fn change_id_composes_otu_and_version() {
    let id = ChangeId::new(&OtuId::from_string("abc123"), OtuVersion::Finite(4));
    assert_eq!(id.as_str(), "abc123.4");

    let id = ChangeId::new(&OtuId::from_string("abc123"), OtuVersion::Removed);
    assert_eq!(id.as_str(), "abc123.removed");
}

#[test]
fn change_id_parse_splits_components() {
    let id: ChangeId = "abc123.11".parse().unwrap();
    let (otu_id, version) = id.parse().unwrap();
    assert_eq!(otu_id.as_str(), "abc123");
    assert_eq!(version, OtuVersion::Finite(11));

    let id: ChangeId = "abc123.removed".parse().unwrap();
    let (_, version) = id.parse().unwrap();
    assert_eq!(version, OtuVersion::Removed);
}

#[test]
fn change_id_rejects_garbage() {
    assert!("no-separator".parse::<ChangeId>().is_err());
    assert!("abc123.notaversion".parse::<ChangeId>().is_err());
}

// ── OTU ids ─────────────────────────────────────────────────────

#[test]
fn generated_otu_ids_are_alphanumeric() {
    let id = OtuId::generate();
    assert_eq!(id.as_str().len(), 8);
    assert!(id.as_str().chars().all(|c| c.is_ascii_alphanumeric()));
}

#[test]
fn generated_otu_ids_are_distinct() {
    let a = OtuId::generate();
    let b = OtuId::generate();
    assert_ne!(a, b);
}

// ── Build association ───────────────────────────────────────────

#[test]
fn fresh_records_are_revertible() {
    let record = make_record(ChangeDiff::Snapshot(json!({})));
    assert!(record.index.is_unbuilt());
    assert!(record.is_revertible());
}

#[test]
fn build_association_pins_the_record() {
    let mut record = make_record(ChangeDiff::Snapshot(json!({})));
    record.index = IndexRef {
        id: "ptlrcefm".to_string(),
        version: "0".to_string(),
    };
    assert!(!record.is_revertible());
}

// ── Diff field serialization ────────────────────────────────────

#[test]
fn snapshot_diff_serializes_as_document() {
    let record = make_record(ChangeDiff::Snapshot(json!({"name": "A", "version": 0})));
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["diff"]["name"], json!("A"));

    let decoded: ChangeRecord = serde_json::from_value(value).unwrap();
    assert_eq!(decoded.diff, record.diff);
}

#[test]
fn delta_diff_serializes_as_op_list() {
    let delta = diff(&json!({"name": "A"}), &json!({"name": "B"}));
    let record = make_record(ChangeDiff::Delta(delta));
    let value = serde_json::to_value(&record).unwrap();
    assert!(value["diff"].is_array());

    let decoded: ChangeRecord = serde_json::from_value(value).unwrap();
    assert!(decoded.diff.as_delta().is_some());
}

#[test]
fn indirect_diff_serializes_as_file_marker() {
    let record = make_record(ChangeDiff::indirect());
    let value = serde_json::to_value(&record).unwrap();
    assert_eq!(value["diff"], json!("file"));

    let decoded: ChangeRecord = serde_json::from_value(value).unwrap();
    assert!(decoded.diff.is_indirect());
}

#[test]
fn record_roundtrips_through_json() {
    let record = make_record(ChangeDiff::Snapshot(json!({
        "name": "A",
        "isolates": [{"id": "iso_1", "sequences": []}]
    })));
    let encoded = serde_json::to_string(&record).unwrap();
    let decoded: ChangeRecord = serde_json::from_str(&encoded).unwrap();
    assert_eq!(decoded, record);
}
