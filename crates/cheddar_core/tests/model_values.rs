use chrono::{TimeZone, Utc};
use cheddar_core::{comb_uuid, Filter, Operator, Row, Value};
use serde_json::json;
use uuid::Uuid;

#[test]
fn values_serialize_with_type_tags() {
    let id = Uuid::parse_str("6f1c0a52-8a59-4d2e-9c1b-0a0b0c0d0e0f").unwrap();

    assert_eq!(serde_json::to_value(Value::Null).unwrap(), json!({ "type": "null" }));
    assert_eq!(
        serde_json::to_value(Value::Integer(42)).unwrap(),
        json!({ "type": "integer", "value": 42 })
    );
    assert_eq!(
        serde_json::to_value(Value::Uuid(id)).unwrap(),
        json!({ "type": "uuid", "value": "6f1c0a52-8a59-4d2e-9c1b-0a0b0c0d0e0f" })
    );
}

#[test]
fn tagged_json_decodes_into_values() {
    let decoded: Vec<Value> = serde_json::from_value(json!([
        { "type": "text", "value": "stilton" },
        { "type": "real", "value": 4.5 },
        { "type": "bool", "value": true }
    ]))
    .unwrap();

    assert_eq!(
        decoded,
        vec![Value::from("stilton"), Value::from(4.5), Value::from(true)]
    );
}

#[test]
fn filters_match_rows_in_memory() {
    let row = Row::new()
        .with("name", "gruyere")
        .with("aged_days", 300_i64)
        .with("made_on", Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap());

    let since = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
    assert!(Filter::by("made_on", Operator::Gt, since).matches(&row));
    assert!(Filter::by("aged_days", Operator::Ge, 300).and("name", Operator::Eq, "gruyere").matches(&row));
    assert!(!Filter::by("aged_days", Operator::Lt, 300).matches(&row));
    assert!(!Filter::eq("missing", 1).matches(&row));
}

#[test]
fn comb_uuids_sort_by_creation_time() {
    let first = comb_uuid();
    std::thread::sleep(std::time::Duration::from_millis(2));
    let second = comb_uuid();

    assert_ne!(first, second);
    assert!(first.as_bytes()[8..] < second.as_bytes()[8..]);
}
