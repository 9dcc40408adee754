use super::*;
use serde_json::json;

fn params(value: JsonValue) -> ItemParameters {
    ItemParameters::from_json(value).unwrap()
}

#[test]
fn test_required_str_missing_or_empty() {
    let p = params(json!([{"boardId": "b1", "itemId": ""}]));
    assert_eq!(p.required_str("boardId", 0).unwrap(), "b1");

    let err = p.required_str("itemId", 0).unwrap_err();
    assert!(matches!(err, Error::MissingParameter { ref name, item: 0 } if name == "itemId"));

    let err = p.required_str("boardId", 3).unwrap_err();
    assert!(matches!(err, Error::MissingParameter { item: 3, .. }));
}

#[test]
fn test_numbers_are_stringified() {
    let p = params(json!({"conversationId": 42}));
    assert_eq!(p.required_str("conversationId", 0).unwrap(), "42");
}

#[test]
fn test_dotted_lookup() {
    let p = params(json!({
        "additionalFields": {"pollingInterval": 5, "maxWaitTime": "30"},
        "a.b": "literal"
    }));
    assert_eq!(p.f64_or("additionalFields.pollingInterval", 0, 20.0), 5.0);
    assert_eq!(p.f64_or("additionalFields.maxWaitTime", 0, 600.0), 30.0);
    assert_eq!(p.f64_or("additionalFields.missing", 0, 600.0), 600.0);
    assert_eq!(p.str_or("a.b", 0, ""), "literal");
}

#[test]
fn test_bool_or() {
    let p = params(json!({"yes": true, "no": "false", "one": 1, "zero": 0}));
    assert!(p.bool_or("yes", 0, false));
    assert!(!p.bool_or("no", 0, true));
    assert!(p.bool_or("one", 0, false));
    assert!(!p.bool_or("zero", 0, true));
    assert!(p.bool_or("absent", 0, true));
}

#[test]
fn test_json_value() {
    let p = params(json!({
        "inline": [{"a": 1}],
        "text": "{\"b\": 2}",
        "blank": "  ",
        "broken": "{nope"
    }));
    assert_eq!(p.json_value("inline", 0).unwrap(), Some(json!([{"a": 1}])));
    assert_eq!(p.json_value("text", 0).unwrap(), Some(json!({"b": 2})));
    assert_eq!(p.json_value("blank", 0).unwrap(), None);
    assert!(matches!(
        p.json_value("broken", 0),
        Err(Error::InvalidParameter { .. })
    ));
}

#[test]
fn test_from_json_rejects_scalars() {
    assert!(ItemParameters::from_json(json!([1, 2])).is_err());
    assert!(ItemParameters::from_json(json!("x")).is_err());
    assert_eq!(params(json!([{}, {}])).item_count(), 2);
}
