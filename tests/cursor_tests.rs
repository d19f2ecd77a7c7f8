use polyjson::json::JsonParser;
use polyjson::{Cursor, Event, EventSource, Value};

fn cursor_over(text: &str) -> Cursor<JsonParser> {
    let mut parser = JsonParser::new();
    parser.update(text.as_bytes());
    parser.finish();
    Cursor::new(parser)
}

#[test]
fn test_pull_iteration() {
    let mut cursor = cursor_over(r#"{"a": 1}"#);
    assert!(cursor.current().is_none());
    assert!(matches!(
        cursor.next().unwrap(),
        Some(Event::BeginObject { .. })
    ));
    assert_eq!(cursor.next().unwrap(), Some(&Event::Key("a".to_string())));
    assert!(matches!(cursor.next().unwrap(), Some(Event::Int { value: 1, .. })));
    assert_eq!(cursor.next().unwrap(), Some(&Event::EndObject));
    assert_eq!(cursor.next().unwrap(), None);
    assert!(cursor.done());
}

#[test]
fn test_current_does_not_consume() {
    let mut cursor = cursor_over("[1]");
    cursor.next().unwrap();
    assert!(matches!(cursor.current(), Some(Event::BeginArray { .. })));
    assert!(matches!(cursor.current(), Some(Event::BeginArray { .. })));
}

#[test]
fn test_to_value_materializes_subtree_only() {
    let mut cursor = cursor_over(r#"[{"x": [1, 2]}, "rest"]"#);
    cursor.next().unwrap(); // BeginArray
    cursor.next().unwrap(); // BeginObject
    let subtree = cursor.to_value().unwrap();
    let mut expected = Value::object();
    expected
        .insert_or_assign("x", Value::from(vec![Value::from(1i64), Value::from(2i64)]))
        .unwrap();
    assert_eq!(subtree, expected);

    // the cursor continues right after the subtree
    assert!(matches!(
        cursor.next().unwrap(),
        Some(Event::String { .. })
    ));
}

#[test]
fn test_scalar_to_value() {
    let mut cursor = cursor_over("42");
    cursor.next().unwrap();
    assert_eq!(cursor.to_value().unwrap(), Value::from(42i64));
}

#[test]
fn test_skip_subtree() {
    let mut cursor = cursor_over(r#"[[1, [2, 3]], "after"]"#);
    cursor.next().unwrap(); // outer BeginArray
    cursor.next().unwrap(); // inner BeginArray
    cursor.skip().unwrap();
    let event = cursor.next().unwrap().cloned();
    assert_eq!(
        event,
        Some(Event::String {
            value: "after".to_string(),
            tag: polyjson::SemanticTag::None,
        })
    );
}

#[test]
fn test_array_elements_range() {
    let mut cursor = cursor_over(r#"[1, {"x": 2}, [3]]"#);
    cursor.next().unwrap();
    let mut elements = cursor.array_elements().unwrap();
    assert_eq!(elements.next().unwrap(), Some(Value::from(1i64)));
    let second = elements.next().unwrap().unwrap();
    assert_eq!(second["x"].as_i64().unwrap(), 2);
    assert_eq!(
        elements.next().unwrap(),
        Some(Value::from(vec![Value::from(3i64)]))
    );
    assert_eq!(elements.next().unwrap(), None);
    assert_eq!(elements.next().unwrap(), None);
}

#[test]
fn test_object_members_range() {
    let mut cursor = cursor_over(r#"{"a": 1, "b": {"c": 2}}"#);
    cursor.next().unwrap();
    let mut members = cursor.object_members().unwrap();
    let (name, value) = members.next().unwrap().unwrap();
    assert_eq!(name, "a");
    assert_eq!(value, Value::from(1i64));
    let (name, value) = members.next().unwrap().unwrap();
    assert_eq!(name, "b");
    assert_eq!(value["c"].as_i64().unwrap(), 2);
    assert_eq!(members.next().unwrap(), None);
}

#[test]
fn test_range_on_wrong_event_fails() {
    let mut cursor = cursor_over("[1]");
    cursor.next().unwrap();
    assert!(cursor.object_members().is_err());
}

#[test]
fn test_incremental_feeding_through_cursor() {
    let mut cursor = Cursor::new(JsonParser::new());
    cursor.update(b"[1,");
    assert!(matches!(
        cursor.next().unwrap(),
        Some(Event::BeginArray { .. })
    ));
    assert!(matches!(cursor.next().unwrap(), Some(Event::Int { .. })));
    // suspended: no more buffered input
    assert_eq!(cursor.next().unwrap(), None);
    assert!(!cursor.done());
    cursor.update(b"2]");
    cursor.finish();
    assert!(matches!(cursor.next().unwrap(), Some(Event::Int { .. })));
    assert_eq!(cursor.next().unwrap(), Some(&Event::EndArray));
    assert_eq!(cursor.next().unwrap(), None);
    assert!(cursor.done());
}

#[test]
fn test_cursor_over_binary_source() {
    let mut parser = polyjson::cbor::CborParser::new();
    parser.update(&[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x82, 0x02, 0x03]);
    parser.finish();
    let mut cursor = Cursor::new(parser);
    cursor.next().unwrap();
    let mut members = cursor.object_members().unwrap();
    let (name, value) = members.next().unwrap().unwrap();
    assert_eq!((name.as_str(), value), ("a", Value::from(1u64)));
    let (name, value) = members.next().unwrap().unwrap();
    assert_eq!(name, "b");
    assert_eq!(value.len(), 2);
    assert_eq!(members.next().unwrap(), None);
}
