use polyjson::bson::{self, BsonParseOptions};
use polyjson::{Error, ParseCode, SemanticTag, Value};

fn parse_code(result: Result<Value, Error>) -> ParseCode {
    match result {
        Err(Error::Parse { code, .. }) => code,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

/// `{"a": 1}` as canonical BSON.
fn simple_doc() -> Vec<u8> {
    vec![
        0x0c, 0x00, 0x00, 0x00, // total size 12
        0x10, b'a', 0x00, // int32 element "a"
        0x01, 0x00, 0x00, 0x00, // 1
        0x00, // terminator
    ]
}

#[test]
fn test_parse_simple_document() {
    let value = bson::from_slice(&simple_doc()).unwrap();
    let mut expected = Value::object();
    expected.insert_or_assign("a", 1i64).unwrap();
    assert_eq!(value, expected);
}

#[test]
fn test_encode_matches_canonical_bytes() {
    let mut value = Value::object();
    value.insert_or_assign("a", 1i64).unwrap();
    assert_eq!(bson::to_vec(&value).unwrap(), simple_doc());
}

#[test]
fn test_element_types() {
    let mut value = Value::object();
    value.insert_or_assign("double", 2.5f64).unwrap();
    value.insert_or_assign("string", "text").unwrap();
    value.insert_or_assign("bool", true).unwrap();
    value.insert_or_assign("null", Value::Null).unwrap();
    value.insert_or_assign("int32", 7i64).unwrap();
    value.insert_or_assign("int64", 5_000_000_000i64).unwrap();
    value
        .insert_or_assign("bin", Value::bytes(vec![9u8, 8], SemanticTag::None))
        .unwrap();
    let mut nested = Value::object();
    nested.insert_or_assign("x", 1i64).unwrap();
    value.insert_or_assign("doc", nested).unwrap();
    value
        .insert_or_assign(
            "arr",
            Value::from(vec![Value::from(1i64), Value::from("two")]),
        )
        .unwrap();

    let encoded = bson::to_vec(&value).unwrap();
    assert_eq!(bson::from_slice(&encoded).unwrap(), value);
}

#[test]
fn test_datetime_round_trip() {
    let mut value = Value::object();
    value
        .insert_or_assign(
            "when",
            Value::Int(1_700_000_000_000, SemanticTag::EpochMillis),
        )
        .unwrap();
    let encoded = bson::to_vec(&value).unwrap();
    // element tag 0x09 after the 4-byte size prefix
    assert_eq!(encoded[4], 0x09);
    let parsed = bson::from_slice(&encoded).unwrap();
    assert_eq!(parsed["when"].tag(), SemanticTag::EpochMillis);
    assert_eq!(parsed, value);
}

#[test]
fn test_objectid_round_trip() {
    let oid: Vec<u8> = (0u8..12).collect();
    let mut value = Value::object();
    value
        .insert_or_assign("_id", Value::bytes(oid, SemanticTag::Base16))
        .unwrap();
    let encoded = bson::to_vec(&value).unwrap();
    assert_eq!(encoded[4], 0x07);
    assert_eq!(bson::from_slice(&encoded).unwrap(), value);
}

#[test]
fn test_uint64_uses_timestamp_element() {
    let mut value = Value::object();
    value.insert_or_assign("t", u64::MAX).unwrap();
    let encoded = bson::to_vec(&value).unwrap();
    assert_eq!(encoded[4], 0x11);
    assert_eq!(bson::from_slice(&encoded).unwrap(), value);
}

#[test]
fn test_declared_size_mismatch() {
    let mut too_large = simple_doc();
    too_large[0] = 0x0d; // declares 13 bytes, actual 12
    assert_eq!(parse_code(bson::from_slice(&too_large)), ParseCode::TooFewItems);

    let mut too_small = simple_doc();
    too_small[0] = 0x0b; // declares 11 bytes, actual 12
    assert_eq!(parse_code(bson::from_slice(&too_small)), ParseCode::TooManyItems);
}

#[test]
fn test_declared_size_past_input() {
    let data = simple_doc();
    // truncate after the element header
    assert_eq!(
        parse_code(bson::from_slice(&data[..7])),
        ParseCode::UnexpectedEof
    );
    assert_eq!(
        parse_code(bson::from_slice(&data[..2])),
        ParseCode::UnexpectedEof
    );
}

#[test]
fn test_invalid_sizes() {
    // declared size below the 5-byte minimum
    assert_eq!(
        parse_code(bson::from_slice(&[0x03, 0x00, 0x00, 0x00, 0x00])),
        ParseCode::SyntaxError
    );
    // string with a zero length prefix
    let data = vec![
        0x0d, 0x00, 0x00, 0x00, 0x02, b's', 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
    ];
    assert_eq!(parse_code(bson::from_slice(&data)), ParseCode::SyntaxError);
}

#[test]
fn test_unknown_element_type() {
    let data = vec![
        0x0c, 0x00, 0x00, 0x00, 0x7e, b'a', 0x00, 0x01, 0x00, 0x00, 0x00, 0x00,
    ];
    assert_eq!(
        parse_code(bson::from_slice(&data)),
        ParseCode::UnknownTypeTag(0x7e)
    );
}

#[test]
fn test_scalar_root_is_rejected_on_encode() {
    assert!(bson::to_vec(&Value::from(1i64)).is_err());
}

#[test]
fn test_max_nesting_depth() {
    let mut value = Value::object();
    let mut nested = Value::object();
    nested.insert_or_assign("x", 1i64).unwrap();
    value.insert_or_assign("a", nested).unwrap();
    let encoded = bson::to_vec(&value).unwrap();
    let options = BsonParseOptions {
        max_nesting_depth: 1,
    };
    assert_eq!(
        parse_code(bson::from_slice_with_options(&encoded, &options)),
        ParseCode::MaxNestingDepthExceeded
    );
}
