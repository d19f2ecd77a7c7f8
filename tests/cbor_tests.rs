use polyjson::cbor::{self, CborEncodeOptions, CborParseOptions};
use polyjson::{Error, ParseCode, SemanticTag, Value};

fn parse_code(result: Result<Value, Error>) -> ParseCode {
    match result {
        Err(Error::Parse { code, .. }) => code,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_two_entry_map_matches_programmatic_value() {
    // spec scenario: A2 61 61 01 61 62 02 is {"a":1,"b":2}
    let value = cbor::from_slice(&[0xa2, 0x61, 0x61, 0x01, 0x61, 0x62, 0x02]).unwrap();
    let mut expected = Value::object();
    expected.insert_or_assign("a", 1i64).unwrap();
    expected.insert_or_assign("b", 2i64).unwrap();
    assert_eq!(value, expected);
}

#[test]
fn test_scalars() {
    assert_eq!(cbor::from_slice(&[0xf6]).unwrap(), Value::Null);
    assert_eq!(cbor::from_slice(&[0xf7]).unwrap(), Value::Null); // undefined
    assert_eq!(cbor::from_slice(&[0xf4]).unwrap(), Value::from(false));
    assert_eq!(cbor::from_slice(&[0xf5]).unwrap(), Value::from(true));
    assert_eq!(cbor::from_slice(&[0x00]).unwrap(), Value::from(0u64));
    assert_eq!(cbor::from_slice(&[0x17]).unwrap(), Value::from(23u64));
    assert_eq!(cbor::from_slice(&[0x18, 0x18]).unwrap(), Value::from(24u64));
    assert_eq!(cbor::from_slice(&[0x20]).unwrap(), Value::from(-1i64));
    assert_eq!(
        cbor::from_slice(&[0x39, 0x03, 0xe7]).unwrap(),
        Value::from(-1000i64)
    );
    assert_eq!(
        cbor::from_slice(&[0x64, b't', b'e', b'x', b't']).unwrap(),
        Value::from("text")
    );
    assert_eq!(
        cbor::from_slice(&[0x43, 1, 2, 3]).unwrap(),
        Value::bytes(vec![1u8, 2, 3], SemanticTag::None)
    );
}

#[test]
fn test_floats() {
    // f64
    let value = cbor::from_slice(&[0xfb, 0x40, 0x09, 0x21, 0xfb, 0x54, 0x44, 0x2d, 0x18]).unwrap();
    assert_eq!(value.as_f64().unwrap(), std::f64::consts::PI);
    // f32
    let value = cbor::from_slice(&[0xfa, 0x3f, 0x80, 0x00, 0x00]).unwrap();
    assert_eq!(value.as_f64().unwrap(), 1.0);
    // f16 half precision: 1.0 and -2.0
    assert_eq!(
        cbor::from_slice(&[0xf9, 0x3c, 0x00]).unwrap().as_f64().unwrap(),
        1.0
    );
    assert_eq!(
        cbor::from_slice(&[0xf9, 0xc0, 0x00]).unwrap().as_f64().unwrap(),
        -2.0
    );
}

#[test]
fn test_indefinite_containers_and_strings() {
    // [_ 1, [_ 2]] with break terminators
    let value = cbor::from_slice(&[0x9f, 0x01, 0x9f, 0x02, 0xff, 0xff]).unwrap();
    assert_eq!(value[0].as_i64().unwrap(), 1);
    assert_eq!(value[1][0].as_i64().unwrap(), 2);

    // {_ "a": 1}
    let value = cbor::from_slice(&[0xbf, 0x61, 0x61, 0x01, 0xff]).unwrap();
    assert_eq!(value["a"].as_i64().unwrap(), 1);

    // (_ "ab" "c") chunked text string
    let value =
        cbor::from_slice(&[0x7f, 0x62, b'a', b'b', 0x61, b'c', 0xff]).unwrap();
    assert_eq!(value.as_str().unwrap(), "abc");

    // chunked byte string
    let value = cbor::from_slice(&[0x5f, 0x41, 0x01, 0x42, 0x02, 0x03, 0xff]).unwrap();
    assert_eq!(value.as_bytes().unwrap(), &[1, 2, 3]);
}

#[test]
fn test_bignum_tags() {
    // tag 2, 9 bytes: 2^64
    let mut data = vec![0xc2, 0x49, 0x01];
    data.extend_from_slice(&[0; 8]);
    let value = cbor::from_slice(&data).unwrap();
    assert_eq!(value.tag(), SemanticTag::BigInt);
    assert_eq!(value.as_str().unwrap(), "18446744073709551616");

    // tag 3: -1 - n
    let value = cbor::from_slice(&[0xc3, 0x41, 0x00]).unwrap();
    assert_eq!(value.as_str().unwrap(), "-1");

    // encoding a bignum-tagged string round-trips through tags 2/3
    let big = Value::string_tagged("18446744073709551616", SemanticTag::BigInt);
    let encoded = cbor::to_vec(&big).unwrap();
    assert_eq!(encoded, data);
    assert_eq!(cbor::from_slice(&encoded).unwrap(), big);

    let negative = Value::string_tagged("-18446744073709551617", SemanticTag::BigInt);
    let encoded = cbor::to_vec(&negative).unwrap();
    assert_eq!(cbor::from_slice(&encoded).unwrap(), negative);
}

#[test]
fn test_decimal_fraction_tag() {
    // tag 4, [-2, 27315] => 273.15
    let data = [0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3];
    let value = cbor::from_slice(&data).unwrap();
    assert_eq!(value.tag(), SemanticTag::BigDec);
    assert_eq!(value.as_str().unwrap(), "273.15");

    // and back
    let encoded = cbor::to_vec(&value).unwrap();
    assert_eq!(encoded, data);
}

#[test]
fn test_datetime_and_epoch_tags() {
    // tag 0 + text
    let mut data = vec![0xc0, 0x74];
    data.extend_from_slice(b"2026-08-07T00:00:00Z");
    let value = cbor::from_slice(&data).unwrap();
    assert_eq!(value.tag(), SemanticTag::DateTime);
    assert_eq!(value.as_str().unwrap(), "2026-08-07T00:00:00Z");
    assert_eq!(cbor::to_vec(&value).unwrap(), data);

    // tag 1 + uint
    let data = [0xc1, 0x19, 0x05, 0x39];
    let value = cbor::from_slice(&data).unwrap();
    assert_eq!(value.tag(), SemanticTag::EpochSeconds);
    assert_eq!(value.as_u64().unwrap(), 1337);
    assert_eq!(cbor::to_vec(&value).unwrap(), data);
}

#[test]
fn test_base_encoding_tags_on_byte_strings() {
    // tag 23 (expected base16) + 2 bytes
    let value = cbor::from_slice(&[0xd7, 0x42, 0x01, 0xff]).unwrap();
    assert_eq!(value.tag(), SemanticTag::Base16);
    assert_eq!(value.as_bytes().unwrap(), &[0x01, 0xff]);
    assert_eq!(cbor::to_vec(&value).unwrap(), vec![0xd7, 0x42, 0x01, 0xff]);
}

#[test]
fn test_string_reference_packing() {
    let strings = vec![
        Value::from("hello"),
        Value::from("hello"),
        Value::from("hi"),
        Value::from("hello"),
    ];
    let value = Value::from(strings);
    let options = CborEncodeOptions { pack_strings: true };
    let packed = cbor::to_vec_with_options(&value, &options).unwrap();
    let plain = cbor::to_vec(&value).unwrap();
    assert!(packed.len() < plain.len());
    // tag 256 namespace prefix
    assert_eq!(&packed[..3], &[0xd9, 0x01, 0x00]);
    // references resolve on parse
    assert_eq!(cbor::from_slice(&packed).unwrap(), value);
}

#[test]
fn test_integer_keys_are_stringified() {
    // {1: "x"}
    let value = cbor::from_slice(&[0xa1, 0x01, 0x61, b'x']).unwrap();
    assert_eq!(value["1"].as_str().unwrap(), "x");
}

#[test]
fn test_declared_length_past_input_is_an_error() {
    // byte string declaring 200 bytes with 2 present
    assert_eq!(
        parse_code(cbor::from_slice(&[0x58, 0xc8, 0x01, 0x02])),
        ParseCode::UnexpectedEof
    );
    // array declaring 3 items with 1 present
    assert_eq!(
        parse_code(cbor::from_slice(&[0x83, 0x01])),
        ParseCode::UnexpectedEof
    );
    // truncated float
    assert_eq!(
        parse_code(cbor::from_slice(&[0xfb, 0x40, 0x09])),
        ParseCode::UnexpectedEof
    );
}

#[test]
fn test_malformed_heads() {
    // reserved additional info
    assert_eq!(
        parse_code(cbor::from_slice(&[0x1c])),
        ParseCode::SyntaxError
    );
    // break outside an indefinite container
    assert_eq!(
        parse_code(cbor::from_slice(&[0xff])),
        ParseCode::SyntaxError
    );
    // stringref with no namespace
    assert_eq!(
        parse_code(cbor::from_slice(&[0xd8, 0x19, 0x00])),
        ParseCode::SyntaxError
    );
}

#[test]
fn test_max_nesting_depth() {
    let options = CborParseOptions {
        max_nesting_depth: 3,
    };
    let ok = [0x81, 0x81, 0x81, 0x01];
    assert!(cbor::from_slice_with_options(&ok, &CborParseOptions::default()).is_ok());
    let too_deep = [0x81, 0x81, 0x81, 0x81, 0x01];
    assert_eq!(
        parse_code(cbor::from_slice_with_options(&too_deep, &options)),
        ParseCode::MaxNestingDepthExceeded
    );
}

#[test]
fn test_trailing_data() {
    assert!(matches!(
        cbor::from_slice(&[0x01, 0x02]),
        Err(Error::TrailingData(1))
    ));
}

#[test]
fn test_size_hints_flow_to_builder() {
    // definite array keeps insertion order and parses fully
    let value = cbor::from_slice(&[0x83, 0x01, 0x02, 0x03]).unwrap();
    assert_eq!(value.len(), 3);
    assert_eq!(value, json_like(&[1, 2, 3]));
}

fn json_like(items: &[i64]) -> Value {
    Value::from(items.iter().map(|&i| Value::from(i)).collect::<Vec<_>>())
}
