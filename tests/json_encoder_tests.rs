use polyjson::json::{self, ByteStringFormat, Indent, JsonEncodeOptions};
use polyjson::{SemanticTag, Value};

fn doc() -> Value {
    let mut value = Value::object();
    value.insert_or_assign("a", 1i64).unwrap();
    value
        .insert_or_assign("b", Value::from(vec![Value::from(1i64), Value::from(2i64)]))
        .unwrap();
    value
}

#[test]
fn test_compact_output() {
    assert_eq!(json::to_string(&doc()).unwrap(), r#"{"a":1,"b":[1,2]}"#);
    assert_eq!(json::to_string(&Value::Null).unwrap(), "null");
    assert_eq!(json::to_string(&Value::array()).unwrap(), "[]");
    assert_eq!(json::to_string(&Value::object()).unwrap(), "{}");
    assert_eq!(json::to_string(&Value::from("x")).unwrap(), "\"x\"");
}

#[test]
fn test_pretty_output() {
    let expected = "{\n  \"a\": 1,\n  \"b\": [\n    1,\n    2\n  ]\n}";
    assert_eq!(json::to_string_pretty(&doc()).unwrap(), expected);
    assert_eq!(json::to_string_pretty(&Value::object()).unwrap(), "{}");

    let wide = JsonEncodeOptions {
        indent: Indent::Pretty,
        indent_width: 4,
        ..Default::default()
    };
    let bytes = json::to_vec_with_options(&json::from_str("[1]").unwrap(), &wide).unwrap();
    assert_eq!(String::from_utf8(bytes).unwrap(), "[\n    1\n]");
}

#[test]
fn test_string_escaping() {
    assert_eq!(
        json::to_string(&Value::from("a\"b\\c\nd\te\u{8}")).unwrap(),
        r#""a\"b\\c\nd\te\b""#
    );
    assert_eq!(
        json::to_string(&Value::from("\u{1}")).unwrap(),
        r#""\u0001""#
    );
    // non-ASCII passes through raw by default
    assert_eq!(json::to_string(&Value::from("é")).unwrap(), "\"é\"");
}

#[test]
fn test_escape_all_non_ascii() {
    let options = JsonEncodeOptions {
        escape_all_non_ascii: true,
        ..Default::default()
    };
    let encoded =
        json::to_vec_with_options(&Value::from("aé😀"), &options).unwrap();
    assert_eq!(
        String::from_utf8(encoded).unwrap(),
        r#""a\u00e9\ud83d\ude00""#
    );
}

#[test]
fn test_double_shortest_round_trip() {
    assert_eq!(json::to_string(&Value::double(1.5)).unwrap(), "1.5");
    assert_eq!(json::to_string(&Value::double(10.0)).unwrap(), "10.0");
    assert_eq!(json::to_string(&Value::double(0.25)).unwrap(), "0.25");
    assert_eq!(
        json::to_string(&Value::double(std::f64::consts::PI)).unwrap(),
        "3.141592653589793"
    );
    assert_eq!(json::to_string(&Value::double(1e300)).unwrap(), "1e300");
    assert_eq!(json::to_string(&Value::double(2.5e-9)).unwrap(), "2.5e-9");
    // non-finite degrades to null in text JSON
    assert_eq!(json::to_string(&Value::double(f64::NAN)).unwrap(), "null");
    assert_eq!(
        json::to_string(&Value::double(f64::INFINITY)).unwrap(),
        "null"
    );
}

#[test]
fn test_precision_hint_reproduces_source_digits() {
    // spec scenario: the re-encoded literal must not collapse to 42.23
    let value = json::from_str("42.229999999999997").unwrap();
    assert_eq!(json::to_string(&value).unwrap(), "42.229999999999997");

    let value = json::from_str("0.1").unwrap();
    assert_eq!(json::to_string(&value).unwrap(), "0.1");
    let value = json::from_str("100.0").unwrap();
    assert_eq!(json::to_string(&value).unwrap(), "100.0");
}

#[test]
fn test_bignum_writes_raw_digits() {
    let value = json::from_str("18446744073709551616").unwrap();
    assert_eq!(json::to_string(&value).unwrap(), "18446744073709551616");

    // a big-tagged string that is not a number falls back to quoting
    let bogus = Value::string_tagged("not a number", SemanticTag::BigInt);
    assert_eq!(json::to_string(&bogus).unwrap(), "\"not a number\"");
}

#[test]
fn test_byte_strings_render_per_tag() {
    let data = vec![0x01u8, 0xff];
    assert_eq!(
        json::to_string(&Value::bytes(data.clone(), SemanticTag::Base16)).unwrap(),
        "\"01FF\""
    );
    assert_eq!(
        json::to_string(&Value::bytes(data.clone(), SemanticTag::Base64)).unwrap(),
        "\"Af8=\""
    );
    assert_eq!(
        json::to_string(&Value::bytes(data.clone(), SemanticTag::Base64Url)).unwrap(),
        "\"Af8\""
    );
    // untagged bytes follow the configured default
    assert_eq!(
        json::to_string(&Value::bytes(data.clone(), SemanticTag::None)).unwrap(),
        "\"Af8=\""
    );
    let options = JsonEncodeOptions {
        byte_string_format: ByteStringFormat::Base16,
        ..Default::default()
    };
    assert_eq!(
        String::from_utf8(
            json::to_vec_with_options(&Value::bytes(data, SemanticTag::None), &options).unwrap()
        )
        .unwrap(),
        "\"01FF\""
    );
}

#[test]
fn test_noesc_skips_escaping() {
    let value = Value::string_tagged("plain ascii", SemanticTag::NoEsc);
    assert_eq!(json::to_string(&value).unwrap(), "\"plain ascii\"");
}

#[test]
fn test_display_is_compact_json() {
    assert_eq!(format!("{}", doc()), r#"{"a":1,"b":[1,2]}"#);
}

#[test]
fn test_to_writer() {
    let mut out = Vec::new();
    json::to_writer(&mut out, &doc()).unwrap();
    assert_eq!(out, br#"{"a":1,"b":[1,2]}"#);
}
