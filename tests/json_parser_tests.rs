use polyjson::json::{self, JsonParseOptions, JsonParser};
use polyjson::{Error, EventSource, Kind, ParseCode, SemanticTag, Value};

fn parse_code(result: Result<Value, Error>) -> ParseCode {
    match result {
        Err(Error::Parse { code, .. }) => code,
        other => panic!("expected a parse error, got {other:?}"),
    }
}

#[test]
fn test_parse_scalars() {
    assert_eq!(json::from_str("null").unwrap(), Value::Null);
    assert_eq!(json::from_str("true").unwrap(), Value::from(true));
    assert_eq!(json::from_str("false").unwrap(), Value::from(false));
    assert_eq!(json::from_str("42").unwrap(), Value::from(42i64));
    assert_eq!(json::from_str("-7").unwrap(), Value::from(-7i64));
    assert_eq!(json::from_str("1.25").unwrap(), Value::from(1.25f64));
    assert_eq!(json::from_str("\"hi\"").unwrap(), Value::from("hi"));
}

#[test]
fn test_parse_containers() {
    let value = json::from_str(r#"{"a": [1, 2, {"b": null}], "c": "x"}"#).unwrap();
    assert_eq!(value["a"].len(), 3);
    assert_eq!(value["a"][0].as_i64().unwrap(), 1);
    assert!(value["a"][2]["b"].is_null());
    assert_eq!(value["c"].as_str().unwrap(), "x");

    assert_eq!(json::from_str("[]").unwrap(), Value::array());
    assert_eq!(json::from_str("{}").unwrap(), Value::object());
    assert_eq!(json::from_str(" [ ] ").unwrap(), Value::array());
}

#[test]
fn test_parse_preserves_insertion_order() {
    let value = json::from_str(r#"{"z": 1, "a": 2, "m": 3}"#).unwrap();
    let Value::Object(map) = &value else {
        panic!("expected an object");
    };
    let keys: Vec<&str> = map.keys().collect();
    assert_eq!(keys, ["z", "a", "m"]);
}

#[test]
fn test_duplicate_keys_keep_last_value() {
    let value = json::from_str(r#"{"a": 1, "a": 2}"#).unwrap();
    assert_eq!(value.len(), 1);
    assert_eq!(value["a"].as_i64().unwrap(), 2);
}

#[test]
fn test_escapes() {
    assert_eq!(
        json::from_str(r#""line\nbreak\ttab \"quoted\" back\\slash""#)
            .unwrap()
            .as_str()
            .unwrap(),
        "line\nbreak\ttab \"quoted\" back\\slash"
    );
    assert_eq!(
        json::from_str(r#""Aé""#).unwrap().as_str().unwrap(),
        "Aé"
    );
    // surrogate pair
    assert_eq!(
        json::from_str(r#""😀""#).unwrap().as_str().unwrap(),
        "😀"
    );
}

#[test]
fn test_invalid_escapes() {
    assert_eq!(
        parse_code(json::from_str(r#""\q""#)),
        ParseCode::InvalidEscape
    );
    // lone high surrogate
    assert_eq!(
        parse_code(json::from_str(r#""\ud800""#)),
        ParseCode::InvalidEscape
    );
    // low surrogate without a preceding high
    assert_eq!(
        parse_code(json::from_str(r#""\udc00x""#)),
        ParseCode::InvalidEscape
    );
    // raw control character
    assert_eq!(
        parse_code(json::from_str("\"a\u{1}b\"")),
        ParseCode::SyntaxError
    );
}

#[test]
fn test_illegal_utf8() {
    assert_eq!(
        parse_code(json::from_slice(b"\"\xff\xfe\"")),
        ParseCode::IllegalUtf8
    );
}

#[test]
fn test_numbers_stay_exact() {
    // int64/uint64 boundaries
    assert_eq!(
        json::from_str("9223372036854775807").unwrap(),
        Value::from(i64::MAX)
    );
    assert_eq!(
        json::from_str("-9223372036854775808").unwrap(),
        Value::from(i64::MIN)
    );
    assert_eq!(
        json::from_str("18446744073709551615").unwrap(),
        Value::from(u64::MAX)
    );

    // 2^64 does not fit either width: bignum-tagged decimal string
    let big = json::from_str("18446744073709551616").unwrap();
    assert_eq!(big.tag(), SemanticTag::BigInt);
    assert_eq!(big.as_str().unwrap(), "18446744073709551616");

    let negative_big = json::from_str("-9223372036854775809").unwrap();
    assert_eq!(negative_big.tag(), SemanticTag::BigInt);
    assert_eq!(negative_big.as_str().unwrap(), "-9223372036854775809");
}

#[test]
fn test_double_parsing() {
    let value = json::from_str("42.229999999999997").unwrap();
    assert_eq!(value.kind(), Kind::Double);
    assert_eq!(value.as_f64().unwrap(), 42.229999999999997f64);

    assert_eq!(json::from_str("1e3").unwrap().as_f64().unwrap(), 1000.0);
    assert_eq!(json::from_str("2.5e-2").unwrap().as_f64().unwrap(), 0.025);
    assert_eq!(json::from_str("-0.5").unwrap().as_f64().unwrap(), -0.5);

    // overflow to infinity is an error, not a silent inf
    assert_eq!(
        parse_code(json::from_str("1e999")),
        ParseCode::NumberTooLarge
    );
}

#[test]
fn test_number_syntax_errors() {
    assert_eq!(parse_code(json::from_str("01")), ParseCode::SyntaxError);
    assert_eq!(parse_code(json::from_str("1.")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("[1.]")), ParseCode::SyntaxError);
    assert_eq!(parse_code(json::from_str("-")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("1e")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("1x")), ParseCode::SyntaxError);
}

#[test]
fn test_trailing_comma_strict_then_lenient() {
    // spec scenario: strict parse fails at the trailing comma
    let text = r#"{"a":1,"b":2,}"#;
    assert_eq!(parse_code(json::from_str(text)), ParseCode::SyntaxError);

    let options = JsonParseOptions {
        allow_trailing_comma: true,
        ..Default::default()
    };
    let value = json::from_str_with_options(text, &options).unwrap();
    let mut expected = Value::object();
    expected.insert_or_assign("a", 1i64).unwrap();
    expected.insert_or_assign("b", 2i64).unwrap();
    assert_eq!(value, expected);

    assert_eq!(
        json::from_str_with_options("[1,2,]", &options).unwrap(),
        json::from_str("[1,2]").unwrap()
    );
    // a trailing comma never licenses an empty slot
    assert!(json::from_str_with_options("[,]", &options).is_err());
    assert!(json::from_str_with_options(r#"{"a":,}"#, &options).is_err());
}

#[test]
fn test_comments_opt_in() {
    let text = "{\"a\": /* inline */ 1 // tail\n}";
    assert_eq!(parse_code(json::from_str(text)), ParseCode::SyntaxError);

    let options = JsonParseOptions {
        allow_comments: true,
        ..Default::default()
    };
    let value = json::from_str_with_options(text, &options).unwrap();
    assert_eq!(value["a"].as_i64().unwrap(), 1);

    // unterminated block comment
    assert_eq!(
        parse_code(json::from_str_with_options("[1] /* open", &options)),
        ParseCode::UnexpectedEof
    );
}

#[test]
fn test_max_nesting_depth() {
    let options = JsonParseOptions {
        max_nesting_depth: 4,
        ..Default::default()
    };
    assert!(json::from_str_with_options("[[[[1]]]]", &options).is_ok());
    assert_eq!(
        parse_code(json::from_str_with_options("[[[[[1]]]]]", &options)),
        ParseCode::MaxNestingDepthExceeded
    );

    // a deeply nested bomb is a recoverable error, not a stack overflow
    let bomb = "[".repeat(100_000);
    assert_eq!(
        parse_code(json::from_str(&bomb)),
        ParseCode::MaxNestingDepthExceeded
    );
}

#[test]
fn test_structural_errors() {
    assert_eq!(parse_code(json::from_str("")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("[1,")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("\"open")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("[1 2]")), ParseCode::SyntaxError);
    assert_eq!(parse_code(json::from_str("{1: 2}")), ParseCode::SyntaxError);
    assert_eq!(
        parse_code(json::from_str(r#"{"a" 1}"#)),
        ParseCode::SyntaxError
    );
    assert_eq!(parse_code(json::from_str("[1] x")), ParseCode::SyntaxError);
    assert_eq!(parse_code(json::from_str("tru")), ParseCode::UnexpectedEof);
    assert_eq!(parse_code(json::from_str("trux")), ParseCode::SyntaxError);
    assert_eq!(parse_code(json::from_str("]")), ParseCode::SyntaxError);
}

#[test]
fn test_failure_position_stays_queryable() {
    let mut parser = JsonParser::new();
    parser.update(b"{\"a\": 1,\n  \"b\" 2}");
    parser.finish();
    let mut last = Ok(());
    loop {
        match parser.next_event() {
            Ok(Some(_)) => continue,
            Ok(None) => break,
            Err(e) => {
                last = Err(e);
                break;
            }
        }
    }
    let err = last.unwrap_err();
    assert_eq!(err.parse_code(), Some(ParseCode::SyntaxError));
    assert_eq!(parser.line(), 2);
    // the error repeats on further calls instead of emitting events
    assert!(parser.next_event().is_err());
}

#[test]
fn test_parser_reset_reuses_scratch() {
    let mut parser = JsonParser::new();
    parser.update(b"\"first document\"");
    parser.finish();
    assert!(parser.next_event().unwrap().is_some());
    parser.reset();
    parser.update(b"[2]");
    parser.finish();
    let mut events = 0;
    while parser.next_event().unwrap().is_some() {
        events += 1;
    }
    assert_eq!(events, 3);
    assert!(parser.done());
}
