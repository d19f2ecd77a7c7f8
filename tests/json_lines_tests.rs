use polyjson::{Value, json_lines};

#[test]
fn test_parse_lines() {
    let text = "{\"a\": 1}\n[1, 2]\n\n\"last\"\n";
    let values = json_lines::from_str(text).unwrap();
    assert_eq!(values.len(), 3);
    assert_eq!(values[0]["a"].as_i64().unwrap(), 1);
    assert_eq!(values[1].len(), 2);
    assert_eq!(values[2].as_str().unwrap(), "last");
}

#[test]
fn test_missing_final_newline() {
    let values = json_lines::from_str("1\n2").unwrap();
    assert_eq!(values, vec![Value::from(1i64), Value::from(2i64)]);
}

#[test]
fn test_error_carries_through() {
    assert!(json_lines::from_str("{\"a\": 1}\n{bad}\n").is_err());
}

#[test]
fn test_encode_lines() {
    let values = vec![
        polyjson::json::from_str("{\"a\":1}").unwrap(),
        Value::from(vec![Value::from(2i64)]),
    ];
    assert_eq!(json_lines::to_string(&values).unwrap(), "{\"a\":1}\n[2]\n");
}

#[test]
fn test_round_trip() {
    let values = json_lines::from_str("{\"x\": [1, 2]}\ntrue\n").unwrap();
    let encoded = json_lines::to_string(&values).unwrap();
    assert_eq!(json_lines::from_str(&encoded).unwrap(), values);
}
