//! Feeding a parser one byte at a time must produce the identical event
//! sequence as feeding the whole document at once — the parsers must be
//! re-entrant at every byte boundary.

use polyjson::bson::BsonParser;
use polyjson::cbor::CborParser;
use polyjson::json::JsonParser;
use polyjson::msgpack::MsgpackParser;
use polyjson::ubjson::UbjsonParser;
use polyjson::{Event, EventSource};

fn drain<S: EventSource>(parser: &mut S, events: &mut Vec<Event>) {
    while let Some(event) = parser.next_event().unwrap() {
        events.push(event);
    }
}

fn events_one_shot<S: EventSource>(mut parser: S, data: &[u8]) -> Vec<Event> {
    let mut events = Vec::new();
    parser.update(data);
    parser.finish();
    drain(&mut parser, &mut events);
    assert!(parser.done());
    events
}

fn events_byte_at_a_time<S: EventSource>(mut parser: S, data: &[u8]) -> Vec<Event> {
    let mut events = Vec::new();
    for &byte in data {
        parser.update(&[byte]);
        drain(&mut parser, &mut events);
    }
    parser.finish();
    drain(&mut parser, &mut events);
    assert!(parser.done());
    events
}

#[test]
fn test_json_suspension() {
    let data = r#"{"name": "suspension A😀 test", "values": [1, -2.5, 1e3,
        18446744073709551616, true, false, null], "nested": {"empty": [], "obj": {}}}"#
        .as_bytes();
    let one_shot = events_one_shot(JsonParser::new(), data);
    let chunked = events_byte_at_a_time(JsonParser::new(), data);
    assert_eq!(one_shot, chunked);
    assert!(!one_shot.is_empty());
}

#[test]
fn test_cbor_suspension() {
    // {"a": [1, -2, "text", h'010203'], "b": {"c": 2.5}, "d": (_ "ab" "c"),
    //  "e": bignum, "f": 273.15 as tag 4}
    let mut data = vec![0xa5];
    data.extend_from_slice(&[0x61, b'a', 0x84, 0x01, 0x21, 0x64, b't', b'e', b'x', b't']);
    data.extend_from_slice(&[0x43, 1, 2, 3]);
    data.extend_from_slice(&[0x61, b'b', 0xa1, 0x61, b'c', 0xfb]);
    data.extend_from_slice(&2.5f64.to_be_bytes());
    data.extend_from_slice(&[0x61, b'd', 0x7f, 0x62, b'a', b'b', 0x61, b'c', 0xff]);
    data.extend_from_slice(&[0x61, b'e', 0xc2, 0x49, 0x01, 0, 0, 0, 0, 0, 0, 0, 0]);
    data.extend_from_slice(&[0x61, b'f', 0xc4, 0x82, 0x21, 0x19, 0x6a, 0xb3]);

    let one_shot = events_one_shot(CborParser::new(), &data);
    let chunked = events_byte_at_a_time(CborParser::new(), &data);
    assert_eq!(one_shot, chunked);
}

#[test]
fn test_msgpack_suspension() {
    let mut data = vec![0x83];
    data.extend_from_slice(&[0xa1, b'a', 0x92, 0x01, 0xd1, 0xfc, 0x18]);
    data.extend_from_slice(&[0xa1, b'b', 0xcb]);
    data.extend_from_slice(&2.5f64.to_be_bytes());
    data.extend_from_slice(&[0xa1, b'c', 0xc4, 0x02, 0xde, 0xad]);

    let one_shot = events_one_shot(MsgpackParser::new(), &data);
    let chunked = events_byte_at_a_time(MsgpackParser::new(), &data);
    assert_eq!(one_shot, chunked);
}

#[test]
fn test_bson_suspension() {
    let mut value = polyjson::Value::object();
    value.insert_or_assign("name", "suspension").unwrap();
    value.insert_or_assign("count", 3i64).unwrap();
    let mut inner = polyjson::Value::object();
    inner.insert_or_assign("pi", 3.25f64).unwrap();
    value.insert_or_assign("inner", inner).unwrap();
    let data = polyjson::bson::to_vec(&value).unwrap();

    let one_shot = events_one_shot(BsonParser::new(), &data);
    let chunked = events_byte_at_a_time(BsonParser::new(), &data);
    assert_eq!(one_shot, chunked);
}

#[test]
fn test_ubjson_suspension() {
    let mut data = vec![b'{'];
    data.extend_from_slice(&[b'i', 1, b'a', b'[', b'$', b'i', b'#', b'i', 3, 1, 2, 3]);
    data.extend_from_slice(&[b'i', 1, b'b', b'S', b'i', 5]);
    data.extend_from_slice(b"hello");
    data.extend_from_slice(&[b'i', 1, b'c', b'H', b'i', 6]);
    data.extend_from_slice(b"273.15");
    data.push(b'}');

    let one_shot = events_one_shot(UbjsonParser::new(), &data);
    let chunked = events_byte_at_a_time(UbjsonParser::new(), &data);
    assert_eq!(one_shot, chunked);
}

#[test]
fn test_chunked_parse_equals_one_shot_value() {
    let text = br#"{"deeply": {"nested": [{"structure": [1, 2, 3]}]}}"#;
    let mut parser = JsonParser::new();
    for chunk in text.chunks(3) {
        parser.update(chunk);
    }
    parser.finish();
    let mut builder = polyjson::ValueBuilder::new();
    polyjson::visit(&mut parser, &mut builder).unwrap();
    assert_eq!(
        builder.take().unwrap(),
        polyjson::json::from_slice(text).unwrap()
    );
}
