//! Property tests: decode(encode(doc)) == doc for every format that can
//! represent the document.

use proptest::prelude::*;

use polyjson::{Object, Value, bson, cbor, json, msgpack, ubjson};

fn arb_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::from),
        any::<i64>().prop_map(Value::from),
        // u64 beyond i64::MAX degrades to a bignum string in UBJSON, so the
        // shared strategy stays in the losslessly-representable range
        (0..=i64::MAX as u64).prop_map(Value::from),
        any::<f64>()
            .prop_filter("finite doubles only", |f| f.is_finite())
            .prop_map(Value::double),
        "[a-zA-Z0-9 _-]{0,24}".prop_map(Value::from),
    ];
    leaf.prop_recursive(3, 32, 6, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..6).prop_map(Value::from),
            prop::collection::btree_map("[a-z]{1,8}", inner, 0..6).prop_map(|entries| {
                let mut object = Object::new();
                for (key, value) in entries {
                    object.insert(key, value);
                }
                Value::Object(object)
            }),
        ]
    })
}

proptest! {
    #[test]
    fn prop_json_round_trip(value in arb_value()) {
        let text = json::to_string(&value).unwrap();
        prop_assert_eq!(json::from_str(&text).unwrap(), value);
    }

    #[test]
    fn prop_cbor_round_trip(value in arb_value()) {
        let encoded = cbor::to_vec(&value).unwrap();
        prop_assert_eq!(cbor::from_slice(&encoded).unwrap(), value);
    }

    #[test]
    fn prop_msgpack_round_trip(value in arb_value()) {
        let encoded = msgpack::to_vec(&value).unwrap();
        prop_assert_eq!(msgpack::from_slice(&encoded).unwrap(), value);
    }

    #[test]
    fn prop_ubjson_round_trip(value in arb_value()) {
        let encoded = ubjson::to_vec(&value).unwrap();
        prop_assert_eq!(ubjson::from_slice(&encoded).unwrap(), value);
    }

    #[test]
    fn prop_bson_round_trip(value in arb_value()) {
        // BSON requires a document root
        let mut document = Value::object();
        document.insert_or_assign("root", value).unwrap();
        let encoded = bson::to_vec(&document).unwrap();
        prop_assert_eq!(bson::from_slice(&encoded).unwrap(), document);
    }

    #[test]
    fn prop_one_byte_feeding_matches_one_shot(value in arb_value()) {
        use polyjson::{Event, EventSource};
        let encoded = json::to_vec(&value).unwrap();

        let mut one_shot = polyjson::json::JsonParser::new();
        one_shot.update(&encoded);
        one_shot.finish();
        let mut expected: Vec<Event> = Vec::new();
        while let Some(event) = one_shot.next_event().unwrap() {
            expected.push(event);
        }

        let mut chunked = polyjson::json::JsonParser::new();
        let mut actual: Vec<Event> = Vec::new();
        for &byte in &encoded {
            chunked.update(&[byte]);
            while let Some(event) = chunked.next_event().unwrap() {
                actual.push(event);
            }
        }
        chunked.finish();
        while let Some(event) = chunked.next_event().unwrap() {
            actual.push(event);
        }
        prop_assert_eq!(actual, expected);
    }
}
