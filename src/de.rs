use std::fmt;

use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess};

use crate::{Object, SemanticTag, Str, Value};

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ValueVisitor;

        impl<'de> serde::de::Visitor<'de> for ValueVisitor {
            type Value = Value;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("any valid document value")
            }

            fn visit_bool<E>(self, v: bool) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Bool(v))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Int(v, SemanticTag::None))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::UInt(v, SemanticTag::None))
            }

            fn visit_f64<E>(self, v: f64) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::double(v))
            }

            fn visit_str<E>(self, v: &str) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::String(Str::new(v), SemanticTag::None))
            }

            fn visit_string<E>(self, v: String) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::String(v.into(), SemanticTag::None))
            }

            fn visit_bytes<E>(self, v: &[u8]) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Bytes(
                    bytes::Bytes::copy_from_slice(v),
                    SemanticTag::None,
                ))
            }

            fn visit_byte_buf<E>(self, v: Vec<u8>) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Bytes(bytes::Bytes::from(v), SemanticTag::None))
            }

            fn visit_none<E>(self) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_unit<E>(self) -> Result<Value, E>
            where
                E: serde::de::Error,
            {
                Ok(Value::Null)
            }

            fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
            where
                D: Deserializer<'de>,
            {
                Deserialize::deserialize(deserializer)
            }

            fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0).min(4096));
                while let Some(item) = seq.next_element()? {
                    items.push(item);
                }
                Ok(Value::Array(items))
            }

            fn visit_map<A>(self, mut map: A) -> Result<Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                let mut object = Object::new();
                while let Some((key, value)) = map.next_entry::<String, Value>()? {
                    object.insert(key, value);
                }
                Ok(Value::Object(object))
            }
        }

        deserializer.deserialize_any(ValueVisitor)
    }
}
