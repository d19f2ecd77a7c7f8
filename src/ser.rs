use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::Value;

/// Semantic tags and precision hints have no serde representation; values
/// serialize as their plain data model shape.
impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(v, _) => serializer.serialize_i64(*v),
            Value::UInt(v, _) => serializer.serialize_u64(*v),
            Value::Double { value, .. } => serializer.serialize_f64(*value),
            Value::String(s, _) => serializer.serialize_str(s),
            Value::Bytes(b, _) => serializer.serialize_bytes(b),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Object(map) => {
                let mut entries = serializer.serialize_map(Some(map.len()))?;
                for (key, value) in map.iter() {
                    entries.serialize_entry(key, value)?;
                }
                entries.end()
            }
        }
    }
}
