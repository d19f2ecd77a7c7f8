//! The document value model.
//!
//! [`Value`] is a tagged union over the kinds every supported wire format
//! can express: null, booleans, exact 64-bit integers, doubles (with a
//! precision hint for digit-faithful re-encoding), strings with short-string
//! inlining, byte strings, arrays and objects. Scalars carry an orthogonal
//! [`SemanticTag`] recording interpretation (timestamps, base-N bytes,
//! arbitrary-precision numbers) without changing the stored bytes.

use std::fmt;

use bytes::Bytes;

use crate::visit::{Flow, Visitor};
use crate::{Error, Kind, Result, SemanticTag};

mod index;
mod object;
mod string;

pub use index::Index;
pub use object::{Object, OrderPolicy};
pub use string::Str;

/// A single document value: one node of the tree.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64, SemanticTag),
    UInt(u64, SemanticTag),
    Double {
        value: f64,
        /// Significant digits in the source literal, or 0 for "format with
        /// the shortest round-trip representation".
        precision: u8,
        tag: SemanticTag,
    },
    String(Str, SemanticTag),
    Bytes(Bytes, SemanticTag),
    Array(Vec<Value>),
    Object(Object),
}

static NULL: Value = Value::Null;

impl Value {
    /// An empty array.
    pub fn array() -> Self {
        Value::Array(Vec::new())
    }

    /// An empty insertion-ordered object.
    pub fn object() -> Self {
        Value::Object(Object::new())
    }

    /// An empty object with keys kept in sorted order.
    pub fn object_sorted() -> Self {
        Value::Object(Object::with_policy(OrderPolicy::Sorted))
    }

    pub fn string_tagged(s: impl Into<Str>, tag: SemanticTag) -> Self {
        Value::String(s.into(), tag)
    }

    pub fn bytes(b: impl Into<Bytes>, tag: SemanticTag) -> Self {
        Value::Bytes(b.into(), tag)
    }

    pub fn double(value: f64) -> Self {
        Value::Double {
            value,
            precision: 0,
            tag: SemanticTag::None,
        }
    }

    /// The physical storage kind. This is the only accessor that can tell a
    /// short (inline) string from a long (heap/shared) one.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Null => Kind::Null,
            Value::Bool(_) => Kind::Bool,
            Value::Int(..) => Kind::Int64,
            Value::UInt(..) => Kind::UInt64,
            Value::Double { .. } => Kind::Double,
            Value::String(s, _) => {
                if s.is_inline() {
                    Kind::ShortString
                } else {
                    Kind::LongString
                }
            }
            Value::Bytes(..) => Kind::ByteString,
            Value::Array(_) => Kind::Array,
            Value::Object(_) => Kind::Object,
        }
    }

    pub fn tag(&self) -> SemanticTag {
        match self {
            Value::Int(_, tag)
            | Value::UInt(_, tag)
            | Value::Double { tag, .. }
            | Value::String(_, tag)
            | Value::Bytes(_, tag) => *tag,
            _ => SemanticTag::None,
        }
    }

    /// Replaces the semantic tag on a scalar; no effect on null, bool and
    /// containers.
    pub fn with_tag(mut self, new_tag: SemanticTag) -> Self {
        match &mut self {
            Value::Int(_, tag)
            | Value::UInt(_, tag)
            | Value::Double { tag, .. }
            | Value::String(_, tag)
            | Value::Bytes(_, tag) => *tag = new_tag,
            _ => {}
        }
        self
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_bool(&self) -> bool {
        matches!(self, Value::Bool(_))
    }

    pub fn is_number(&self) -> bool {
        self.kind().is_number()
    }

    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(..))
    }

    pub fn is_bytes(&self) -> bool {
        matches!(self, Value::Bytes(..))
    }

    pub fn is_array(&self) -> bool {
        matches!(self, Value::Array(_))
    }

    pub fn is_object(&self) -> bool {
        matches!(self, Value::Object(_))
    }

    /// Number of children for containers, 0 for scalars.
    pub fn len(&self) -> usize {
        match self {
            Value::Array(items) => items.len(),
            Value::Object(map) => map.len(),
            _ => 0,
        }
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Bool(b) => Ok(*b),
            other => Err(other.mismatch(Kind::Bool)),
        }
    }

    /// Checked conversion to `i64`; fails with [`Error::NumberOutOfRange`]
    /// when the stored number does not fit.
    pub fn as_i64(&self) -> Result<i64> {
        match self {
            Value::Int(v, _) => Ok(*v),
            Value::UInt(v, _) => i64::try_from(*v).map_err(|_| Error::NumberOutOfRange),
            Value::Double { value, .. } => {
                if value.fract() == 0.0 && *value >= i64::MIN as f64 && *value < i64::MAX as f64 {
                    Ok(*value as i64)
                } else {
                    Err(Error::NumberOutOfRange)
                }
            }
            other => Err(other.mismatch(Kind::Int64)),
        }
    }

    pub fn as_u64(&self) -> Result<u64> {
        match self {
            Value::UInt(v, _) => Ok(*v),
            Value::Int(v, _) => u64::try_from(*v).map_err(|_| Error::NumberOutOfRange),
            Value::Double { value, .. } => {
                if value.fract() == 0.0 && *value >= 0.0 && *value < u64::MAX as f64 {
                    Ok(*value as u64)
                } else {
                    Err(Error::NumberOutOfRange)
                }
            }
            other => Err(other.mismatch(Kind::UInt64)),
        }
    }

    pub fn as_f64(&self) -> Result<f64> {
        match self {
            Value::Double { value, .. } => Ok(*value),
            Value::Int(v, _) => Ok(*v as f64),
            Value::UInt(v, _) => Ok(*v as f64),
            other => Err(other.mismatch(Kind::Double)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s, _) => Ok(s.as_str()),
            other => Err(other.mismatch(Kind::LongString)),
        }
    }

    pub fn as_bytes(&self) -> Result<&[u8]> {
        match self {
            Value::Bytes(b, _) => Ok(b),
            other => Err(other.mismatch(Kind::ByteString)),
        }
    }

    /// Keyed lookup that fails when the value is not an object or the key
    /// is absent. The non-failing counterpart is [`Value::get`].
    pub fn at(&self, key: &str) -> Result<&Value> {
        match self {
            Value::Object(map) => map
                .get(key)
                .ok_or_else(|| Error::KeyNotFound(key.to_string())),
            other => Err(other.mismatch(Kind::Object)),
        }
    }

    /// Positional lookup that fails when the value is not an array or the
    /// index is out of range.
    pub fn at_index(&self, index: usize) -> Result<&Value> {
        match self {
            Value::Array(items) => items.get(index).ok_or(Error::IndexOutOfRange(index)),
            other => Err(other.mismatch(Kind::Array)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        match self {
            Value::Object(map) => map.get(key),
            _ => None,
        }
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        match self {
            Value::Object(map) => map.get_mut(key),
            _ => None,
        }
    }

    pub fn get_index(&self, index: usize) -> Option<&Value> {
        match self {
            Value::Array(items) => items.get(index),
            _ => None,
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        match self {
            Value::Object(map) => map.contains_key(key),
            _ => false,
        }
    }

    /// Appends to an array value.
    pub fn push_back(&mut self, value: impl Into<Value>) -> Result<()> {
        match self {
            Value::Array(items) => {
                items.push(value.into());
                Ok(())
            }
            other => Err(other.mismatch(Kind::Array)),
        }
    }

    /// Inserts into an object value, overwriting any existing entry.
    pub fn insert_or_assign(
        &mut self,
        key: impl Into<Str>,
        value: impl Into<Value>,
    ) -> Result<Option<Value>> {
        match self {
            Value::Object(map) => Ok(map.insert(key, value.into())),
            other => Err(other.mismatch(Kind::Object)),
        }
    }

    /// Removes an object entry, returning it if present.
    pub fn remove(&mut self, key: &str) -> Result<Option<Value>> {
        match self {
            Value::Object(map) => Ok(map.remove(key)),
            other => Err(other.mismatch(Kind::Object)),
        }
    }

    fn mismatch(&self, expected: Kind) -> Error {
        Error::TypeMismatch {
            expected,
            found: self.kind(),
        }
    }

    /// Walks this value, emitting the event sequence a parser would produce
    /// into `visitor`. Uses an explicit work stack, so arbitrarily deep
    /// trees do not consume native stack.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<Flow> {
        enum Step<'a> {
            Value(&'a Value),
            Key(&'a str),
            EndArray,
            EndObject,
        }

        let mut work = vec![Step::Value(self)];
        while let Some(step) = work.pop() {
            let flow = match step {
                Step::Key(name) => visitor.key(name)?,
                Step::EndArray => visitor.end_array()?,
                Step::EndObject => visitor.end_object()?,
                Step::Value(value) => match value {
                    Value::Null => visitor.null_value(SemanticTag::None)?,
                    Value::Bool(b) => visitor.bool_value(*b)?,
                    Value::Int(v, tag) => visitor.int_value(*v, *tag)?,
                    Value::UInt(v, tag) => visitor.uint_value(*v, *tag)?,
                    Value::Double {
                        value,
                        precision,
                        tag,
                    } => visitor.double_value(*value, *precision, *tag)?,
                    Value::String(s, tag) => visitor.string_value(s.as_str(), *tag)?,
                    Value::Bytes(b, tag) => visitor.byte_string_value(b, *tag)?,
                    Value::Array(items) => {
                        let flow = visitor.begin_array(Some(items.len()), SemanticTag::None)?;
                        work.push(Step::EndArray);
                        for child in items.iter().rev() {
                            work.push(Step::Value(child));
                        }
                        flow
                    }
                    Value::Object(map) => {
                        let flow = visitor.begin_object(Some(map.len()), SemanticTag::None)?;
                        work.push(Step::EndObject);
                        for (key, child) in map.iter().rev() {
                            work.push(Step::Value(child));
                            work.push(Step::Key(key));
                        }
                        flow
                    }
                },
            };
            if flow.is_stop() {
                return Ok(Flow::Stop);
            }
        }
        Ok(Flow::Continue)
    }
}

/// Structural equality.
///
/// Exact integers compare across the int64/uint64 split, objects compare as
/// key/value sets regardless of entry order or ordering policy, and string
/// storage (inline vs. heap vs. shared) is invisible. Semantic tags take
/// part in equality; the double precision hint does not.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a, ta), Value::Int(b, tb)) => a == b && ta == tb,
            (Value::UInt(a, ta), Value::UInt(b, tb)) => a == b && ta == tb,
            (Value::Int(a, ta), Value::UInt(b, tb))
            | (Value::UInt(b, tb), Value::Int(a, ta)) => {
                ta == tb && *a >= 0 && *a as u64 == *b
            }
            (
                Value::Double {
                    value: a, tag: ta, ..
                },
                Value::Double {
                    value: b, tag: tb, ..
                },
            ) => a == b && ta == tb,
            (Value::String(a, ta), Value::String(b, tb)) => a == b && ta == tb,
            (Value::Bytes(a, ta), Value::Bytes(b, tb)) => a == b && ta == tb,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => a == b,
            _ => false,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! from_signed {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::Int(v as i64, SemanticTag::None)
            }
        }
    )*};
}

macro_rules! from_unsigned {
    ($($t:ty),*) => {$(
        impl From<$t> for Value {
            fn from(v: $t) -> Self {
                Value::UInt(v as u64, SemanticTag::None)
            }
        }
    )*};
}

from_signed!(i8, i16, i32, i64);
from_unsigned!(u8, u16, u32, u64);

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::double(v)
    }
}

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::double(v as f64)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(Str::new(v), SemanticTag::None)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v.into(), SemanticTag::None)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Array(v)
    }
}

impl From<Object> for Value {
    fn from(v: Object) -> Self {
        Value::Object(v)
    }
}

impl<I: Index> std::ops::Index<I> for Value {
    type Output = Value;

    /// Read-access indexing: a missing key or out-of-range index yields a
    /// null reference rather than failing. Use [`Value::at`] for the
    /// checked form.
    fn index(&self, index: I) -> &Value {
        index.index_dispatch(
            self,
            |v, n| v.get_index(n).unwrap_or(&NULL),
            |v, k| v.get(k).unwrap_or(&NULL),
        )
    }
}

impl<I: Index> std::ops::IndexMut<I> for Value {
    /// Write-access indexing auto-vivifies: indexing null with a string key
    /// turns it into an object, and indexing an object with an absent key
    /// inserts a null entry. Array indexing requires an existing position.
    fn index_mut(&mut self, index: I) -> &mut Value {
        index.index_dispatch_mut(
            self,
            |v, n| match v {
                Value::Array(items) => {
                    let len = items.len();
                    items.get_mut(n).unwrap_or_else(|| {
                        panic!("index {n} out of range for array of length {len}")
                    })
                }
                other => panic!("cannot index {} with a number", other.kind().description()),
            },
            |v, k| {
                if v.is_null() {
                    *v = Value::object();
                }
                match v {
                    Value::Object(map) => map.entry_or_null(k),
                    other => panic!(
                        "cannot index {} with a string key",
                        other.kind().description()
                    ),
                }
            },
        )
    }
}

/// Writes the value as compact JSON.
impl fmt::Display for Value {
    fn fmt(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        let text = crate::json::to_string(self).map_err(|_| fmt::Error)?;
        formatter.write_str(&text)
    }
}
