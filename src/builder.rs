use crate::visit::{Flow, Visitor};
use crate::{Object, OrderPolicy, Result, SemanticTag, Str, Value};

/// Upper bound applied to size hints before pre-reserving storage. Hints
/// come from wire headers and are not trusted further than this.
const RESERVE_CAP: usize = 4096;

/// A visitor that materializes the event stream into a [`Value`].
///
/// Containers under construction live on an explicit frame stack, so the
/// builder is as depth-safe as the parsers feeding it.
pub struct ValueBuilder {
    stack: Vec<Frame>,
    result: Option<Value>,
    policy: OrderPolicy,
}

enum Frame {
    Array(Vec<Value>),
    Object { map: Object, key: Option<Str> },
}

impl ValueBuilder {
    pub fn new() -> Self {
        Self::with_policy(OrderPolicy::Insertion)
    }

    /// Objects built from the stream use the given ordering policy.
    pub fn with_policy(policy: OrderPolicy) -> Self {
        ValueBuilder {
            stack: Vec::new(),
            result: None,
            policy,
        }
    }

    /// Takes the finished value, if a complete document was seen.
    pub fn take(&mut self) -> Option<Value> {
        self.result.take()
    }

    /// `true` once a complete top-level value has been built.
    pub fn is_complete(&self) -> bool {
        self.result.is_some()
    }

    fn attach(&mut self, value: Value) {
        match self.stack.last_mut() {
            None => self.result = Some(value),
            Some(Frame::Array(items)) => items.push(value),
            Some(Frame::Object { map, key }) => {
                if let Some(key) = key.take() {
                    map.insert(key, value);
                }
            }
        }
    }
}

impl Default for ValueBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl Visitor for ValueBuilder {
    fn begin_array(&mut self, size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        let capacity = size_hint.unwrap_or(0).min(RESERVE_CAP);
        self.stack.push(Frame::Array(Vec::with_capacity(capacity)));
        Ok(Flow::Continue)
    }

    fn end_array(&mut self) -> Result<Flow> {
        if let Some(Frame::Array(items)) = self.stack.pop() {
            self.attach(Value::Array(items));
        }
        Ok(Flow::Continue)
    }

    fn begin_object(&mut self, size_hint: Option<usize>, _tag: SemanticTag) -> Result<Flow> {
        let capacity = size_hint.unwrap_or(0).min(RESERVE_CAP);
        self.stack.push(Frame::Object {
            map: Object::with_capacity(self.policy, capacity),
            key: None,
        });
        Ok(Flow::Continue)
    }

    fn end_object(&mut self) -> Result<Flow> {
        if let Some(Frame::Object { map, .. }) = self.stack.pop() {
            self.attach(Value::Object(map));
        }
        Ok(Flow::Continue)
    }

    fn key(&mut self, name: &str) -> Result<Flow> {
        if let Some(Frame::Object { key, .. }) = self.stack.last_mut() {
            *key = Some(Str::new(name));
        }
        Ok(Flow::Continue)
    }

    fn string_value(&mut self, value: &str, tag: SemanticTag) -> Result<Flow> {
        self.attach(Value::String(Str::new(value), tag));
        Ok(Flow::Continue)
    }

    fn byte_string_value(&mut self, value: &[u8], tag: SemanticTag) -> Result<Flow> {
        self.attach(Value::Bytes(bytes::Bytes::copy_from_slice(value), tag));
        Ok(Flow::Continue)
    }

    fn int_value(&mut self, value: i64, tag: SemanticTag) -> Result<Flow> {
        self.attach(Value::Int(value, tag));
        Ok(Flow::Continue)
    }

    fn uint_value(&mut self, value: u64, tag: SemanticTag) -> Result<Flow> {
        self.attach(Value::UInt(value, tag));
        Ok(Flow::Continue)
    }

    fn double_value(&mut self, value: f64, precision: u8, tag: SemanticTag) -> Result<Flow> {
        self.attach(Value::Double {
            value,
            precision,
            tag,
        });
        Ok(Flow::Continue)
    }

    fn bool_value(&mut self, value: bool) -> Result<Flow> {
        self.attach(Value::Bool(value));
        Ok(Flow::Continue)
    }

    fn null_value(&mut self, _tag: SemanticTag) -> Result<Flow> {
        self.attach(Value::Null);
        Ok(Flow::Continue)
    }
}
