use crate::{Str, Value};

/// How an [`Object`] keeps its entries ordered.
///
/// Both policies present the same contract (unique keys, same iteration and
/// mutation API); they trade lookup cost against document-order fidelity.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum OrderPolicy {
    /// Entries stay in insertion order; lookup is a linear scan. Preserves
    /// the original document order across a parse/encode round trip.
    #[default]
    Insertion,
    /// Entries are kept sorted by key; lookup is a binary search.
    Sorted,
}

/// A mapping from unique string keys to child values.
#[derive(Clone, Debug, Default)]
pub struct Object {
    policy: OrderPolicy,
    entries: Vec<(Str, Value)>,
}

impl Object {
    pub fn new() -> Self {
        Self::with_policy(OrderPolicy::Insertion)
    }

    pub fn with_policy(policy: OrderPolicy) -> Self {
        Object {
            policy,
            entries: Vec::new(),
        }
    }

    pub fn with_capacity(policy: OrderPolicy, capacity: usize) -> Self {
        Object {
            policy,
            entries: Vec::with_capacity(capacity),
        }
    }

    pub fn policy(&self) -> OrderPolicy {
        self.policy
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Position of `key`, or where it would be inserted (sorted policy only).
    fn find(&self, key: &str) -> std::result::Result<usize, usize> {
        match self.policy {
            OrderPolicy::Sorted => self
                .entries
                .binary_search_by(|(k, _)| k.as_str().cmp(key)),
            OrderPolicy::Insertion => self
                .entries
                .iter()
                .position(|(k, _)| k.as_str() == key)
                .ok_or(self.entries.len()),
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.find(key).ok().map(|i| &self.entries[i].1)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.find(key).ok().map(|i| &mut self.entries[i].1)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.find(key).is_ok()
    }

    /// Inserts `value` under `key`, returning the previous value if the key
    /// was present. A duplicate key keeps its position under the insertion
    /// policy and its sort position under the sorted policy.
    pub fn insert(&mut self, key: impl Into<Str>, value: Value) -> Option<Value> {
        let key = key.into();
        match self.find(&key) {
            Ok(i) => Some(std::mem::replace(&mut self.entries[i].1, value)),
            Err(i) => {
                self.entries.insert(i, (key, value));
                None
            }
        }
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        match self.find(key) {
            Ok(i) => Some(self.entries.remove(i).1),
            Err(_) => None,
        }
    }

    /// Returns the value under `key`, inserting a null entry first if the
    /// key is absent. Backs write-access indexing on values.
    pub fn entry_or_null(&mut self, key: &str) -> &mut Value {
        let i = match self.find(key) {
            Ok(i) => i,
            Err(i) => {
                self.entries.insert(i, (Str::new(key), Value::Null));
                i
            }
        };
        &mut self.entries[i].1
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    pub fn reserve(&mut self, additional: usize) {
        self.entries.reserve(additional);
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.entries.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_> {
        IterMut {
            inner: self.entries.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

/// Equality ignores both the ordering policy and the entry order: two
/// objects are equal when they hold the same key/value pairs.
impl PartialEq for Object {
    fn eq(&self, other: &Self) -> bool {
        if self.entries.len() != other.entries.len() {
            return false;
        }
        self.entries
            .iter()
            .all(|(k, v)| other.get(k.as_str()) == Some(v))
    }
}

pub struct Iter<'a> {
    inner: std::slice::Iter<'a, (Str, Value)>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = (&'a str, &'a Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(k, v)| (k.as_str(), v))
    }
}

impl ExactSizeIterator for Iter<'_> {}

pub struct IterMut<'a> {
    inner: std::slice::IterMut<'a, (Str, Value)>,
}

impl<'a> Iterator for IterMut<'a> {
    type Item = (&'a str, &'a mut Value);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(k, v)| (k.as_str(), v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<'a> IntoIterator for &'a Object {
    type Item = (&'a str, &'a Value);
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Iter<'a> {
        self.iter()
    }
}

impl FromIterator<(Str, Value)> for Object {
    fn from_iter<T: IntoIterator<Item = (Str, Value)>>(iter: T) -> Self {
        let mut object = Object::new();
        for (k, v) in iter {
            object.insert(k, v);
        }
        object
    }
}
