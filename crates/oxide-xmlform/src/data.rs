//! Bound form data.

use serde_json::{Map, Value};

use crate::schema::SchemaTree;

/// Ordered mapping from dot-path keys to values.
///
/// Keys are `group.path.name` for grouped fields and the bare name for
/// ungrouped ones. Lookups fall back to descending into a stored object
/// when a shorter key prefix holds one, so `a.b` is found inside a value
/// stored under `a`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DataStore {
    values: Map<String, Value>,
}

impl DataStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value stored at `key`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        if let Some(value) = self.values.get(key) {
            return Some(value);
        }
        self.values.iter().find_map(|(stored, value)| {
            let rest = key.strip_prefix(stored.as_str())?.strip_prefix('.')?;
            lookup_path(value, rest)
        })
    }

    /// Returns whether a value is stored at `key`.
    pub fn exists(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Stores a value, keeping insertion order for existing keys.
    pub fn set(&mut self, key: impl Into<String>, value: Value) {
        self.values.insert(key.into(), value);
    }

    /// Removes the value stored exactly at `key`.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Removes every value.
    pub fn clear(&mut self) {
        self.values.clear();
    }

    /// Returns the number of stored keys.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns whether the store is empty.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterates `(key, value)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(key, value)| (key.as_str(), value))
    }

    /// Expands the dot-path keys into a nested JSON object.
    pub fn to_value(&self) -> Value {
        let mut root = Map::new();
        for (key, value) in &self.values {
            insert_path(&mut root, key, value.clone());
        }
        Value::Object(root)
    }
}

/// Looks up a dot path inside nested JSON objects.
pub fn lookup_path<'a>(value: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(value);
    }
    path.split('.')
        .try_fold(value, |current, segment| current.as_object()?.get(segment))
}

/// Inserts a value at a dot path, creating intermediate objects.
pub fn insert_path(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = root;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        let Value::Object(next) = entry else {
            return;
        };
        current = next;
    }
}

/// Joins a group path and a name into a data key.
pub fn data_key(group: Option<&str>, name: &str) -> String {
    match group.filter(|group| !group.is_empty()) {
        Some(group) => format!("{group}.{name}"),
        None => name.to_string(),
    }
}

/// Walks `data` and stores every value that lands on a declared field.
///
/// Keys naming a field at the current group level are stored whole. Other
/// object values are descended into with the key appended to the group
/// path. Anything else is dropped.
pub(crate) fn bind_level(
    tree: &SchemaTree,
    store: &mut DataStore,
    group: Option<&str>,
    data: &Map<String, Value>,
) {
    for (key, value) in data {
        if tree.find_field(key, group).is_some() {
            store.set(data_key(group, key), value.clone());
        } else if let Value::Object(children) = value {
            let nested = data_key(group, key);
            bind_level(tree, store, Some(&nested), children);
        } else {
            tracing::trace!(key = %data_key(group, key), "dropping value without a field");
        }
    }
}
