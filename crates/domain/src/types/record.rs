//! Flattened remote entity records.
//!
//! A [`Record`] is one remote entity (user) as a mapping from dotted
//! attribute path to value: the nested wire object `{"name": {"given":
//! "Joe"}}` becomes `{"name.given": "Joe"}`. The flat form is what the
//! delta computation, import matching, and edit flows operate on; the
//! nested form is reconstructed only at the wire boundary.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Normalize a username for duplicate detection: trimmed, lowercased.
#[must_use]
pub fn normalize_username(username: &str) -> String {
    username.trim().to_lowercase()
}

/// One remote entity as a flat dotted-path → value mapping.
///
/// Ordering is stable (`BTreeMap`) so serialized forms and test output are
/// deterministic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Record {
    attrs: BTreeMap<String, Value>,
}

impl Record {
    /// Empty record.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flatten a nested JSON object into dotted-path form.
    ///
    /// Arrays and scalars are leaf values; empty or whitespace-only keys
    /// (produced by malformed mappings) are skipped.
    #[must_use]
    pub fn from_nested(value: &Value) -> Self {
        let mut attrs = BTreeMap::new();
        if let Value::Object(map) = value {
            flatten_into(&mut attrs, map, "");
        }
        Self { attrs }
    }

    /// Rebuild the nested JSON object for the wire.
    ///
    /// Inverse of [`Record::from_nested`] for records whose paths do not
    /// conflict (a path that is both a leaf and a prefix keeps the leaf
    /// written last in path order).
    #[must_use]
    pub fn to_nested(&self) -> Value {
        let mut root = Map::new();
        for (path, value) in &self.attrs {
            insert_nested(&mut root, path, value.clone());
        }
        Value::Object(root)
    }

    /// Attribute value at `path`, if present.
    #[must_use]
    pub fn get(&self, path: &str) -> Option<&Value> {
        self.attrs.get(path)
    }

    /// Set the attribute at `path`. Empty paths are ignored.
    pub fn set(&mut self, path: impl Into<String>, value: Value) {
        let path = path.into();
        if !path.trim().is_empty() {
            self.attrs.insert(path, value);
        }
    }

    /// Remove the attribute at `path`, returning the previous value.
    pub fn remove(&mut self, path: &str) -> Option<Value> {
        self.attrs.remove(path)
    }

    /// Whether an attribute exists at `path`.
    #[must_use]
    pub fn contains(&self, path: &str) -> bool {
        self.attrs.contains_key(path)
    }

    /// Iterate attributes in path order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.attrs.iter()
    }

    /// Number of attributes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.attrs.len()
    }

    /// True when the record has no attributes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.attrs.is_empty()
    }

    /// Remote-assigned identity key, immutable once created.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.attrs.get("id").and_then(Value::as_str)
    }

    /// Raw username attribute as stored.
    #[must_use]
    pub fn username(&self) -> Option<&str> {
        self.attrs.get("username").and_then(Value::as_str)
    }

    /// Username in duplicate-detection form (trimmed, lowercased).
    #[must_use]
    pub fn normalized_username(&self) -> Option<String> {
        self.username().map(normalize_username)
    }
}

impl FromIterator<(String, Value)> for Record {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut record = Self::new();
        for (path, value) in iter {
            record.set(path, value);
        }
        record
    }
}

fn flatten_into(attrs: &mut BTreeMap<String, Value>, map: &Map<String, Value>, prefix: &str) {
    for (key, value) in map {
        if key.trim().is_empty() {
            continue;
        }
        let path =
            if prefix.is_empty() { key.clone() } else { format!("{prefix}.{key}") };
        match value {
            Value::Object(inner) => flatten_into(attrs, inner, &path),
            other => {
                attrs.insert(path, other.clone());
            }
        }
    }
}

fn insert_nested(root: &mut Map<String, Value>, path: &str, value: Value) {
    let mut parts = path.split('.').peekable();
    let mut current = root;
    while let Some(part) = parts.next() {
        if parts.peek().is_none() {
            current.insert(part.to_string(), value);
            return;
        }
        let entry = current
            .entry(part.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            // A leaf already occupies this prefix; replace it with an object
            // so the deeper path wins.
            *entry = Value::Object(Map::new());
        }
        match entry {
            Value::Object(inner) => current = inner,
            _ => return,
        }
    }
}

/// Caller-supplied index of existing usernames, keyed in normalized form.
///
/// Consulted by the bulk scheduler before each create: a hit rewrites the
/// create into an update against the existing id, preventing duplicate
/// entities during import.
#[derive(Debug, Clone, Default)]
pub struct UsernameIndex {
    entries: BTreeMap<String, String>,
}

impl UsernameIndex {
    /// Empty index (every create stays a create).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an existing `username` → `id` pair. The username is
    /// normalized on insertion.
    pub fn insert(&mut self, username: &str, id: impl Into<String>) {
        self.entries.insert(normalize_username(username), id.into());
    }

    /// Existing id for `username`, matched case-insensitively and trimmed.
    #[must_use]
    pub fn lookup(&self, username: &str) -> Option<&str> {
        self.entries.get(&normalize_username(username)).map(String::as_str)
    }

    /// Number of indexed usernames.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no usernames are indexed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for UsernameIndex {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut index = Self::new();
        for (username, id) in iter {
            index.insert(&username, id);
        }
        index
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn flattens_nested_objects_to_dotted_paths() {
        let record = Record::from_nested(&json!({
            "id": "u-1",
            "username": "jbloggs",
            "name": {"given": "Joe", "family": "Bloggs"},
            "groups": ["a", "b"]
        }));

        assert_eq!(record.get("name.given"), Some(&json!("Joe")));
        assert_eq!(record.get("name.family"), Some(&json!("Bloggs")));
        assert_eq!(record.get("groups"), Some(&json!(["a", "b"])));
        assert!(!record.contains("name"));
    }

    #[test]
    fn unflatten_round_trips() {
        let nested = json!({
            "username": "jbloggs",
            "name": {"given": "Joe", "family": "Bloggs"},
            "population": {"id": "p-1"}
        });
        let record = Record::from_nested(&nested);
        assert_eq!(record.to_nested(), nested);
    }

    #[test]
    fn empty_keys_are_dropped() {
        let record = Record::from_nested(&json!({"": "x", "  ": "y", "ok": "z"}));
        assert_eq!(record.len(), 1);
        assert_eq!(record.get("ok"), Some(&json!("z")));
    }

    #[test]
    fn username_normalization() {
        let mut record = Record::new();
        record.set("username", json!("  JBloggs "));
        assert_eq!(record.normalized_username().as_deref(), Some("jbloggs"));
    }

    #[test]
    fn username_index_matches_case_insensitively() {
        let mut index = UsernameIndex::new();
        index.insert(" JBloggs ", "u-1");
        assert_eq!(index.lookup("jbloggs"), Some("u-1"));
        assert_eq!(index.lookup("JBLOGGS  "), Some("u-1"));
        assert_eq!(index.lookup("other"), None);
    }
}
