//! Insertion-ordered map model for decoded BOSS dictionaries.

use std::fmt;
use std::sync::Arc;

use crate::error::BossError;

use super::Value;
use super::value::fmt_binary;

/// The canonical in-memory form of a BOSS dictionary.
///
/// Keys and values are both [`Value`]s. Entries keep their insertion order,
/// which is the order they are written to and read from the wire — native
/// hash maps give no such guarantee, and BOSS round-tripping relies on it.
/// Lookup is a linear scan with structural equality; BOSS dictionaries are
/// small and keys may be kinds (doubles, lists) that cannot be hashed.
#[derive(Debug, Clone, Default)]
pub struct StructValue {
    entries: Vec<(Value, Value)>,
}

impl StructValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Vec::with_capacity(capacity),
        }
    }

    /// Builds a struct from key/value pairs, keeping first-insertion order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut map = Self::new();
        for (key, value) in pairs {
            map.insert(key, value);
        }
        map
    }

    /// Coerces a dynamic value into the canonical struct form: a `Map` passes
    /// through with its identity preserved, anything else is a type error.
    pub fn from_value(value: &Value) -> Result<Arc<Self>, BossError> {
        match value {
            Value::Map(map) => Ok(Arc::clone(map)),
            other => Err(BossError::Type(format!("can't convert to struct: {other}"))),
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Inserts an entry. An existing equal key is replaced in place (the
    /// position of its first insertion wins) and the old value returned.
    pub fn insert(&mut self, key: impl Into<Value>, value: impl Into<Value>) -> Option<Value> {
        let key = key.into();
        let value = value.into();
        for (k, v) in &mut self.entries {
            if *k == key {
                return Some(std::mem::replace(v, value));
            }
        }
        self.entries.push((key, value));
        None
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// Looks up a text key without building a `Value`.
    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::Text(s) if s.as_ref() == key))
            .map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let index = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(index).1)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.get(key).is_some()
    }

    // Typed accessors for the common case of text keys.

    pub fn get_text(&self, key: &str) -> Option<&str> {
        self.get_str(key)?.as_str()
    }

    pub fn get_binary(&self, key: &str) -> Option<&[u8]> {
        self.get_str(key)?.as_bytes()
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        self.get_str(key)?.as_i64()
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.get_str(key)?.as_bool()
    }

    pub fn get_struct(&self, key: &str) -> Option<&StructValue> {
        self.get_str(key)?.as_map()
    }

    /// Entries in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(k, _)| k)
    }
}

/// Map equality: same size and each key maps to an equal value, regardless
/// of insertion order.
impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.entries.len() == other.entries.len()
            && self.entries.iter().all(|(k, v)| other.get(k) == Some(v))
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for StructValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_pairs(iter)
    }
}

impl<'a> IntoIterator for &'a StructValue {
    type Item = (&'a Value, &'a Value);
    type IntoIter = std::iter::Map<
        std::slice::Iter<'a, (Value, Value)>,
        fn(&'a (Value, Value)) -> (&'a Value, &'a Value),
    >;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter().map(|(k, v)| (k, v))
    }
}

impl fmt::Display for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            match k {
                Value::Text(s) => write!(f, "{s}=")?,
                other => write!(f, "{other}=")?,
            }
            match v {
                Value::Binary(b) => fmt_binary(f, b)?,
                other => write!(f, "{other}")?,
            }
        }
        write!(f, "}}")
    }
}
