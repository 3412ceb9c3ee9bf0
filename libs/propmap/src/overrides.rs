use std::any::Any;
use std::collections::BTreeMap;

use crate::error::{FieldError, MapError};
use crate::shape::Shape;
use crate::value::Value;

/// Per-call override values, looked up by destination field name.
///
/// `Ok(None)` → not overridden. `Ok(Some(null))` → explicitly overridden with null.
pub trait OverrideSource {
    fn lookup(&self, name: &str) -> Result<Option<Value>, FieldError>;
}

/// Any shape works as a loosely-typed override set: each of its fields
/// overrides the destination field with the same name.
impl<T: Shape> OverrideSource for T {
    fn lookup(&self, name: &str) -> Result<Option<Value>, FieldError> {
        T::field(name).map(|f| f.read(self)).transpose()
    }
}

/// Explicit name → value override set, ordered by name.
#[derive(Debug, Clone, Default)]
pub struct FieldValues {
    values: BTreeMap<String, Value>,
}

impl FieldValues {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`FieldValues::set`].
    ///
    /// Pass optional values through [`FieldValues::with_option`]; `with`
    /// stores an `Option<T>` as a value of type `Option<T>`, not `T`.
    pub fn with<T: Any + Clone + Send + Sync>(mut self, name: impl Into<String>, value: T) -> Self {
        self.set(name, value);
        self
    }

    /// Builder form of [`FieldValues::set_option`].
    pub fn with_option<T: Any + Clone + Send + Sync>(
        mut self,
        name: impl Into<String>,
        value: Option<T>,
    ) -> Self {
        self.set_option(name, value);
        self
    }

    /// Builder form of [`FieldValues::set_null`].
    pub fn with_null(mut self, name: impl Into<String>) -> Self {
        self.set_null(name);
        self
    }

    pub fn set<T: Any + Clone + Send + Sync>(&mut self, name: impl Into<String>, value: T) {
        self.values.insert(name.into(), Value::new(value));
    }

    /// `Some(v)` overrides with `v` (type `T`), `None` with null, the same
    /// way an `Option<T>` source field reads.
    pub fn set_option<T: Any + Clone + Send + Sync>(
        &mut self,
        name: impl Into<String>,
        value: Option<T>,
    ) {
        self.values.insert(name.into(), Value::from_option(value));
    }

    pub fn set_null(&mut self, name: impl Into<String>) {
        self.values.insert(name.into(), Value::null());
    }

    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        self.values.insert(name.into(), value)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.values.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl OverrideSource for FieldValues {
    fn lookup(&self, name: &str) -> Result<Option<Value>, FieldError> {
        Ok(self.values.get(name).cloned())
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for FieldValues {
    fn from_iter<I: IntoIterator<Item = (K, Value)>>(iter: I) -> Self {
        let mut values = Self::new();
        values.extend(iter);
        values
    }
}

impl<K: Into<String>> Extend<(K, Value)> for FieldValues {
    fn extend<I: IntoIterator<Item = (K, Value)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.values.insert(k.into(), v);
        }
    }
}

/// Resolve the override for `name`. Read failures carry the field name.
pub fn resolve_override(
    overrides: Option<&dyn OverrideSource>,
    name: &str,
) -> Result<Option<Value>, MapError> {
    match overrides {
        Some(source) => source.lookup(name).map_err(|e| MapError::read(name, e)),
        None => Ok(None),
    }
}
