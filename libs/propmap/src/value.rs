use std::any::{Any, TypeId};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Type identifier used as the converter registry key.
///
/// Identity is the `TypeId`; the name is kept for logs and error messages only.
#[derive(Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    pub fn of<T: Any>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Object-safe view over any cloneable, thread-safe field value.
trait Dynamic: Any + Send + Sync {
    fn clone_boxed(&self) -> Box<dyn Dynamic>;
    fn type_key(&self) -> TypeKey;
    fn as_any(&self) -> &dyn Any;
    fn into_any(self: Box<Self>) -> Box<dyn Any>;
}

impl<T: Any + Clone + Send + Sync> Dynamic for T {
    fn clone_boxed(&self) -> Box<dyn Dynamic> {
        Box::new(self.clone())
    }

    fn type_key(&self) -> TypeKey {
        TypeKey::of::<T>()
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Box<Self>) -> Box<dyn Any> {
        self
    }
}

/// A single field value in flight between two shapes.
///
/// - Non-null: boxed concrete value, its runtime type is `type_key()`.
/// - Null: the absent value (`None` read from an `Option<T>` field, or an
///   explicit null override).
///
/// Values are never coerced. A value holding `i32` can only be written into
/// an `i32` or `Option<i32>` field unless a converter rewrites it first.
pub struct Value(Option<Box<dyn Dynamic>>);

impl Value {
    /// Wrap a concrete value. Wrapping a `Value` returns it unchanged.
    pub fn new<T: Any + Clone + Send + Sync>(value: T) -> Self {
        let mut slot = Some(value);
        if let Some(inner) = (&mut slot as &mut dyn Any).downcast_mut::<Option<Value>>() {
            return inner.take().unwrap_or_default();
        }
        Value(slot.map(|v| Box::new(v) as Box<dyn Dynamic>))
    }

    pub fn null() -> Self {
        Value(None)
    }

    /// `Some(v)` wraps `v`, `None` is null.
    pub fn from_option<T: Any + Clone + Send + Sync>(value: Option<T>) -> Self {
        value.map_or_else(Value::null, Value::new)
    }

    pub fn is_null(&self) -> bool {
        self.0.is_none()
    }

    /// Runtime type of the held value; `None` for null.
    pub fn type_key(&self) -> Option<TypeKey> {
        self.0.as_ref().map(|b| Dynamic::type_key(&**b))
    }

    pub fn type_name(&self) -> &'static str {
        self.type_key().map_or("null", |k| k.name())
    }

    pub fn is<T: Any>(&self) -> bool {
        self.downcast_ref::<T>().is_some()
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.0
            .as_ref()
            .and_then(|b| Dynamic::as_any(&**b).downcast_ref::<T>())
    }

    /// Take the held value as `T`.
    ///
    /// On a type mismatch (or null) the value is handed back untouched.
    pub fn take<T: Any>(self) -> Result<T, Value> {
        match self.0 {
            Some(b) if Dynamic::as_any(&*b).is::<T>() => {
                match Dynamic::into_any(b).downcast::<T>() {
                    Ok(v) => Ok(*v),
                    // Checked by `is::<T>()` above.
                    Err(_) => Err(Value::null()),
                }
            }
            other => Err(Value(other)),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::null()
    }
}

impl Clone for Value {
    fn clone(&self) -> Self {
        Value(self.0.as_ref().map(|b| Dynamic::clone_boxed(&**b)))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Value({})", self.type_name())
    }
}
