use std::any::Any;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::{Arc, OnceLock, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::error::FieldError;
use crate::value::{TypeKey, Value};

/// Field-level value converter.
///
/// Registered per source type; applied to every value of that type on its way
/// into a destination field. The output may be of any type, as long as the
/// destination field accepts it.
pub trait FieldConverter: Send + Sync {
    fn convert(&self, value: Value) -> Result<Value, FieldError>;
}

/// Untyped closure converter.
struct FnConverter<F>(F);

impl<F> FieldConverter for FnConverter<F>
where
    F: Fn(Value) -> Result<Value, FieldError> + Send + Sync,
{
    fn convert(&self, value: Value) -> Result<Value, FieldError> {
        (self.0)(value)
    }
}

/// `T → U` closure converter. Null passes through untouched.
struct TypedConverter<T, U, F> {
    f: F,
    _types: PhantomData<fn(T) -> U>,
}

impl<T, U, F> FieldConverter for TypedConverter<T, U, F>
where
    T: Any,
    U: Any + Clone + Send + Sync,
    F: Fn(T) -> U + Send + Sync,
{
    fn convert(&self, value: Value) -> Result<Value, FieldError> {
        if value.is_null() {
            return Ok(value);
        }
        match value.take::<T>() {
            Ok(v) => Ok(Value::new((self.f)(v))),
            Err(rejected) => Err(FieldError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: rejected.type_name(),
            }),
        }
    }
}

/// Registry of converters keyed by source value type.
///
/// Interior mutability: converters can be registered while other threads map.
/// Lookups clone the `Arc` out and release the lock before the converter runs.
pub struct ConverterRegistry {
    converters: RwLock<HashMap<TypeKey, Arc<dyn FieldConverter>>>,
}

impl Default for ConverterRegistry {
    fn default() -> Self {
        Self {
            converters: RwLock::new(HashMap::new()),
        }
    }
}

impl std::fmt::Debug for ConverterRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConverterRegistry")
            .field("types", &self.type_names())
            .finish()
    }
}

impl ConverterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide registry used by the free functions and `Mapper::global()`.
    pub fn global() -> &'static Arc<ConverterRegistry> {
        static GLOBAL: OnceLock<Arc<ConverterRegistry>> = OnceLock::new();
        GLOBAL.get_or_init(|| Arc::new(ConverterRegistry::new()))
    }

    /// Store `converter` for values of type `key`. Last registration wins.
    pub fn register(&self, key: TypeKey, converter: Arc<dyn FieldConverter>) {
        let replaced = self.write_guard().insert(key, converter).is_some();
        tracing::debug!(type_name = %key, replaced, "registered converter");
    }

    pub fn register_fn<F>(&self, key: TypeKey, f: F)
    where
        F: Fn(Value) -> Result<Value, FieldError> + Send + Sync + 'static,
    {
        self.register(key, Arc::new(FnConverter(f)));
    }

    /// Register a typed `T → U` conversion keyed by `T`.
    pub fn register_typed<T, U, F>(&self, f: F)
    where
        T: Any,
        U: Any + Clone + Send + Sync,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        self.register(
            TypeKey::of::<T>(),
            Arc::new(TypedConverter {
                f,
                _types: PhantomData,
            }),
        );
    }

    pub fn get(&self, key: TypeKey) -> Option<Arc<dyn FieldConverter>> {
        self.read_guard().get(&key).cloned()
    }

    pub fn contains(&self, key: TypeKey) -> bool {
        self.read_guard().contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.read_guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read_guard().is_empty()
    }

    /// Names of all registered types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.read_guard().keys().map(|k| k.name()).collect();
        names.sort_unstable();
        names
    }

    fn read_guard(&self) -> RwLockReadGuard<'_, HashMap<TypeKey, Arc<dyn FieldConverter>>> {
        match self.converters.read() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("converter registry read lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    fn write_guard(&self) -> RwLockWriteGuard<'_, HashMap<TypeKey, Arc<dyn FieldConverter>>> {
        match self.converters.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("converter registry write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }
}
