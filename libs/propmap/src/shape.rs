use std::fmt;

use crate::error::FieldError;
use crate::value::{TypeKey, Value};

/// Read accessor: clone the field out of an instance.
pub type Getter<T> = fn(&T) -> Result<Value, FieldError>;

/// Write accessor: store a value into the field of an instance.
pub type Setter<T> = fn(&mut T, Value) -> Result<(), FieldError>;

/// One publicly mappable field of shape `T`.
///
/// Plain data, `Copy`: a field map holds accessors by value and can be shared
/// across threads regardless of `T`.
pub struct FieldAccessor<T> {
    /// Matching name (the Rust field name unless renamed).
    pub name: &'static str,
    /// Declared type. For `Option<U>` fields this is `U`.
    pub declared: TypeKey,
    /// `true` for `Option<U>` fields: null reads and writes are legal.
    pub nullable: bool,
    pub get: Getter<T>,
    pub set: Setter<T>,
}

impl<T> FieldAccessor<T> {
    pub fn read(&self, instance: &T) -> Result<Value, FieldError> {
        (self.get)(instance)
    }

    pub fn write(&self, instance: &mut T, value: Value) -> Result<(), FieldError> {
        (self.set)(instance, value)
    }
}

impl<T> Clone for FieldAccessor<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for FieldAccessor<T> {}

impl<T> fmt::Debug for FieldAccessor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldAccessor")
            .field("name", &self.name)
            .field("declared", &self.declared)
            .field("nullable", &self.nullable)
            .finish()
    }
}

/// A struct whose public fields can be enumerated, read and written by name.
///
/// Normally implemented with `#[derive(Shape)]`. Hand-written impls must keep
/// `fields()` deterministic and `field(name)` consistent with it.
pub trait Shape: Sized + 'static {
    /// All mappable fields, in declaration order.
    fn fields() -> Vec<FieldAccessor<Self>>;

    /// Accessor for the field called `name`, if any.
    fn field(name: &str) -> Option<FieldAccessor<Self>> {
        Self::fields().into_iter().find(|f| f.name == name)
    }

    fn shape_name() -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Accessor bodies used by `#[derive(Shape)]`.
#[doc(hidden)]
pub mod access {
    use std::any::Any;

    use crate::error::FieldError;
    use crate::value::Value;

    pub fn read<T: Any + Clone + Send + Sync>(field: &T) -> Result<Value, FieldError> {
        Ok(Value::new(field.clone()))
    }

    pub fn read_optional<T: Any + Clone + Send + Sync>(
        field: &Option<T>,
    ) -> Result<Value, FieldError> {
        Ok(Value::from_option(field.clone()))
    }

    pub fn write<T: Any>(field: &mut T, value: Value) -> Result<(), FieldError> {
        if value.is_null() {
            return Err(FieldError::NullNotAllowed {
                expected: std::any::type_name::<T>(),
            });
        }
        match value.take::<T>() {
            Ok(v) => {
                *field = v;
                Ok(())
            }
            Err(rejected) => Err(FieldError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: rejected.type_name(),
            }),
        }
    }

    /// Accepts null, a `T`, or an `Option<T>`.
    pub fn write_optional<T: Any>(field: &mut Option<T>, value: Value) -> Result<(), FieldError> {
        if value.is_null() {
            *field = None;
            return Ok(());
        }
        let value = match value.take::<T>() {
            Ok(v) => {
                *field = Some(v);
                return Ok(());
            }
            Err(value) => value,
        };
        match value.take::<Option<T>>() {
            Ok(v) => {
                *field = v;
                Ok(())
            }
            Err(rejected) => Err(FieldError::TypeMismatch {
                expected: std::any::type_name::<T>(),
                found: rejected.type_name(),
            }),
        }
    }
}
