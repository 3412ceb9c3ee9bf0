//! Name-based property mapping between struct shapes.
//!
//! Public fields of a source struct are copied into the same-named fields of
//! a destination struct, with optional per-call overrides, an ignore set, and
//! per-type converters.
//!
//! ```
//! use propmap::{FieldValues, MapOptions, Shape};
//!
//! #[derive(Shape)]
//! struct User {
//!     pub id: u64,
//!     pub name: String,
//!     pub email: Option<String>,
//! }
//!
//! #[derive(Shape, Default)]
//! struct UserDto {
//!     pub id: u64,
//!     pub name: String,
//!     pub email: Option<String>,
//! }
//!
//! let user = User { id: 7, name: "ada".into(), email: None };
//! let overrides = FieldValues::new().with("name", "Ada".to_string());
//! let dto: UserDto = propmap::map_object(Some(&user), Some(&overrides), None, &MapOptions::default())
//!     .unwrap()
//!     .unwrap();
//! assert_eq!((dto.id, dto.name.as_str(), dto.email), (7, "Ada", None));
//! ```

extern crate self as propmap;

pub mod converter;
pub mod engine;
pub mod error;
pub mod mapping;
pub mod options;
pub mod overrides;
pub mod shape;
pub mod value;

pub use propmap_derive::Shape;

pub use converter::{ConverterRegistry, FieldConverter};
pub use engine::Mapper;
pub use error::{FieldError, MapError};
pub use mapping::{FieldDescriptor, FieldMap};
pub use options::MapOptions;
pub use overrides::{FieldValues, OverrideSource};
pub use shape::{FieldAccessor, Shape};
pub use value::{TypeKey, Value};

use std::sync::Arc;

/// [`Mapper::map_object`] on the global mapper.
pub fn map_object<S: Shape, D: Shape + Default>(
    source: Option<&S>,
    overrides: Option<&dyn OverrideSource>,
    destination: Option<D>,
    options: &MapOptions,
) -> Result<Option<D>, MapError> {
    Mapper::global().map_object(source, overrides, destination, options)
}

/// [`Mapper::map_objects`] on the global mapper.
pub fn map_objects<S: Shape, D: Shape + Default>(
    items: Option<&[S]>,
    options: &MapOptions,
) -> Result<Option<Vec<D>>, MapError> {
    Mapper::global().map_objects(items, options)
}

/// [`Mapper::map_objects_with`] on the global mapper.
pub fn map_objects_with<S, D, O, F>(
    items: Option<&[S]>,
    producer: F,
    options: &MapOptions,
) -> Result<Option<Vec<D>>, MapError>
where
    S: Shape,
    D: Shape + Default,
    O: OverrideSource,
    F: FnMut(&S) -> O,
{
    Mapper::global().map_objects_with(items, producer, options)
}

/// Register `converter` for values of type `key` in the global registry.
pub fn register_converter(key: TypeKey, converter: Arc<dyn FieldConverter>) {
    ConverterRegistry::global().register(key, converter);
}
