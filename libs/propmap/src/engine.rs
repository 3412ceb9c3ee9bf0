use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, OnceLock, RwLock};

use crate::converter::ConverterRegistry;
use crate::error::MapError;
use crate::mapping::{FieldDescriptor, FieldMap};
use crate::options::MapOptions;
use crate::overrides::{FieldValues, OverrideSource, resolve_override};
use crate::shape::Shape;
use crate::value::Value;

type CachedFieldMap = Arc<dyn Any + Send + Sync>;

/// The mapping engine.
///
/// Holds the converter registry it applies and a cache of field maps, one per
/// (source, destination) shape pair. Cheap to share: every method takes `&self`.
pub struct Mapper {
    registry: Arc<ConverterRegistry>,
    field_maps: RwLock<HashMap<(TypeId, TypeId), CachedFieldMap>>,
}

impl std::fmt::Debug for Mapper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mapper")
            .field("registry", &self.registry)
            .finish()
    }
}

impl Default for Mapper {
    fn default() -> Self {
        Self::new(Arc::new(ConverterRegistry::new()))
    }
}

impl Mapper {
    pub fn new(registry: Arc<ConverterRegistry>) -> Self {
        Self {
            registry,
            field_maps: RwLock::new(HashMap::new()),
        }
    }

    /// Mapper bound to [`ConverterRegistry::global()`].
    pub fn global() -> &'static Mapper {
        static GLOBAL: OnceLock<Mapper> = OnceLock::new();
        GLOBAL.get_or_init(|| Mapper::new(Arc::clone(ConverterRegistry::global())))
    }

    pub fn registry(&self) -> &Arc<ConverterRegistry> {
        &self.registry
    }

    /// Cached field map for `S → D`, built on first use.
    pub fn field_map<S: Shape, D: Shape>(&self) -> Arc<FieldMap<S, D>> {
        let key = (TypeId::of::<S>(), TypeId::of::<D>());

        let cached = {
            let guard = match self.field_maps.read() {
                Ok(g) => g,
                Err(poisoned) => {
                    tracing::warn!("field map cache read lock was poisoned, recovering");
                    poisoned.into_inner()
                }
            };
            guard.get(&key).cloned()
        };
        if let Some(map) = cached.and_then(|m| m.downcast::<FieldMap<S, D>>().ok()) {
            return map;
        }

        let map = Arc::new(FieldMap::<S, D>::build());
        let mut guard = match self.field_maps.write() {
            Ok(g) => g,
            Err(poisoned) => {
                tracing::warn!("field map cache write lock was poisoned, recovering");
                poisoned.into_inner()
            }
        };
        // Another thread may have built the same map meanwhile; keep the first.
        let entry = guard
            .entry(key)
            .or_insert_with(|| Arc::clone(&map) as CachedFieldMap);
        Arc::clone(entry).downcast::<FieldMap<S, D>>().unwrap_or(map)
    }

    /// Map one instance through a prebuilt field map.
    ///
    /// - `source == None` → `Ok(None)`, nothing is constructed.
    /// - `destination == None` → a fresh `D::default()` is populated.
    /// - `destination == Some(d)` → `d` is updated in place and returned.
    ///
    /// On error the destination is dropped; fields before the failing one may
    /// already have been written.
    pub fn map_instance<S: Shape, D: Shape + Default>(
        &self,
        source: Option<&S>,
        field_map: &FieldMap<S, D>,
        overrides: Option<&dyn OverrideSource>,
        destination: Option<D>,
        options: &MapOptions,
    ) -> Result<Option<D>, MapError> {
        let Some(source) = source else {
            return Ok(None);
        };
        let mut destination = destination.unwrap_or_default();
        self.apply(source, field_map, overrides, &mut destination, options)?;
        Ok(Some(destination))
    }

    /// Map `source` into a `D`, resolving the field map from the cache.
    pub fn map_object<S: Shape, D: Shape + Default>(
        &self,
        source: Option<&S>,
        overrides: Option<&dyn OverrideSource>,
        destination: Option<D>,
        options: &MapOptions,
    ) -> Result<Option<D>, MapError> {
        let Some(source) = source else {
            return Ok(None);
        };
        let field_map = self.field_map::<S, D>();
        self.map_instance(Some(source), &field_map, overrides, destination, options)
    }

    /// Map into a fresh `D` with default options.
    pub fn map<S: Shape, D: Shape + Default>(&self, source: &S) -> Result<D, MapError> {
        let field_map = self.field_map::<S, D>();
        let mut destination = D::default();
        self.apply(source, &field_map, None, &mut destination, &MapOptions::default())?;
        Ok(destination)
    }

    /// Merge `source` into an existing `destination`.
    pub fn map_into<S: Shape, D: Shape>(
        &self,
        source: &S,
        destination: &mut D,
        overrides: Option<&dyn OverrideSource>,
        options: &MapOptions,
    ) -> Result<(), MapError> {
        let field_map = self.field_map::<S, D>();
        self.apply(source, &field_map, overrides, destination, options)
    }

    /// Map every element into a fresh `D`; order and length are preserved.
    pub fn map_objects<S: Shape, D: Shape + Default>(
        &self,
        items: Option<&[S]>,
        options: &MapOptions,
    ) -> Result<Option<Vec<D>>, MapError> {
        self.map_each(items, options, |_| None::<FieldValues>)
    }

    /// Like [`Mapper::map_objects`], with overrides produced per element.
    pub fn map_objects_with<S, D, O, F>(
        &self,
        items: Option<&[S]>,
        mut producer: F,
        options: &MapOptions,
    ) -> Result<Option<Vec<D>>, MapError>
    where
        S: Shape,
        D: Shape + Default,
        O: OverrideSource,
        F: FnMut(&S) -> O,
    {
        self.map_each(items, options, |item| Some(producer(item)))
    }

    fn map_each<S, D, O, F>(
        &self,
        items: Option<&[S]>,
        options: &MapOptions,
        mut producer: F,
    ) -> Result<Option<Vec<D>>, MapError>
    where
        S: Shape,
        D: Shape + Default,
        O: OverrideSource,
        F: FnMut(&S) -> Option<O>,
    {
        let Some(items) = items else {
            return Ok(None);
        };
        tracing::trace!(
            source = S::shape_name(),
            destination = D::shape_name(),
            count = items.len(),
            "mapping collection"
        );

        let field_map = self.field_map::<S, D>();
        let mut mapped = Vec::with_capacity(items.len());
        for (index, item) in items.iter().enumerate() {
            let overrides = producer(item);
            let mut destination = D::default();
            self.apply(
                item,
                &field_map,
                overrides.as_ref().map(|o| o as &dyn OverrideSource),
                &mut destination,
                options,
            )
            .map_err(|e| e.with_element(index))?;
            mapped.push(destination);
        }
        Ok(Some(mapped))
    }

    fn apply<S, D>(
        &self,
        source: &S,
        field_map: &FieldMap<S, D>,
        overrides: Option<&dyn OverrideSource>,
        destination: &mut D,
        options: &MapOptions,
    ) -> Result<(), MapError> {
        for descriptor in field_map {
            let name = descriptor.name();
            if options.is_ignored(name) {
                continue;
            }
            let Some(value) = self.resolve(source, descriptor, overrides, options)? else {
                continue;
            };
            let value = self.convert(descriptor, value)?;
            descriptor
                .target
                .write(destination, value)
                .map_err(|e| MapError::write(name, e))?;
        }
        Ok(())
    }

    /// Override first, then the source field. `None` → leave the field alone.
    fn resolve<S, D>(
        &self,
        source: &S,
        descriptor: &FieldDescriptor<S, D>,
        overrides: Option<&dyn OverrideSource>,
        options: &MapOptions,
    ) -> Result<Option<Value>, MapError> {
        let name = descriptor.name();
        if let Some(value) = resolve_override(overrides, name)? {
            return Ok(Some(value));
        }
        let Some(accessor) = descriptor.source else {
            return Ok(None);
        };
        let value = accessor
            .read(source)
            .map_err(|e| MapError::read(name, e))?;
        if value.is_null() && options.ignore_source_nulls {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Converter key: runtime type of a non-null value, else the source
    /// field's declared type.
    fn convert<S, D>(
        &self,
        descriptor: &FieldDescriptor<S, D>,
        value: Value,
    ) -> Result<Value, MapError> {
        let key = value
            .type_key()
            .or_else(|| descriptor.source.map(|s| s.declared));
        match key.and_then(|k| self.registry.get(k)) {
            Some(converter) => converter
                .convert(value)
                .map_err(|e| MapError::convert(descriptor.name(), e)),
            None => Ok(value),
        }
    }
}
