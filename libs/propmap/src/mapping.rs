use std::fmt;

use crate::shape::{FieldAccessor, Shape};

/// One destination field with its same-named source field, if the source has one.
pub struct FieldDescriptor<S, D> {
    /// Destination accessor. Always present.
    pub target: FieldAccessor<D>,
    /// `None` → the source shape has no field with this name.
    pub source: Option<FieldAccessor<S>>,
}

impl<S, D> FieldDescriptor<S, D> {
    pub fn name(&self) -> &'static str {
        self.target.name
    }

    pub fn is_matched(&self) -> bool {
        self.source.is_some()
    }
}

impl<S, D> Clone for FieldDescriptor<S, D> {
    fn clone(&self) -> Self {
        Self {
            target: self.target,
            source: self.source,
        }
    }
}

impl<S, D> fmt::Debug for FieldDescriptor<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name())
            .field("target", &self.target.declared)
            .field("source", &self.source.map(|s| s.declared))
            .finish()
    }
}

/// Resolved source → destination field correspondence for one pair of shapes.
///
/// Built once, then reused for every instance of the pair:
///
/// - one entry per destination field, in destination declaration order
/// - matching is by exact name; source-only fields never appear
/// - immutable after `build()`, so it can sit behind an `Arc` and be shared
pub struct FieldMap<S, D> {
    fields: Vec<FieldDescriptor<S, D>>,
}

impl<S: Shape, D: Shape> FieldMap<S, D> {
    pub fn build() -> Self {
        let fields: Vec<FieldDescriptor<S, D>> = D::fields()
            .into_iter()
            .map(|target| FieldDescriptor {
                source: S::field(target.name),
                target,
            })
            .collect();

        tracing::debug!(
            source = S::shape_name(),
            destination = D::shape_name(),
            fields = fields.len(),
            matched = fields.iter().filter(|f| f.is_matched()).count(),
            "built field map"
        );

        Self { fields }
    }
}

impl<S, D> FieldMap<S, D> {
    pub fn iter(&self) -> std::slice::Iter<'_, FieldDescriptor<S, D>> {
        self.fields.iter()
    }

    pub fn get(&self, name: &str) -> Option<&FieldDescriptor<S, D>> {
        self.fields.iter().find(|f| f.name() == name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Destination fields that have a same-named source field.
    pub fn matched(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| f.is_matched()).map(|f| f.name())
    }

    /// Destination fields only reachable through overrides.
    pub fn unmatched(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().filter(|f| !f.is_matched()).map(|f| f.name())
    }
}

impl<'a, S, D> IntoIterator for &'a FieldMap<S, D> {
    type Item = &'a FieldDescriptor<S, D>;
    type IntoIter = std::slice::Iter<'a, FieldDescriptor<S, D>>;

    fn into_iter(self) -> Self::IntoIter {
        self.fields.iter()
    }
}

impl<S, D> fmt::Debug for FieldMap<S, D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.fields.iter()).finish()
    }
}
