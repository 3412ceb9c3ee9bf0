/// Failure of a single accessor or converter, without field context.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FieldError {
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("null cannot be assigned to non-optional {expected}")]
    NullNotAllowed { expected: &'static str },

    #[error("conversion failed: {0}")]
    Conversion(String),

    #[error("{0}")]
    Access(String),
}

impl FieldError {
    pub fn conversion(msg: impl Into<String>) -> Self {
        Self::Conversion(msg.into())
    }

    pub fn access(msg: impl Into<String>) -> Self {
        Self::Access(msg.into())
    }
}

/// Mapping failure. Every variant names the field (or element) involved.
#[derive(Debug, thiserror::Error)]
pub enum MapError {
    #[error("failed to read field '{field}': {source}")]
    Read { field: String, source: FieldError },

    #[error("failed to convert field '{field}': {source}")]
    Convert { field: String, source: FieldError },

    #[error("failed to write field '{field}': {source}")]
    Write { field: String, source: FieldError },

    #[error("element {index}: {source}")]
    Element {
        index: usize,
        #[source]
        source: Box<MapError>,
    },
}

impl MapError {
    pub fn read(field: impl Into<String>, source: FieldError) -> Self {
        Self::Read { field: field.into(), source }
    }

    pub fn convert(field: impl Into<String>, source: FieldError) -> Self {
        Self::Convert { field: field.into(), source }
    }

    pub fn write(field: impl Into<String>, source: FieldError) -> Self {
        Self::Write { field: field.into(), source }
    }

    /// Attach the position of the failing element in a collection mapping.
    pub fn with_element(self, index: usize) -> Self {
        Self::Element {
            index,
            source: Box::new(self),
        }
    }

    /// Name of the field the failure happened on.
    pub fn field(&self) -> &str {
        match self {
            MapError::Read { field, .. }
            | MapError::Convert { field, .. }
            | MapError::Write { field, .. } => field,
            MapError::Element { source, .. } => source.field(),
        }
    }

    /// The accessor-level cause, looking through element context.
    pub fn field_error(&self) -> &FieldError {
        match self {
            MapError::Read { source, .. }
            | MapError::Convert { source, .. }
            | MapError::Write { source, .. } => source,
            MapError::Element { source, .. } => source.field_error(),
        }
    }
}
