use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

/// Per-call mapping policy.
///
/// Serde-friendly so a host can keep mapping policies in its own config
/// file; missing keys take the defaults below.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MapOptions {
    /// Destination fields never touched: no read, no conversion, no write.
    #[serde(default)]
    pub ignore: BTreeSet<String>,

    /// Skip source fields that read as null instead of writing null.
    /// Overrides are never skipped, even when null.
    #[serde(default = "default_ignore_source_nulls")]
    pub ignore_source_nulls: bool,
}

fn default_ignore_source_nulls() -> bool {
    true
}

impl Default for MapOptions {
    fn default() -> Self {
        Self {
            ignore: BTreeSet::new(),
            ignore_source_nulls: default_ignore_source_nulls(),
        }
    }
}

impl MapOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ignoring<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.ignore.extend(names.into_iter().map(Into::into));
        self
    }

    /// Write nulls read from the source instead of skipping them.
    pub fn keep_source_nulls(mut self) -> Self {
        self.ignore_source_nulls = false;
        self
    }

    pub fn is_ignored(&self, name: &str) -> bool {
        self.ignore.contains(name)
    }
}
