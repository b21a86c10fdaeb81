//! Error context breadcrumbs.
//!
//! An [`ErrorContext`] is an ordered list of `key: value` annotations that
//! tells the console which pack, template, or object an error belongs to.
//! It never influences control flow.

use serde::Serialize;

/// Ordered key/value annotations describing where an error happened.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorContext {
    entries: Vec<(String, String)>,
}

impl ErrorContext {
    /// Key for the pack name.
    pub const PACK: &'static str = "Pack";
    /// Key for the registry name.
    pub const REGISTRY: &'static str = "Registry";
    /// Key for the deployment name.
    pub const DEPLOYMENT: &'static str = "Deployment";
    /// Key for the template name.
    pub const TEMPLATE: &'static str = "Template";
    /// Key for the object kind.
    pub const KIND: &'static str = "Kind";
    /// Key for the object name.
    pub const OBJECT: &'static str = "Object";

    /// Creates an empty context.
    #[must_use]
    pub const fn new() -> Self {
        Self { entries: Vec::new() }
    }

    /// Appends an annotation.
    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.push((key.into(), value.into()));
    }

    /// Appends an annotation and returns the context.
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append(key, value);
        self
    }

    /// Returns a copy to layer further annotations on, leaving `self` untouched.
    #[must_use]
    pub fn layered(&self) -> Self {
        self.clone()
    }

    /// Appends every annotation of `other` after the existing ones.
    pub fn extend(&mut self, other: &Self) {
        self.entries.extend(other.entries.iter().cloned());
    }

    /// Returns the most recent value recorded for `key`.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .rev()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Iterates the annotations in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of annotations.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no annotations.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl std::fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "- {key}: {value}")?;
        }
        Ok(())
    }
}
