//! Rendered templates.
//!
//! A pack renders to a set of named text templates. This module holds them,
//! routes each one to the object kind it describes, and loads them from a
//! directory of rendered output.

use std::collections::BTreeMap;
use std::path::Path;
use tracing::{debug, info};

use crate::cluster::ObjectKind;
use crate::error::{ConfigError, PackError, Result};

/// Rendered templates keyed by template name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Templates(BTreeMap<String, String>);

impl Templates {
    /// Creates an empty set.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Adds a template, replacing any template with the same name.
    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        self.0.insert(name.into(), text.into());
    }

    /// Returns the text of a template.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&str> {
        self.0.get(name).map(String::as_str)
    }

    /// Iterates templates in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Returns the number of templates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true if there are no templates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Splits the set by the object kind each template name routes to.
    #[must_use]
    pub fn split_by_kind(self) -> BTreeMap<ObjectKind, Self> {
        let mut split: BTreeMap<ObjectKind, Self> = BTreeMap::new();
        for (name, text) in self.0 {
            let kind = ObjectKind::from_template_name(&name);
            debug!("Routing template {name} to {kind} deployer");
            split.entry(kind).or_default().0.insert(name, text);
        }
        split
    }

    /// Loads every regular file in `dir` as a template named after the file.
    ///
    /// Hidden files are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be read or holds no templates.
    pub fn load_dir(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        info!("Loading rendered templates from: {}", dir.display());

        if !dir.is_dir() {
            return Err(PackError::Config(ConfigError::TemplatesNotFound {
                path: dir.to_path_buf(),
            }));
        }

        let mut templates = Self::new();
        for entry in std::fs::read_dir(dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }

            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let text = std::fs::read_to_string(entry.path())?;
            debug!("Loaded template {name} ({} bytes)", text.len());
            templates.insert(name, text);
        }

        if templates.is_empty() {
            return Err(PackError::Config(ConfigError::TemplatesNotFound {
                path: dir.to_path_buf(),
            }));
        }

        Ok(templates)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Templates {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_by_kind() {
        let templates: Templates = [
            ("web.job.yaml", "job: {}"),
            ("job.tmpl", "job: {}"),
            ("data.volume.yaml", "volume: {}"),
            ("team.namespace.yaml", "namespace: {}"),
        ]
        .into_iter()
        .collect();

        let split = templates.split_by_kind();
        assert_eq!(split.len(), 3);
        assert_eq!(split[&ObjectKind::Job].len(), 2);
        assert_eq!(split[&ObjectKind::Volume].len(), 1);
        assert!(split[&ObjectKind::Namespace].get("team.namespace.yaml").is_some());
    }

    #[test]
    fn test_load_dir() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("web.job.yaml"), "job:\n  name: web\n").expect("write");
        std::fs::write(dir.path().join(".hidden"), "ignored").expect("write");
        std::fs::create_dir(dir.path().join("nested")).expect("mkdir");

        let templates = Templates::load_dir(dir.path()).expect("load");
        assert_eq!(templates.len(), 1);
        assert_eq!(templates.get("web.job.yaml"), Some("job:\n  name: web\n"));
    }

    #[test]
    fn test_load_empty_dir_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = Templates::load_dir(dir.path()).expect_err("empty");
        assert!(matches!(
            err,
            PackError::Config(ConfigError::TemplatesNotFound { .. })
        ));
    }
}
