//! Per-kind behavior plugged into the generic deployer.

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

use crate::cluster::{ClusterClient, ClusterResult, ManagedObject, ObjectId};
use crate::error::TemplateError;

use super::deployer::ParsedTemplates;

/// How one object kind is decoded, normalized, and exchanged with the
/// cluster.
#[async_trait]
pub trait DeployKind: ManagedObject {
    /// Decodes rendered template text.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::Parse`] if the text is not a valid document
    /// for this kind.
    fn parse(text: &str) -> Result<Self, TemplateError>;

    /// Fills defaults the cluster would otherwise apply and validates the
    /// result. Returns every problem found.
    fn canonicalize(&mut self) -> Vec<TemplateError>;

    /// Wraps parsed objects of this kind.
    fn view(parsed: &BTreeMap<String, Self>) -> ParsedTemplates<'_>;

    /// Lists live objects of this kind across all namespaces.
    async fn list(client: &dyn ClusterClient) -> ClusterResult<Vec<Self>>;

    /// Creates or updates this object.
    async fn submit(&self, client: &dyn ClusterClient) -> ClusterResult<()>;

    /// Removes the object with `id`.
    async fn remove(client: &dyn ClusterClient, id: &ObjectId) -> ClusterResult<()>;
}

/// Decodes a YAML (or JSON) document whose single top-level key is `key`.
///
/// # Errors
///
/// Returns [`TemplateError::Parse`] if the document is empty, not a mapping,
/// has other top-level keys, or does not decode into `T`.
pub fn parse_document<T: DeserializeOwned>(text: &str, key: &str) -> Result<T, TemplateError> {
    let document: serde_yaml::Value =
        serde_yaml::from_str(text).map_err(|e| TemplateError::Parse {
            message: e.to_string(),
        })?;

    let serde_yaml::Value::Mapping(mut mapping) = document else {
        return Err(TemplateError::Parse {
            message: format!("expected a mapping with a top-level '{key}' key"),
        });
    };

    let body = mapping
        .remove(key)
        .ok_or_else(|| TemplateError::Parse {
            message: format!("missing top-level '{key}' key"),
        })?;

    if let Some(extra) = mapping.keys().next() {
        let extra = extra.as_str().unwrap_or("<non-string key>");
        return Err(TemplateError::Parse {
            message: format!("unexpected top-level key '{extra}' next to '{key}'"),
        });
    }

    serde_yaml::from_value(body).map_err(|e| TemplateError::Parse {
        message: e.to_string(),
    })
}

/// Lowercase alphanumerics and hyphens, starting with a letter, with no
/// trailing or doubled hyphen.
pub(crate) fn is_valid_name(name: &str) -> bool {
    let mut chars = name.chars();

    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }

    chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !name.ends_with('-')
        && !name.contains("--")
}

/// ASCII letters, digits, `-`, `_` and `.`, not starting with `.`.
///
/// Job names end up in request paths, so anything that would split or
/// terminate a path segment is rejected.
pub(crate) fn is_valid_identifier(name: &str) -> bool {
    !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
}

/// Checks a namespace reference, returning an error for `field` if invalid.
pub(crate) fn check_namespace(field: &str, namespace: &str) -> Option<TemplateError> {
    (!is_valid_name(namespace)).then(|| {
        TemplateError::invalid(
            field,
            format!("'{namespace}' must be lowercase alphanumeric with hyphens, starting with a letter"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::Namespace;

    #[test]
    fn test_parse_document() {
        let ns: Namespace = parse_document("namespace:\n  name: team-a\n", "namespace")
            .expect("parse");
        assert_eq!(ns.name, "team-a");
    }

    #[test]
    fn test_parse_document_accepts_json() {
        let ns: Namespace =
            parse_document(r#"{"namespace": {"name": "team-a"}}"#, "namespace").expect("parse");
        assert_eq!(ns.name, "team-a");
    }

    #[test]
    fn test_parse_document_rejects_wrong_shape() {
        assert!(parse_document::<Namespace>("", "namespace").is_err());
        assert!(parse_document::<Namespace>("- a\n- b\n", "namespace").is_err());
        assert!(parse_document::<Namespace>("job:\n  name: x\n", "namespace").is_err());
        assert!(parse_document::<Namespace>(
            "namespace:\n  name: x\nextra: 1\n",
            "namespace"
        )
        .is_err());
        assert!(parse_document::<Namespace>("namespace:\n  nam: x\n", "namespace").is_err());
    }

    #[test]
    fn test_valid_name() {
        assert!(is_valid_name("team-a"));
        assert!(is_valid_name("a1"));
        assert!(!is_valid_name(""));
        assert!(!is_valid_name("Team"));
        assert!(!is_valid_name("1team"));
        assert!(!is_valid_name("team_a"));
        assert!(!is_valid_name("team-"));
        assert!(!is_valid_name("team--a"));
    }

    #[test]
    fn test_valid_identifier() {
        assert!(is_valid_identifier("web"));
        assert!(is_valid_identifier("Web_v1.2-canary"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("a/b"));
        assert!(!is_valid_identifier("web?x=1"));
        assert!(!is_valid_identifier("web#frag"));
        assert!(!is_valid_identifier(".."));
        assert!(!is_valid_identifier("web job"));
    }

    #[test]
    fn test_check_namespace() {
        assert!(check_namespace("job.namespace", "default").is_none());
        let err = check_namespace("job.namespace", "a/b").expect("invalid");
        assert!(matches!(err, TemplateError::Invalid { ref field, .. } if field == "job.namespace"));
    }
}
