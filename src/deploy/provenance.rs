//! Provenance metadata.
//!
//! Every object a deployer submits is stamped with the keys in
//! [`ProvenanceKey`]. Conflict detection, destruction and `status` all read
//! the same table back, so tagging and querying cannot drift apart.

use serde::Serialize;

use crate::cluster::{ManagedObject, Metadata};
use crate::config::DeploymentConfig;

/// Reserved metadata keys written onto deployed objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProvenanceKey {
    /// Path the pack was loaded from.
    PackPath,
    /// Pack name.
    PackName,
    /// Registry the pack came from.
    PackRegistry,
    /// Deployment name.
    DeploymentName,
    /// Pack version.
    PackVersion,
    /// Name of the object itself.
    PackJob,
}

impl ProvenanceKey {
    /// Every reserved key.
    pub const ALL: [Self; 6] = [
        Self::PackPath,
        Self::PackName,
        Self::PackRegistry,
        Self::DeploymentName,
        Self::PackVersion,
        Self::PackJob,
    ];

    /// The keys taken from the deployment config.
    pub const DEPLOYMENT: [Self; 5] = [
        Self::PackPath,
        Self::PackName,
        Self::PackRegistry,
        Self::DeploymentName,
        Self::PackVersion,
    ];

    /// Metadata key as stored on the object.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::PackPath => "pack-path",
            Self::PackName => "pack-name",
            Self::PackRegistry => "pack-registry",
            Self::DeploymentName => "pack-deployment-name",
            Self::PackVersion => "pack-version",
            Self::PackJob => "pack-job",
        }
    }

    /// Returns true if `key` is reserved.
    #[must_use]
    pub fn is_reserved(key: &str) -> bool {
        Self::ALL.iter().any(|k| k.as_str() == key)
    }

    fn value<'a>(self, config: &'a DeploymentConfig, object_name: &'a str) -> &'a str {
        match self {
            Self::PackPath => config.pack_path(),
            Self::PackName => config.pack_name(),
            Self::PackRegistry => config.registry_name(),
            Self::DeploymentName => config.deployment_name(),
            Self::PackVersion => config.pack_version(),
            Self::PackJob => object_name,
        }
    }
}

impl std::fmt::Display for ProvenanceKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stamps `object` with provenance for `config`.
///
/// Existing metadata is kept; reserved keys are overwritten. Applying the tag
/// again yields the same map.
pub fn tag<M: ManagedObject>(object: &mut M, config: &DeploymentConfig) {
    let mut meta = object.take_meta().unwrap_or_default();
    let name = object.name().to_string();

    for key in ProvenanceKey::ALL {
        meta.insert(key.as_str().to_string(), key.value(config, &name).to_string());
    }

    object.set_meta(meta);
}

/// Provenance read back from an object's metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Provenance {
    /// Deployment name.
    pub deployment_name: String,
    /// Pack name.
    pub pack_name: String,
    /// Pack path.
    pub pack_path: String,
    /// Pack version.
    pub pack_version: String,
    /// Registry name.
    pub registry_name: String,
    /// Object name recorded at tagging time.
    pub object_name: String,
}

impl Provenance {
    /// Reads provenance from metadata.
    ///
    /// Returns `None` unless the deployment name key is present; an object
    /// without it was not deployed by a pack.
    #[must_use]
    pub fn from_meta(meta: Option<&Metadata>) -> Option<Self> {
        let meta = meta?;
        let read = |key: ProvenanceKey| meta.get(key.as_str()).cloned().unwrap_or_default();

        meta.get(ProvenanceKey::DeploymentName.as_str())?;
        Some(Self {
            deployment_name: read(ProvenanceKey::DeploymentName),
            pack_name: read(ProvenanceKey::PackName),
            pack_path: read(ProvenanceKey::PackPath),
            pack_version: read(ProvenanceKey::PackVersion),
            registry_name: read(ProvenanceKey::PackRegistry),
            object_name: read(ProvenanceKey::PackJob),
        })
    }

    /// Reads provenance from an object.
    #[must_use]
    pub fn of<M: ManagedObject>(object: &M) -> Option<Self> {
        Self::from_meta(object.meta())
    }

    /// Returns true if this provenance names `deployment`.
    #[must_use]
    pub fn belongs_to(&self, deployment: &str) -> bool {
        self.deployment_name == deployment
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::{Job, Namespace};

    fn config() -> DeploymentConfig {
        DeploymentConfig::new("web", "nginx", "./packs/nginx", "1.2.0", "community")
            .expect("valid config")
    }

    fn reserved_pairs(meta: &Metadata) -> Vec<(String, String)> {
        meta.iter()
            .filter(|(k, _)| ProvenanceKey::is_reserved(k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    #[test]
    fn test_tag_writes_every_key() {
        let mut job = Job::new("web");
        tag(&mut job, &config());

        let meta = job.meta.expect("meta");
        assert_eq!(meta["pack-path"], "./packs/nginx");
        assert_eq!(meta["pack-name"], "nginx");
        assert_eq!(meta["pack-registry"], "community");
        assert_eq!(meta["pack-deployment-name"], "web");
        assert_eq!(meta["pack-version"], "1.2.0");
        assert_eq!(meta["pack-job"], "web");
    }

    #[test]
    fn test_tag_preserves_user_keys_and_overwrites_reserved() {
        let mut job = Job::new("api")
            .with_meta("team", "edge")
            .with_meta("pack-name", "spoofed");
        tag(&mut job, &config());

        let meta = job.meta.expect("meta");
        assert_eq!(meta["team"], "edge");
        assert_eq!(meta["pack-name"], "nginx");
        assert_eq!(meta["pack-job"], "api");
        assert_eq!(meta.len(), 7);
    }

    #[test]
    fn test_tag_is_idempotent() {
        let mut ns = Namespace::new("team-a");
        tag(&mut ns, &config());
        let once = reserved_pairs(ns.meta.as_ref().expect("meta"));

        tag(&mut ns, &config());
        tag(&mut ns, &config());
        let thrice = reserved_pairs(ns.meta.as_ref().expect("meta"));

        assert_eq!(once, thrice);
    }

    #[test]
    fn test_round_trip() {
        let mut job = Job::new("web");
        tag(&mut job, &config());

        let provenance = Provenance::of(&job).expect("tagged");
        assert_eq!(
            provenance,
            Provenance {
                deployment_name: String::from("web"),
                pack_name: String::from("nginx"),
                pack_path: String::from("./packs/nginx"),
                pack_version: String::from("1.2.0"),
                registry_name: String::from("community"),
                object_name: String::from("web"),
            }
        );
        assert!(provenance.belongs_to("web"));
        assert!(!provenance.belongs_to("blue"));
    }

    #[test]
    fn test_untagged_has_no_provenance() {
        assert!(Provenance::of(&Job::new("web")).is_none());
        assert!(Provenance::of(&Job::new("web").with_meta("pack-name", "nginx")).is_none());
    }
}
