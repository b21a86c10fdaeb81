//! Identity and metadata shared by every cluster object kind.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;

/// Key/value metadata attached to a cluster object.
pub type Metadata = BTreeMap<String, String>;

/// Kinds of cluster objects a pack can contain.
///
/// Variants are ordered by deployment dependency: namespaces must exist
/// before the volumes and jobs placed into them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ObjectKind {
    /// A namespace.
    Namespace,
    /// A storage volume.
    Volume,
    /// A job.
    Job,
}

impl ObjectKind {
    /// All kinds in deployment order.
    pub const ALL: [Self; 3] = [Self::Namespace, Self::Volume, Self::Job];

    /// Returns the static name of this kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Namespace => "namespace",
            Self::Volume => "volume",
            Self::Job => "job",
        }
    }

    /// Looks up a kind by its name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.as_str() == name)
    }

    /// Routes a rendered template to the kind it describes.
    ///
    /// Template names follow `<name>.<kind>[.yaml|.yml|.json][.tpl]`; a name
    /// without a recognised kind segment is treated as a job.
    #[must_use]
    pub fn from_template_name(template: &str) -> Self {
        let mut stem = template.strip_suffix(".tpl").unwrap_or(template);
        for ext in [".yaml", ".yml", ".json"] {
            if let Some(stripped) = stem.strip_suffix(ext) {
                stem = stripped;
                break;
            }
        }

        stem.rsplit_once('.')
            .and_then(|(_, kind)| Self::from_name(kind))
            .unwrap_or(Self::Job)
    }
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of an object within the cluster.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ObjectId {
    /// Object kind.
    pub kind: ObjectKind,
    /// Namespace, empty for cluster-scoped kinds.
    pub namespace: String,
    /// Object name.
    pub name: String,
}

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{} '{}'", self.kind, self.name)
        } else {
            write!(f, "{} '{}/{}'", self.kind, self.namespace, self.name)
        }
    }
}

/// A cluster object that carries a metadata map.
pub trait ManagedObject: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    /// Kind of this object.
    const KIND: ObjectKind;

    /// Object name.
    fn name(&self) -> &str;

    /// Namespace the object lives in, `None` for cluster-scoped kinds.
    fn namespace(&self) -> Option<&str>;

    /// Current metadata, if any has been set.
    fn meta(&self) -> Option<&Metadata>;

    /// Replaces the metadata map.
    fn set_meta(&mut self, meta: Metadata);

    /// Removes and returns the metadata map.
    fn take_meta(&mut self) -> Option<Metadata>;

    /// Returns this object's identity.
    fn id(&self) -> ObjectId {
        ObjectId {
            kind: Self::KIND,
            namespace: self.namespace().unwrap_or_default().to_string(),
            name: self.name().to_string(),
        }
    }
}
