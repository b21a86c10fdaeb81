//! Volume templates.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::cluster::{
    ALL_NAMESPACES, AccessMode, AttachmentMode, ClusterClient, ClusterResult, DEFAULT_NAMESPACE, ObjectId, Volume,
};
use crate::error::TemplateError;

use super::deployer::ParsedTemplates;
use super::kind::{DeployKind, check_namespace, is_valid_name, parse_document};
use super::object::ObjectDeployer;

/// Deployer for volumes.
pub type VolumeDeployer = ObjectDeployer<Volume>;

#[async_trait]
impl DeployKind for Volume {
    fn parse(text: &str) -> Result<Self, TemplateError> {
        parse_document(text, "volume")
    }

    fn canonicalize(&mut self) -> Vec<TemplateError> {
        let mut errors = Vec::new();

        if !is_valid_name(&self.name) {
            errors.push(TemplateError::invalid(
                "volume.name",
                format!(
                    "'{}' must be lowercase alphanumeric with hyphens, starting with a letter",
                    self.name
                ),
            ));
        }
        if self.plugin_id.trim().is_empty() {
            errors.push(TemplateError::invalid("volume.plugin_id", "must not be empty"));
        }

        let namespace = self.namespace.get_or_insert_with(|| DEFAULT_NAMESPACE.to_string());
        errors.extend(check_namespace("volume.namespace", namespace));
        self.access_mode.get_or_insert(AccessMode::SingleNodeWriter);
        self.attachment_mode.get_or_insert(AttachmentMode::FileSystem);

        if let (Some(min), Some(max)) = (self.capacity_min_mb, self.capacity_max_mb)
            && min > max
        {
            errors.push(TemplateError::invalid(
                "volume.capacity_min_mb",
                format!("minimum capacity {min} exceeds maximum {max}"),
            ));
        }

        errors
    }

    fn view(parsed: &BTreeMap<String, Self>) -> ParsedTemplates<'_> {
        ParsedTemplates::Volumes(parsed)
    }

    async fn list(client: &dyn ClusterClient) -> ClusterResult<Vec<Self>> {
        client.list_volumes(ALL_NAMESPACES).await
    }

    async fn submit(&self, client: &dyn ClusterClient) -> ClusterResult<()> {
        client.create_volume(self).await
    }

    async fn remove(client: &dyn ClusterClient, id: &ObjectId) -> ClusterResult<()> {
        client.delete_volume(&id.namespace, &id.name).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let mut volume = Volume::parse("volume:\n  name: data\n  plugin_id: hostpath\n")
            .expect("parse");
        assert!(volume.canonicalize().is_empty());
        assert_eq!(volume.namespace.as_deref(), Some("default"));
        assert_eq!(volume.access_mode, Some(AccessMode::SingleNodeWriter));
        assert_eq!(volume.attachment_mode, Some(AttachmentMode::FileSystem));
    }

    #[test]
    fn test_access_mode_parsed_kebab_case() {
        let volume = Volume::parse(
            "volume:\n  name: data\n  plugin_id: nfs\n  access_mode: multi-node-reader\n",
        )
        .expect("parse");
        assert_eq!(volume.access_mode, Some(AccessMode::MultiNodeReader));
    }

    #[test]
    fn test_invalid_volume() {
        let mut volume = Volume::new("Data", "");
        volume.capacity_min_mb = Some(2048);
        volume.capacity_max_mb = Some(1024);

        assert_eq!(volume.canonicalize().len(), 3);
    }

    #[test]
    fn test_namespace_with_slash_is_rejected() {
        let mut volume = Volume::new("data", "hostpath");
        volume.namespace = Some(String::from("a/b"));
        let errors = volume.canonicalize();

        assert_eq!(errors.len(), 1);
        assert!(errors[0].to_string().contains("a/b"));
    }
}
