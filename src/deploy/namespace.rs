//! Namespace templates.

use async_trait::async_trait;
use std::collections::BTreeMap;

use crate::cluster::{ClusterClient, ClusterResult, Namespace, ObjectId};
use crate::error::TemplateError;

use super::deployer::ParsedTemplates;
use super::kind::{DeployKind, is_valid_name, parse_document};
use super::object::ObjectDeployer;

/// Deployer for namespaces.
pub type NamespaceDeployer = ObjectDeployer<Namespace>;

#[async_trait]
impl DeployKind for Namespace {
    fn parse(text: &str) -> Result<Self, TemplateError> {
        parse_document(text, "namespace")
    }

    fn canonicalize(&mut self) -> Vec<TemplateError> {
        if is_valid_name(&self.name) {
            return vec![];
        }

        vec![TemplateError::invalid(
            "namespace.name",
            format!(
                "'{}' must be lowercase alphanumeric with hyphens, starting with a letter",
                self.name
            ),
        )]
    }

    fn view(parsed: &BTreeMap<String, Self>) -> ParsedTemplates<'_> {
        ParsedTemplates::Namespaces(parsed)
    }

    async fn list(client: &dyn ClusterClient) -> ClusterResult<Vec<Self>> {
        client.list_namespaces().await
    }

    async fn submit(&self, client: &dyn ClusterClient) -> ClusterResult<()> {
        client.apply_namespace(self).await
    }

    async fn remove(client: &dyn ClusterClient, id: &ObjectId) -> ClusterResult<()> {
        client.delete_namespace(&id.name).await
    }
}
