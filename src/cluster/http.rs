//! HTTP cluster API client implementation.
//!
//! This module provides the client for a cluster exposing a small JSON REST
//! API (`/v1/jobs`, `/v1/volumes`, `/v1/namespaces`).

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode, header};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, trace};

use crate::error::ClusterError;

use super::api::{ClusterClient, ClusterResult};
use super::types::{DEFAULT_NAMESPACE, Job, Namespace, Volume};

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Maximum number of attempts for transient failures.
const MAX_RETRIES: u32 = 3;

/// Delay between retries in milliseconds.
const RETRY_DELAY_MS: u64 = 200;

/// Delay before retry `attempt`: the server's `Retry-After` when it sent
/// one, linear backoff otherwise.
fn retry_delay(error: &ClusterError, attempt: u32) -> Duration {
    error.retry_delay_secs().map_or_else(
        || Duration::from_millis(RETRY_DELAY_MS * u64::from(attempt)),
        Duration::from_secs,
    )
}

/// Cluster API client over HTTP.
#[derive(Debug, Clone)]
pub struct HttpClusterClient {
    /// HTTP client.
    client: Client,
    /// Base address, without trailing slash.
    address: String,
    /// Bearer token.
    token: Option<String>,
    /// Region forwarded with every request.
    region: Option<String>,
}

impl HttpClusterClient {
    /// Creates a new cluster API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn new(address: &str, token: Option<&str>) -> ClusterResult<Self> {
        Self::with_timeout(address, token, DEFAULT_TIMEOUT_SECS)
    }

    /// Creates a client with a custom timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be created.
    pub fn with_timeout(address: &str, token: Option<&str>, timeout_secs: u64) -> ClusterResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ClusterError::network(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            address: address.trim_end_matches('/').to_string(),
            token: token.map(String::from),
            region: None,
        })
    }

    /// Sets the region forwarded with every request.
    #[must_use]
    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    /// Executes a request, retrying transient failures.
    async fn execute(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<serde_json::Value>,
    ) -> ClusterResult<String> {
        let mut last_error = None;

        for attempt in 0..MAX_RETRIES {
            if let Some(e) = &last_error {
                let delay = retry_delay(e, attempt);
                debug!(
                    "Retry attempt {attempt} of {MAX_RETRIES} for {method} {path} in {}ms",
                    delay.as_millis()
                );
                tokio::time::sleep(delay).await;
            }

            match self.execute_once(method, path, query, body.as_ref()).await {
                Ok(text) => return Ok(text),
                Err(e) => {
                    if e.is_retryable() {
                        last_error = Some(e);
                        continue;
                    }
                    return Err(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| ClusterError::network("Max retries exceeded")))
    }

    /// Executes a single request.
    async fn execute_once(
        &self,
        method: &Method,
        path: &str,
        query: &[(&str, &str)],
        body: Option<&serde_json::Value>,
    ) -> ClusterResult<String> {
        trace!("{method} {}{path}", self.address);

        let mut request = self
            .client
            .request(method.clone(), format!("{}{path}", self.address))
            .header(header::ACCEPT, "application/json")
            .query(query);

        if let Some(region) = &self.region {
            request = request.query(&[("region", region.as_str())]);
        }
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ClusterError::network(format!("Request failed: {e}")))?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse().ok())
                .unwrap_or(1);

            return Err(ClusterError::RateLimited {
                retry_after_secs: retry_after,
            });
        }

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ClusterError::AuthenticationFailed {
                message: String::from("Invalid or missing cluster token"),
            });
        }

        let text = response.text().await.map_err(|e| ClusterError::InvalidResponse {
            message: format!("Failed to read response: {e}"),
        })?;

        if !status.is_success() {
            return Err(ClusterError::api_error(status.as_u16(), text));
        }

        Ok(text)
    }

    /// Executes a GET and decodes the JSON body.
    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClusterResult<T> {
        let text = self.execute(&Method::GET, path, query, None).await?;
        serde_json::from_str(&text).map_err(|e| ClusterError::InvalidResponse {
            message: format!("Failed to parse response: {e}"),
        })
    }

    /// Executes a PUT with a JSON body.
    async fn put_json<T: serde::Serialize + Sync>(&self, path: &str, object: &T) -> ClusterResult<()> {
        let body = serde_json::to_value(object).map_err(|e| ClusterError::InvalidResponse {
            message: format!("Failed to encode request: {e}"),
        })?;
        self.execute(&Method::PUT, path, &[], Some(body)).await?;
        Ok(())
    }

    /// Executes a DELETE.
    async fn delete(&self, path: &str, query: &[(&str, &str)]) -> ClusterResult<()> {
        self.execute(&Method::DELETE, path, query, None).await?;
        Ok(())
    }
}

#[async_trait]
impl ClusterClient for HttpClusterClient {
    async fn list_jobs(&self, namespace: &str) -> ClusterResult<Vec<Job>> {
        self.get_json("/v1/jobs", &[("namespace", namespace)]).await
    }

    async fn register_job(&self, job: &Job) -> ClusterResult<()> {
        let namespace = job.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        self.put_json(&format!("/v1/jobs/{namespace}/{}", job.name), job)
            .await
    }

    async fn deregister_job(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        self.delete(&format!("/v1/jobs/{namespace}/{name}"), &[("purge", "true")])
            .await
    }

    async fn list_volumes(&self, namespace: &str) -> ClusterResult<Vec<Volume>> {
        self.get_json("/v1/volumes", &[("namespace", namespace)]).await
    }

    async fn create_volume(&self, volume: &Volume) -> ClusterResult<()> {
        let namespace = volume.namespace.as_deref().unwrap_or(DEFAULT_NAMESPACE);
        self.put_json(&format!("/v1/volumes/{namespace}/{}", volume.name), volume)
            .await
    }

    async fn delete_volume(&self, namespace: &str, name: &str) -> ClusterResult<()> {
        self.delete(&format!("/v1/volumes/{namespace}/{name}"), &[])
            .await
    }

    async fn list_namespaces(&self) -> ClusterResult<Vec<Namespace>> {
        self.get_json("/v1/namespaces", &[]).await
    }

    async fn apply_namespace(&self, namespace: &Namespace) -> ClusterResult<()> {
        self.put_json(&format!("/v1/namespaces/{}", namespace.name), namespace)
            .await
    }

    async fn delete_namespace(&self, name: &str) -> ClusterResult<()> {
        self.delete(&format!("/v1/namespaces/{name}"), &[]).await
    }

    fn backend_type(&self) -> &'static str {
        "http"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cluster::ALL_NAMESPACES;
    use wiremock::matchers::{body_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_list_jobs_decodes_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/jobs"))
            .and(query_param("namespace", "*"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "name": "web", "namespace": "default", "meta": { "pack-deployment-name": "web" } }
            ])))
            .mount(&server)
            .await;

        let client = HttpClusterClient::new(&server.uri(), None).expect("client");
        let jobs = client.list_jobs(ALL_NAMESPACES).await.expect("list jobs");

        assert_eq!(jobs.len(), 1);
        assert_eq!(jobs[0].name, "web");
        assert_eq!(
            jobs[0].meta.as_ref().and_then(|m| m.get("pack-deployment-name")).map(String::as_str),
            Some("web")
        );
    }

    #[tokio::test]
    async fn test_register_job_sends_token_and_body() {
        let server = MockServer::start().await;
        let job = Job::new("web").with_namespace("apps").with_meta("team", "edge");

        Mock::given(method("PUT"))
            .and(path("/v1/jobs/apps/web"))
            .and(header("authorization", "Bearer secret"))
            .and(body_json(&job))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClusterClient::new(&server.uri(), Some("secret")).expect("client");
        client.register_job(&job).await.expect("register job");
    }

    #[tokio::test]
    async fn test_auth_failure_is_not_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/namespaces"))
            .respond_with(ResponseTemplate::new(403))
            .expect(1)
            .mount(&server)
            .await;

        let client = HttpClusterClient::new(&server.uri(), None).expect("client");
        let err = client.list_namespaces().await.expect_err("should fail");
        assert!(matches!(err, ClusterError::AuthenticationFailed { .. }));
    }

    #[tokio::test]
    async fn test_rate_limit_is_retried() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v1/volumes"))
            .respond_with(ResponseTemplate::new(429).insert_header("retry-after", "0"))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/volumes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .mount(&server)
            .await;

        let client = HttpClusterClient::new(&server.uri(), None).expect("client");
        let volumes = client.list_volumes("default").await.expect("list volumes");
        assert!(volumes.is_empty());
    }

    #[test]
    fn test_retry_delay_follows_retry_after() {
        let limited = ClusterError::RateLimited { retry_after_secs: 7 };
        assert_eq!(retry_delay(&limited, 1), Duration::from_secs(7));

        let network = ClusterError::network("reset");
        assert_eq!(retry_delay(&network, 1), Duration::from_millis(RETRY_DELAY_MS));
        assert_eq!(retry_delay(&network, 2), Duration::from_millis(2 * RETRY_DELAY_MS));
    }

    #[tokio::test]
    async fn test_server_error_maps_status() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/v1/jobs/default/web"))
            .and(query_param("purge", "true"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let client = HttpClusterClient::new(&server.uri(), None).expect("client");
        let err = client.deregister_job("default", "web").await.expect_err("should fail");
        match err {
            ClusterError::ApiRequestFailed { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
