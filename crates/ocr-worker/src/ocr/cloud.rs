//! HTTP plumbing shared by the Google Cloud backends.

use crate::core::config::CloudConfig;
use crate::error::{Result, WorkerError};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

#[derive(Debug, Clone)]
pub(crate) enum CloudAuth {
    ApiKey(String),
    Bearer(String),
}

impl CloudAuth {
    /// Access token wins over API key when both are configured.
    pub(crate) fn from_config(config: &CloudConfig) -> Option<Self> {
        config
            .access_token
            .clone()
            .map(CloudAuth::Bearer)
            .or_else(|| config.api_key.clone().map(CloudAuth::ApiKey))
    }

    fn apply(&self, request: RequestBuilder) -> RequestBuilder {
        match self {
            CloudAuth::ApiKey(key) => request.query(&[("key", key)]),
            CloudAuth::Bearer(token) => request.bearer_auth(token),
        }
    }
}

/// Authenticated JSON client for one cloud API.
#[derive(Debug, Clone)]
pub(crate) struct CloudClient {
    http: Client,
    auth: Option<CloudAuth>,
    quota_project: Option<String>,
}

impl CloudClient {
    pub(crate) fn new(config: &CloudConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| WorkerError::backend_with_source("Failed to create HTTP client", e))?;

        Ok(Self {
            http,
            auth: CloudAuth::from_config(config),
            quota_project: config.project_id.clone(),
        })
    }

    /// POST `body` as JSON and decode a JSON reply. Non-2xx replies become backend errors
    /// carrying the status and response body.
    pub(crate) async fn post_json<B, T>(&self, url: &str, body: &B) -> Result<T>
    where
        B: serde::Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.post(url).json(body);
        if let Some(auth) = &self.auth {
            request = auth.apply(request);
        }
        if let Some(project) = &self.quota_project {
            request = request.header("x-goog-user-project", project);
        }

        let response = request
            .send()
            .await
            .map_err(|e| WorkerError::backend_with_source(format!("Request to {} failed", url), e))?;

        let response = check_status(response).await?;
        let bytes = response
            .bytes()
            .await
            .map_err(|e| WorkerError::backend_with_source("Failed to read response body", e))?;

        Ok(serde_json::from_slice(&bytes)?)
    }
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(WorkerError::backend(format!(
        "Service returned status {}: {}",
        status,
        body.trim()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_prefers_access_token() {
        let config = CloudConfig {
            api_key: Some("key".to_string()),
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        assert!(matches!(CloudAuth::from_config(&config), Some(CloudAuth::Bearer(t)) if t == "token"));
    }

    #[test]
    fn test_auth_absent_without_credentials() {
        assert!(CloudAuth::from_config(&CloudConfig::default()).is_none());
    }

    #[test]
    fn test_client_builds_from_default_config() {
        assert!(CloudClient::new(&CloudConfig::default()).is_ok());
    }
}
