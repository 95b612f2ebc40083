#![doc = "HTTP transport for the exporter plugin backend: implements the core `ExporterBackend` trait with reqwest."]
//
//! # Plugin client (CLI <-> Core)
//!
//! [`PluginClient`] talks to the plugin's resource API under the configured base URL:
//!
//! - `GET {base}/resource-types?target=..&outputFormat=..`
//! - `POST {base}/generate`
//!
//! Timeouts and the optional bearer token are applied here; the core only sees
//! [`BackendError`]s. Non-2xx responses are reduced to a message with
//! [`BackendError::from_status_body`].

use async_trait::async_trait;
use grafana_exporter_core::contract::{
    CanonicalKind, ExporterBackend, GenerateRequest, GenerateResponse, ResourceTypesResponse,
};
use grafana_exporter_core::error::BackendError;
use grafana_exporter_core::options::{OutputFormat, Target};
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::time::Duration;

use crate::load_config::CliConfig;

pub struct PluginClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl PluginClient {
    pub fn new(
        base_url: impl Into<String>,
        timeout: Duration,
        token: Option<String>,
    ) -> Result<Self, reqwest::Error> {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        let http = Client::builder().timeout(timeout).build()?;
        tracing::info!(
            base_url = %base_url,
            timeout_secs = timeout.as_secs(),
            token_set = token.is_some(),
            "Initialized plugin client"
        );
        Ok(Self {
            http,
            base_url,
            token,
        })
    }

    pub fn from_config(config: &CliConfig) -> Result<Self, reqwest::Error> {
        Self::new(
            config.settings.backend_url.clone(),
            config.timeout,
            config.token.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    fn authorised(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    async fn send(&self, endpoint: &str, builder: RequestBuilder) -> Result<Response, BackendError> {
        self.authorised(builder).send().await.map_err(|e| {
            tracing::error!(error = %e, endpoint, "Request to plugin backend failed");
            BackendError::Transport {
                endpoint: endpoint.to_string(),
                message: e.to_string(),
            }
        })
    }
}

/// Reads the body and decodes it as `T`, or turns a non-2xx status into an error.
async fn decode<T: DeserializeOwned>(endpoint: &str, response: Response) -> Result<T, BackendError> {
    let status = response.status();
    let body = response.text().await.map_err(|e| BackendError::Transport {
        endpoint: endpoint.to_string(),
        message: e.to_string(),
    })?;
    if !status.is_success() {
        tracing::error!(endpoint, status = status.as_u16(), "Plugin backend returned an error");
        return Err(BackendError::from_status_body(endpoint, status.as_u16(), &body));
    }
    serde_json::from_str(&body).map_err(|e| {
        tracing::error!(error = %e, endpoint, "Malformed response from plugin backend");
        BackendError::Decode {
            endpoint: endpoint.to_string(),
            message: e.to_string(),
        }
    })
}

#[async_trait]
impl ExporterBackend for PluginClient {
    async fn resource_types(
        &self,
        target: Target,
        format: OutputFormat,
    ) -> Result<Vec<CanonicalKind>, BackendError> {
        let endpoint = self.endpoint("resource-types");
        tracing::debug!(endpoint = %endpoint, %target, %format, "GET resource types");
        let builder = self
            .http
            .get(&endpoint)
            .query(&[("target", target.as_str()), ("outputFormat", format.as_str())]);
        let response = self.send(&endpoint, builder).await?;
        let body: ResourceTypesResponse = decode(&endpoint, response).await?;
        Ok(body.resources)
    }

    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError> {
        let endpoint = self.endpoint("generate");
        tracing::debug!(
            endpoint = %endpoint,
            kinds = request.only_resources.len(),
            "POST generate"
        );
        let builder = self.http.post(&endpoint).json(request);
        let response = self.send(&endpoint, builder).await?;
        decode(&endpoint, response).await
    }
}
