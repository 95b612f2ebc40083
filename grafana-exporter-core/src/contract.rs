//! # contract: wire types and the exporter backend seam
//!
//! This module defines the payloads exchanged with the exporter plugin backend
//! and a single trait ([`ExporterBackend`]) standing in for the HTTP transport.
//!
//! ## Interface
//! - `GET resource-types?target=..&outputFormat=..` answers `{ resources: [{name, category}] }`.
//! - `POST generate` takes a [`GenerateRequest`] and answers a [`GenerateResponse`].
//!
//! The trait is agnostic of URLs, authentication and timeouts; the CLI crate
//! provides the `reqwest` implementation.
//!
//! ## Mocking & Testing
//! - The trait is annotated for `mockall` so consumers can generate deterministic
//!   mocks (`MockExporterBackend`) for unit and integration tests.

use async_trait::async_trait;
#[cfg(any(test, feature = "test-export-mocks"))]
use mockall::automock;
use serde::{Deserialize, Serialize};

use crate::error::BackendError;
use crate::options::{OutputFormat, Target};

/// A resource kind as the backend lists it. Selection is owned by the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanonicalKind {
    pub name: String,
    /// Grizzly kinds come without a category.
    #[serde(default)]
    pub category: String,
}

impl CanonicalKind {
    pub fn new(name: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
        }
    }
}

/// Body of the `resource-types` response.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceTypesResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub resources: Vec<CanonicalKind>,
}

/// A resource kind in the local catalog, with its selection state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceKind {
    pub name: String,
    pub category: String,
    pub selected: bool,
}

impl ResourceKind {
    pub fn new(name: impl Into<String>, category: impl Into<String>, selected: bool) -> Self {
        Self {
            name: name.into(),
            category: category.into(),
            selected,
        }
    }

    /// Copy of this kind with a different selection.
    pub fn with_selected(&self, selected: bool) -> Self {
        Self {
            selected,
            ..self.clone()
        }
    }

    /// Pattern matching every instance of this kind, as the backend expects it.
    pub fn wildcard(&self) -> String {
        format!("{}.*", self.name)
    }
}

/// Body of the `generate` call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateRequest {
    pub target: Target,
    pub output_format: OutputFormat,
    /// Selected kind names, each suffixed with `.*`.
    pub only_resources: Vec<String>,
}

/// One generated artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedFile {
    pub name: String,
    pub content: String,
}

impl GeneratedFile {
    pub fn new(name: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            content: content.into(),
        }
    }
}

/// Body of a successful `generate` response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenerateResponse {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub files: Vec<GeneratedFile>,
    /// Non-critical errors: resources that could not be exported.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub warnings: Option<Vec<String>>,
}

/// The backend encodes empty lists as `null`.
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

/// Transport to the exporter plugin backend.
///
/// Implemented by the HTTP client in the CLI crate and by test mocks.
/// Timeouts are the implementor's concern and surface as [`BackendError::Transport`].
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait ExporterBackend: Send + Sync {
    /// List the canonical resource kinds for a target/format pair.
    async fn resource_types(
        &self,
        target: Target,
        format: OutputFormat,
    ) -> Result<Vec<CanonicalKind>, BackendError>;

    /// Generate artifacts for the given request.
    async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse, BackendError>;
}
