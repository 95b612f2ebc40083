//! Error types for export configuration, backend calls and archive bundling.
//!
//! None of these are fatal to the host: each is scoped to a single export
//! session and is either recovered locally (validation, configuration) or
//! surfaced as a banner or failed page state (fetch, generate).

use thiserror::Error;

use crate::options::{OutputFormat, Target};

/// A target or output format string that is not one of the known values.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown {axis}: {value}")]
pub struct UnknownOptionError {
    pub axis: &'static str,
    pub value: String,
}

/// Rejected configuration changes. The state is left untouched.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("output format {format} is not available for target {target}")]
    IllegalFormat { format: OutputFormat, target: Target },

    #[error("cloud export is not enabled in the exporter settings")]
    CloudDisabled,
}

/// Generation was requested from a configuration that cannot produce a request.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("At least one resource type must be selected")]
    NoKindSelected,

    #[error("No resource types are available for this target and output format")]
    EmptyCatalog,
}

/// Failure talking to the exporter backend.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BackendError {
    /// Connection, timeout or other transport level failure.
    #[error("request to {endpoint} failed: {message}")]
    Transport { endpoint: String, message: String },

    /// The backend answered with a non-success status.
    #[error("{endpoint} returned HTTP {status}: {message}")]
    Status {
        endpoint: String,
        status: u16,
        message: String,
    },

    /// The body could not be decoded into the expected payload.
    #[error("malformed response from {endpoint}: {message}")]
    Decode { endpoint: String, message: String },
}

impl BackendError {
    /// Builds a [`BackendError::Status`] from an error response body.
    ///
    /// The plugin answers errors with a plain-text body; Grafana's own proxy
    /// answers with `{"message": ...}` (sometimes `{"error": ...}`). Both are
    /// reduced to a human readable message.
    pub fn from_status_body(endpoint: impl Into<String>, status: u16, body: &str) -> Self {
        let trimmed = body.trim();
        let message = serde_json::from_str::<serde_json::Value>(trimmed)
            .ok()
            .and_then(|value| {
                ["message", "error"]
                    .iter()
                    .find_map(|key| value.get(key).and_then(|m| m.as_str()).map(str::to_string))
            })
            .unwrap_or_else(|| trimmed.to_string());
        let message = if message.is_empty() {
            "no error message".to_string()
        } else {
            message
        };
        BackendError::Status {
            endpoint: endpoint.into(),
            status,
            message,
        }
    }
}

/// A catalog refresh failed. Transient: the last good catalog is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("failed to fetch resource types for {target}/{format}: {source}")]
pub struct FetchError {
    pub target: Target,
    pub format: OutputFormat,
    #[source]
    pub source: BackendError,
}

/// The generate call failed; the page shows this in place of the results.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("generation failed: {source}")]
pub struct GenerateError {
    #[from]
    pub source: BackendError,
}

/// Failure while serialising or saving the archive.
#[derive(Debug, Error)]
pub enum BundleError {
    #[error("archive error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors from the export page state machine.
#[derive(Debug, Error)]
pub enum SessionError {
    /// A generation call is in flight; the change was dropped.
    #[error("a generation request is in flight, wait for it to settle")]
    Busy,

    /// Download requested while no generated result is available.
    #[error("no generated files are ready for download")]
    NotReady,

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Bundle(#[from] BundleError),
}
