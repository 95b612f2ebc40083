#![doc = "grafana-exporter-core: export configuration, resource kind reconciliation and artifact bundling."]

//! This crate holds all client-side export logic of grafana-exporter: the
//! configuration state machine, the catalog merge, the generated file viewer
//! model and the ZIP bundling. Transport is abstracted behind
//! [`contract::ExporterBackend`]; the CLI crate provides the HTTP client.
//!
//! # Usage
//! Drive an [`session::ExportSession`]: change target/format, run
//! [`session::ExportSession::refresh_catalog`] after each change, adjust the
//! selection, then [`session::ExportSession::generate`] and download.

pub mod bundle;
pub mod config;
pub mod contract;
pub mod error;
pub mod options;
pub mod reconcile;
pub mod session;
pub mod state;

pub use bundle::{language_for, ArtifactBundler, Language, ARCHIVE_FILE_NAME};
pub use config::ExporterSettings;
pub use contract::{
    CanonicalKind, ExporterBackend, GenerateRequest, GenerateResponse, GeneratedFile, ResourceKind,
};
pub use error::{
    BackendError, BundleError, ConfigError, FetchError, GenerateError, SessionError,
    ValidationError,
};
pub use options::{OutputFormat, Target};
pub use reconcile::{merge, CatalogFetch, CatalogRequest, Merge, ResourceKindReconciler};
pub use session::{ExportSession, Notice, NoticeKind, PageState};
pub use state::{CatalogUpdate, ConfigurationState};
