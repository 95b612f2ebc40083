//! The export page: configuration, catalog refreshes and generation wired
//! together as one state machine.
//!
//! ```text
//! Idle ──generate──▶ Generating ──ok──▶ Ready
//!  ▲                     │
//!  │                     └──err──▶ Failed
//!  └──── any configuration change from Ready or Failed
//! ```
//!
//! While a generation call is in flight every configuration change is
//! dropped with [`SessionError::Busy`], so the request can never race a
//! configuration it was not built from. Only `Ready` allows downloading.

use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use crate::bundle::ArtifactBundler;
use crate::config::ExporterSettings;
use crate::contract::{ExporterBackend, GenerateRequest, GenerateResponse};
use crate::error::{BackendError, GenerateError, SessionError};
use crate::options::{OutputFormat, Target};
use crate::reconcile::{CatalogFetch, CatalogRequest, ResourceKindReconciler};
use crate::state::{CatalogUpdate, ConfigurationState};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageState {
    Idle,
    Generating,
    Ready,
    Failed(GenerateError),
}

/// Dismissible, non-fatal banner. Each kind has its own slot, so raising one
/// never hides the other.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    /// A catalog refresh failed; the previous catalog is still shown.
    CatalogFetchFailed(String),
    /// Generation succeeded but some resources could not be exported.
    PartialSuccess(Vec<String>),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NoticeKind {
    CatalogFetch,
    PartialSuccess,
}

impl Notice {
    pub fn kind(&self) -> NoticeKind {
        match self {
            Notice::CatalogFetchFailed(_) => NoticeKind::CatalogFetch,
            Notice::PartialSuccess(_) => NoticeKind::PartialSuccess,
        }
    }
}

/// Handed out by [`ExportSession::begin_generate`]; settles the call it started.
#[derive(Debug, Clone)]
pub struct GenerateTicket {
    id: u64,
    request: GenerateRequest,
}

impl GenerateTicket {
    pub fn request(&self) -> &GenerateRequest {
        &self.request
    }
}

#[derive(Debug)]
pub struct ExportSession {
    config: ConfigurationState,
    bundler: ArtifactBundler,
    page: PageState,
    fetch_notice: Option<Notice>,
    warnings_notice: Option<Notice>,
    generations: u64,
}

impl ExportSession {
    pub fn new(settings: ExporterSettings) -> Self {
        Self {
            config: ConfigurationState::new(settings),
            bundler: ArtifactBundler::new(),
            page: PageState::Idle,
            fetch_notice: None,
            warnings_notice: None,
            generations: 0,
        }
    }

    pub fn config(&self) -> &ConfigurationState {
        &self.config
    }

    pub fn bundler(&self) -> &ArtifactBundler {
        &self.bundler
    }

    /// Viewer access (tab selection). Only meaningful in `Ready`.
    pub fn bundler_mut(&mut self) -> &mut ArtifactBundler {
        &mut self.bundler
    }

    pub fn page(&self) -> &PageState {
        &self.page
    }

    pub fn is_generating(&self) -> bool {
        self.page == PageState::Generating
    }

    /// The banner of the given kind, if raised.
    pub fn notice(&self, kind: NoticeKind) -> Option<&Notice> {
        match kind {
            NoticeKind::CatalogFetch => self.fetch_notice.as_ref(),
            NoticeKind::PartialSuccess => self.warnings_notice.as_ref(),
        }
    }

    /// Every raised banner, catalog failures first.
    pub fn notices(&self) -> Vec<&Notice> {
        self.fetch_notice
            .iter()
            .chain(self.warnings_notice.iter())
            .collect()
    }

    pub fn dismiss_notice(&mut self, kind: NoticeKind) {
        match kind {
            NoticeKind::CatalogFetch => self.fetch_notice = None,
            NoticeKind::PartialSuccess => {
                self.warnings_notice = None;
                self.bundler.dismiss_warnings();
            }
        }
    }

    fn ensure_mutable(&self) -> Result<(), SessionError> {
        if self.is_generating() {
            warn!("Configuration change dropped while generating");
            return Err(SessionError::Busy);
        }
        Ok(())
    }

    fn configuration_changed(&mut self) {
        if matches!(self.page, PageState::Ready | PageState::Failed(_)) {
            info!("Configuration changed, discarding previous result");
            self.page = PageState::Idle;
            self.bundler.clear();
            self.warnings_notice = None;
        }
    }

    pub fn set_target(&mut self, target: Target) -> Result<CatalogRequest, SessionError> {
        self.ensure_mutable()?;
        let request = self.config.set_target(target)?;
        self.configuration_changed();
        Ok(request)
    }

    pub fn set_format(&mut self, format: OutputFormat) -> Result<CatalogRequest, SessionError> {
        self.ensure_mutable()?;
        let request = self.config.set_format(format)?;
        self.configuration_changed();
        Ok(request)
    }

    pub fn toggle_kind(&mut self, name: &str) -> Result<bool, SessionError> {
        self.ensure_mutable()?;
        let toggled = self.config.toggle_kind(name);
        if toggled {
            self.configuration_changed();
        }
        Ok(toggled)
    }

    pub fn set_kind(&mut self, name: &str, selected: bool) -> Result<bool, SessionError> {
        self.ensure_mutable()?;
        let found = self.config.set_kind(name, selected);
        if found {
            self.configuration_changed();
        }
        Ok(found)
    }

    pub fn set_all(&mut self, selected: bool, category: Option<&str>) -> Result<usize, SessionError> {
        self.ensure_mutable()?;
        let covered = self.config.set_all(selected, category);
        if covered > 0 {
            self.configuration_changed();
        }
        Ok(covered)
    }

    /// Runs the pending catalog refresh, if any, and applies its result.
    pub async fn refresh_catalog<B>(&mut self, backend: &B) -> Option<CatalogUpdate>
    where
        B: ExporterBackend + ?Sized,
    {
        let request = self.config.take_pending_refresh()?;
        let fetch = ResourceKindReconciler::new(backend).fetch(request).await;
        Some(self.apply_catalog(fetch))
    }

    /// Applies a catalog fetch. Failures raise a banner; the catalog is kept.
    pub fn apply_catalog(&mut self, fetch: CatalogFetch) -> CatalogUpdate {
        let update = self.config.apply_catalog(fetch);
        match &update {
            CatalogUpdate::Failed(e) => {
                error!(error = %e, "Catalog refresh failed");
                self.fetch_notice = Some(Notice::CatalogFetchFailed(e.to_string()));
            }
            CatalogUpdate::Applied { .. } | CatalogUpdate::Unchanged => {
                self.fetch_notice = None;
            }
            CatalogUpdate::Stale => {}
        }
        update
    }

    /// Validates the configuration and enters `Generating`.
    ///
    /// Nothing changes when validation fails; no request must be sent then.
    pub fn begin_generate(&mut self) -> Result<GenerateTicket, SessionError> {
        if self.is_generating() {
            warn!("Generate requested while another generation is in flight");
            return Err(SessionError::Busy);
        }
        let request = self.config.to_request()?;
        self.generations += 1;
        self.page = PageState::Generating;
        self.bundler.clear();
        self.warnings_notice = None;
        info!(
            generation = self.generations,
            target = %request.target,
            format = %request.output_format,
            kinds = request.only_resources.len(),
            "Generation started"
        );
        Ok(GenerateTicket {
            id: self.generations,
            request,
        })
    }

    /// Settles the generation started by `ticket`.
    pub fn finish_generate(
        &mut self,
        ticket: GenerateTicket,
        outcome: Result<GenerateResponse, BackendError>,
    ) -> &PageState {
        if ticket.id != self.generations || !self.is_generating() {
            warn!(ticket = ticket.id, current = self.generations, "Ignoring result of superseded generation");
            return &self.page;
        }
        match outcome {
            Ok(response) => {
                self.bundler.on_response(response);
                let warnings = self.bundler.warnings();
                if !warnings.is_empty() {
                    self.warnings_notice = Some(Notice::PartialSuccess(warnings.to_vec()));
                }
                info!(files = self.bundler.files().len(), "Generation ready");
                self.page = PageState::Ready;
            }
            Err(source) => {
                error!(error = %source, "Generation failed");
                self.page = PageState::Failed(GenerateError { source });
            }
        }
        &self.page
    }

    /// Validates, calls the backend and settles in one go.
    pub async fn generate<B>(&mut self, backend: &B) -> Result<&PageState, SessionError>
    where
        B: ExporterBackend + ?Sized,
    {
        let ticket = self.begin_generate()?;
        let outcome = backend.generate(ticket.request()).await;
        Ok(self.finish_generate(ticket, outcome))
    }

    fn ensure_ready(&self) -> Result<(), SessionError> {
        if self.page == PageState::Ready {
            Ok(())
        } else {
            Err(SessionError::NotReady)
        }
    }

    /// Saves the archive into `dir` under its fixed name.
    pub fn download(&self, dir: &Path) -> Result<PathBuf, SessionError> {
        self.ensure_ready()?;
        self.bundler.download(dir)?.ok_or(SessionError::NotReady)
    }

    /// Saves the archive to an explicit path.
    pub fn download_to(&self, path: &Path) -> Result<PathBuf, SessionError> {
        self.ensure_ready()?;
        self.bundler.download_to(path)?.ok_or(SessionError::NotReady)
    }

    /// Archive bytes for hosts that deliver the download themselves.
    pub fn archive(&self) -> Result<Vec<u8>, SessionError> {
        self.ensure_ready()?;
        self.bundler.build_archive()?.ok_or(SessionError::NotReady)
    }
}
