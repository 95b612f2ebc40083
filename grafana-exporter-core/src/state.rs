//! Export configuration state: target, output format and the resource kind
//! selection, kept mutually consistent.
//!
//! Every change of target or format bumps a revision counter and schedules
//! exactly one catalog refresh for the resulting pair. Only the latest
//! scheduled refresh is kept; results for an older revision are discarded
//! when they arrive ([`CatalogUpdate::Stale`]).

use tracing::{debug, info, warn};

use crate::config::ExporterSettings;
use crate::contract::{GenerateRequest, ResourceKind};
use crate::error::{ConfigError, FetchError, ValidationError};
use crate::options::{OutputFormat, Target};
use crate::reconcile::{self, CatalogFetch, CatalogRequest, Merge};

/// What applying a catalog fetch did to the state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogUpdate {
    /// The catalog was replaced by the merged result.
    Applied { kinds: usize },
    /// The fetched catalog has the same kinds; nothing changed.
    Unchanged,
    /// The fetch answers a superseded target/format; ignored.
    Stale,
    /// The fetch failed; the last good catalog is kept.
    Failed(FetchError),
}

/// Selection summary for one category, in display order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CategorySummary {
    pub category: String,
    pub selected: usize,
    pub total: usize,
}

#[derive(Debug, Clone)]
pub struct ConfigurationState {
    settings: ExporterSettings,
    target: Target,
    format: OutputFormat,
    catalog: Vec<ResourceKind>,
    revision: u64,
    pending: Option<CatalogRequest>,
}

impl ConfigurationState {
    /// Fresh state with the default target and format. The initial catalog
    /// load is scheduled right away.
    pub fn new(settings: ExporterSettings) -> Self {
        let mut state = Self {
            settings,
            target: Target::default(),
            format: OutputFormat::default(),
            catalog: Vec::new(),
            revision: 0,
            pending: None,
        };
        state.schedule_refresh();
        state
    }

    pub fn settings(&self) -> &ExporterSettings {
        &self.settings
    }

    pub fn target(&self) -> Target {
        self.target
    }

    pub fn format(&self) -> OutputFormat {
        self.format
    }

    pub fn catalog(&self) -> &[ResourceKind] {
        &self.catalog
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    /// Formats that may be chosen for the current target.
    pub fn format_options(&self) -> Vec<OutputFormat> {
        OutputFormat::options_for(self.target)
    }

    /// Switches the target, resetting the format when it is not available there.
    pub fn set_target(&mut self, target: Target) -> Result<CatalogRequest, ConfigError> {
        if target == Target::Cloud && !self.settings.cloud_enabled {
            warn!("Cloud target requested but cloud export is disabled");
            return Err(ConfigError::CloudDisabled);
        }
        let format = self.format.coerce_for(target);
        if format != self.format {
            info!(from = %self.format, to = %format, %target, "Output format not available for target, reset to default");
        }
        self.target = target;
        self.format = format;
        Ok(self.schedule_refresh())
    }

    /// Switches the output format. Formats illegal for the current target are rejected.
    pub fn set_format(&mut self, format: OutputFormat) -> Result<CatalogRequest, ConfigError> {
        if !format.is_legal_for(self.target) {
            warn!(%format, target = %self.target, "Rejected output format for target");
            return Err(ConfigError::IllegalFormat {
                format,
                target: self.target,
            });
        }
        self.format = format;
        Ok(self.schedule_refresh())
    }

    fn schedule_refresh(&mut self) -> CatalogRequest {
        self.revision += 1;
        let request = CatalogRequest {
            revision: self.revision,
            target: self.target,
            format: self.format,
        };
        if let Some(superseded) = self.pending.replace(request.clone()) {
            debug!(superseded = superseded.revision, revision = request.revision, "Coalesced pending catalog refresh");
        }
        info!(revision = request.revision, target = %request.target, format = %request.format, "Scheduled catalog refresh");
        request
    }

    /// The latest scheduled refresh that has not been handed out yet.
    pub fn pending_refresh(&self) -> Option<&CatalogRequest> {
        self.pending.as_ref()
    }

    pub fn take_pending_refresh(&mut self) -> Option<CatalogRequest> {
        self.pending.take()
    }

    /// Whether a result for `request` would still apply.
    pub fn is_current(&self, request: &CatalogRequest) -> bool {
        request.revision == self.revision
            && request.target == self.target
            && request.format == self.format
    }

    /// Applies a fetch outcome if it still answers the current target/format.
    pub fn apply_catalog(&mut self, fetch: CatalogFetch) -> CatalogUpdate {
        if !self.is_current(&fetch.request) {
            warn!(
                fetched = fetch.request.revision,
                current = self.revision,
                "Discarding catalog for superseded configuration"
            );
            return CatalogUpdate::Stale;
        }
        match fetch.outcome {
            Err(source) => CatalogUpdate::Failed(FetchError {
                target: fetch.request.target,
                format: fetch.request.format,
                source,
            }),
            Ok(canonical) => match reconcile::merge(&self.catalog, canonical) {
                Merge::Unchanged => CatalogUpdate::Unchanged,
                Merge::Replaced(kinds) => {
                    let count = kinds.len();
                    self.catalog = kinds;
                    info!(kinds = count, selected = self.selected_count(), "Catalog updated");
                    CatalogUpdate::Applied { kinds: count }
                }
            },
        }
    }

    /// Flips the selection of `name`. Unknown names are ignored (returns `false`).
    pub fn toggle_kind(&mut self, name: &str) -> bool {
        let Some(current) = self.catalog.iter().find(|k| k.name == name) else {
            debug!(kind = name, "Ignoring toggle for kind not in catalog");
            return false;
        };
        let selected = !current.selected;
        self.replace_selection(|kind| kind.name == name, selected);
        true
    }

    /// Sets the selection of `name`. Unknown names are ignored (returns `false`).
    pub fn set_kind(&mut self, name: &str, selected: bool) -> bool {
        if !self.catalog.iter().any(|k| k.name == name) {
            debug!(kind = name, "Ignoring selection for kind not in catalog");
            return false;
        }
        self.replace_selection(|kind| kind.name == name, selected);
        true
    }

    /// Selects or deselects every kind, or every kind of `category`.
    /// Returns how many kinds the change covered.
    pub fn set_all(&mut self, selected: bool, category: Option<&str>) -> usize {
        let covered = self.replace_selection(
            |kind| category.map_or(true, |c| kind.category == c),
            selected,
        );
        debug!(selected, category = category.unwrap_or("*"), covered, "Bulk selection");
        covered
    }

    fn replace_selection<F>(&mut self, matches: F, selected: bool) -> usize
    where
        F: Fn(&ResourceKind) -> bool,
    {
        let mut covered = 0;
        self.catalog = self
            .catalog
            .iter()
            .map(|kind| {
                if matches(kind) {
                    covered += 1;
                    kind.with_selected(selected)
                } else {
                    kind.clone()
                }
            })
            .collect();
        covered
    }

    pub fn selected_kinds(&self) -> impl Iterator<Item = &ResourceKind> {
        self.catalog.iter().filter(|k| k.selected)
    }

    pub fn selected_count(&self) -> usize {
        self.selected_kinds().count()
    }

    pub fn can_generate(&self) -> bool {
        self.catalog.iter().any(|k| k.selected)
    }

    /// Message explaining why generation is disabled, when the user can fix it.
    pub fn disabled_reason(&self) -> Option<&'static str> {
        if !self.catalog.is_empty() && !self.can_generate() {
            Some("At least one resource type must be selected")
        } else {
            None
        }
    }

    /// Categories in display order with their selection counts.
    pub fn categories(&self) -> Vec<CategorySummary> {
        let mut summaries: Vec<CategorySummary> = Vec::new();
        for kind in &self.catalog {
            match summaries.iter_mut().find(|s| s.category == kind.category) {
                Some(summary) => {
                    summary.total += 1;
                    summary.selected += usize::from(kind.selected);
                }
                None => summaries.push(CategorySummary {
                    category: kind.category.clone(),
                    selected: usize::from(kind.selected),
                    total: 1,
                }),
            }
        }
        summaries.sort_by(|a, b| a.category.cmp(&b.category));
        summaries
    }

    /// Projects the state to a generate request.
    pub fn to_request(&self) -> Result<GenerateRequest, ValidationError> {
        if self.catalog.is_empty() {
            return Err(ValidationError::EmptyCatalog);
        }
        if !self.can_generate() {
            return Err(ValidationError::NoKindSelected);
        }
        Ok(GenerateRequest {
            target: self.target,
            output_format: self.format,
            only_resources: self.selected_kinds().map(ResourceKind::wildcard).collect(),
        })
    }
}
