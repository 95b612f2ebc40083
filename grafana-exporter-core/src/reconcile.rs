//! Resource kind reconciliation: fetch the canonical catalog for a
//! target/format pair and merge it with the selection held so far.
//!
//! # Merge policy
//! - A kind keeps its selection iff a kind with the same name was in the previous catalog.
//! - No name overlap at all (first load, or a wholly different backend): everything is selected.
//! - Partial overlap: kinds that are new stay unselected so the user opts them in explicitly.
//! - Identical name sets: [`Merge::Unchanged`]. No new catalog is produced, so applying
//!   the result cannot trigger another refresh.
//!
//! Merging never mutates the previous catalog; it always builds a new collection.

use std::collections::HashMap;

use tracing::{debug, error, info};

use crate::contract::{CanonicalKind, ExporterBackend, ResourceKind};
use crate::error::BackendError;
use crate::options::{OutputFormat, Target};

/// Identifies one scheduled catalog refresh.
///
/// `revision` is the configuration revision the refresh was scheduled for; a
/// result only applies while the configuration is still at that revision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogRequest {
    pub revision: u64,
    pub target: Target,
    pub format: OutputFormat,
}

/// Outcome of a catalog fetch, tagged with the request it answers.
#[derive(Debug, Clone)]
pub struct CatalogFetch {
    pub request: CatalogRequest,
    pub outcome: Result<Vec<CanonicalKind>, BackendError>,
}

/// Result of merging a fetched catalog into the previous one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Merge {
    /// Same name set as before; keep the current catalog as is.
    Unchanged,
    /// New catalog, sorted by category then name.
    Replaced(Vec<ResourceKind>),
}

/// Merges `canonical` into `previous`.
pub fn merge(previous: &[ResourceKind], canonical: Vec<CanonicalKind>) -> Merge {
    let lookup: HashMap<&str, bool> = previous
        .iter()
        .map(|kind| (kind.name.as_str(), kind.selected))
        .collect();

    let mut matched = 0usize;
    let kinds: Vec<ResourceKind> = canonical
        .into_iter()
        .map(|kind| {
            let selected = match lookup.get(kind.name.as_str()) {
                Some(&selected) => {
                    matched += 1;
                    selected
                }
                None => false,
            };
            ResourceKind {
                name: kind.name,
                category: kind.category,
                selected,
            }
        })
        .collect();

    if matched == kinds.len() && matched == previous.len() {
        debug!(kinds = matched, "Fetched catalog has the same kinds, nothing to merge");
        return Merge::Unchanged;
    }

    let mut kinds = if matched == 0 {
        debug!(kinds = kinds.len(), "No kinds in common with previous catalog, selecting all");
        kinds
            .into_iter()
            .map(|kind| ResourceKind {
                selected: true,
                ..kind
            })
            .collect()
    } else {
        debug!(
            matched,
            new = kinds.len() - matched,
            "Partial overlap with previous catalog, new kinds left unselected"
        );
        kinds
    };

    kinds.sort_by(|a, b| {
        a.category
            .cmp(&b.category)
            .then_with(|| a.name.cmp(&b.name))
    });
    Merge::Replaced(kinds)
}

/// Fetches catalogs from an [`ExporterBackend`].
pub struct ResourceKindReconciler<'a, B: ?Sized> {
    backend: &'a B,
}

impl<'a, B> ResourceKindReconciler<'a, B>
where
    B: ExporterBackend + ?Sized,
{
    pub fn new(backend: &'a B) -> Self {
        Self { backend }
    }

    /// Runs the fetch for a scheduled refresh. Never fails: the outcome travels
    /// with the request so the caller can decide whether it is still current.
    pub async fn fetch(&self, request: CatalogRequest) -> CatalogFetch {
        info!(
            revision = request.revision,
            target = %request.target,
            format = %request.format,
            "Fetching resource types"
        );
        let outcome = self
            .backend
            .resource_types(request.target, request.format)
            .await;
        match &outcome {
            Ok(kinds) => info!(kinds = kinds.len(), "Fetched resource types"),
            Err(e) => error!(error = %e, "Failed to fetch resource types"),
        }
        CatalogFetch { request, outcome }
    }

    /// Fetches the catalog for `target`/`format` and merges it with `previous`.
    pub async fn reconcile(
        &self,
        target: Target,
        format: OutputFormat,
        previous: &[ResourceKind],
    ) -> Result<Merge, BackendError> {
        let canonical = self.backend.resource_types(target, format).await?;
        Ok(merge(previous, canonical))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(names: &[(&str, &str)]) -> Vec<CanonicalKind> {
        names
            .iter()
            .map(|(name, category)| CanonicalKind::new(*name, *category))
            .collect()
    }

    #[test]
    fn first_load_selects_everything_sorted() {
        let merged = merge(
            &[],
            canonical(&[
                ("grafana_folder", "Grafana"),
                ("grafana_check", "Synthetic Monitoring"),
                ("grafana_dashboard", "Grafana"),
            ]),
        );
        let Merge::Replaced(kinds) = merged else {
            panic!("expected a new catalog");
        };
        let names: Vec<_> = kinds.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["grafana_dashboard", "grafana_folder", "grafana_check"]);
        assert!(kinds.iter().all(|k| k.selected));
    }

    #[test]
    fn sort_is_case_sensitive() {
        let Merge::Replaced(kinds) = merge(&[], canonical(&[("b", ""), ("B", ""), ("a", "")])) else {
            panic!("expected a new catalog");
        };
        let names: Vec<_> = kinds.iter().map(|k| k.name.as_str()).collect();
        assert_eq!(names, ["B", "a", "b"]);
    }

    #[test]
    fn empty_against_empty_is_unchanged() {
        assert_eq!(merge(&[], Vec::new()), Merge::Unchanged);
    }

    #[test]
    fn emptied_catalog_replaces_previous() {
        let previous = vec![ResourceKind::new("a", "", true)];
        assert_eq!(merge(&previous, Vec::new()), Merge::Replaced(Vec::new()));
    }

    #[test]
    fn subset_keeps_selection_without_reselecting() {
        let previous = vec![
            ResourceKind::new("a", "", false),
            ResourceKind::new("b", "", true),
            ResourceKind::new("c", "", false),
        ];
        let Merge::Replaced(kinds) = merge(&previous, canonical(&[("a", ""), ("b", "")])) else {
            panic!("expected a new catalog");
        };
        assert_eq!(
            kinds,
            vec![ResourceKind::new("a", "", false), ResourceKind::new("b", "", true)]
        );
    }
}
