use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Host-provided exporter settings. Read-only for the export core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExporterSettings {
    /// Base URL of the plugin's resource API, e.g.
    /// `http://localhost:3000/api/plugins/grafana-exporter-app/resources`.
    pub backend_url: String,
    /// Grafana Cloud organisation used when exporting the cloud target.
    #[serde(default)]
    pub cloud_org: Option<String>,
    /// Whether the cloud target may be selected at all.
    #[serde(default)]
    pub cloud_enabled: bool,
}

impl ExporterSettings {
    pub fn new(backend_url: impl Into<String>) -> Self {
        Self {
            backend_url: backend_url.into(),
            cloud_org: None,
            cloud_enabled: false,
        }
    }

    /// Enables the cloud target for the given organisation.
    pub fn with_cloud(mut self, org: impl Into<String>) -> Self {
        self.cloud_org = Some(org.into());
        self.cloud_enabled = true;
        self
    }

    pub fn trace_loaded(&self) {
        info!(
            backend_url = %self.backend_url,
            cloud_enabled = self.cloud_enabled,
            cloud_org = self.cloud_org.as_deref().unwrap_or("-"),
            "Loaded exporter settings"
        );
        debug!(?self, "Exporter settings loaded (full debug)");
    }
}
