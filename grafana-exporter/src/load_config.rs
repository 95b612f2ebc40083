/// `load_config` module: Loads the static YAML client config and injects secrets from the environment.
///
/// This is the only place where the user-supplied YAML file is parsed. It produces the
/// read-only [`ExporterSettings`] handed to the export core plus the transport settings
/// (timeout, bearer token) used by [`crate::client::PluginClient`].
///
/// # Environment
/// - `GRAFANA_EXPORTER_URL`: overrides `backend_url` from the file.
/// - `GRAFANA_EXPORTER_TOKEN`: optional bearer token; never read from the file.
///
/// # Errors
/// All errors use `anyhow::Error` with the config path as context and surface at the CLI boundary.
use anyhow::{bail, Context, Result};
use grafana_exporter_core::config::ExporterSettings;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;
use std::time::Duration;
use tracing::{error, info, warn};

pub const URL_ENV: &str = "GRAFANA_EXPORTER_URL";
pub const TOKEN_ENV: &str = "GRAFANA_EXPORTER_TOKEN";

const DEFAULT_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone)]
pub struct CliConfig {
    pub settings: ExporterSettings,
    pub timeout: Duration,
    pub token: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct RawConfig {
    backend_url: String,
    #[serde(default)]
    cloud_org: Option<String>,
    #[serde(default)]
    cloud_enabled: bool,
    #[serde(default = "default_timeout_secs")]
    timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

/// Loads a static YAML config file (no secrets) and applies environment overrides.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<CliConfig> {
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading configuration from file");

    let config_content = fs::read_to_string(path_ref)
        .inspect_err(|e| error!(error = ?e, config_path = ?path_ref, "Failed to read config file"))
        .with_context(|| format!("Failed to read config file {path_ref:?}"))?;

    let raw: RawConfig = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let backend_url = match env::var(URL_ENV) {
        Ok(url) if !url.trim().is_empty() => {
            info!(env = URL_ENV, "Backend URL overridden from environment");
            url
        }
        _ => raw.backend_url,
    };
    if backend_url.trim().is_empty() {
        bail!("backend_url must not be empty in {path_ref:?}");
    }

    if raw.cloud_enabled && raw.cloud_org.is_none() {
        warn!("cloud_enabled is set without cloud_org; the backend decides the organisation");
    }
    if raw.timeout_secs == 0 {
        bail!("timeout_secs must be greater than zero in {path_ref:?}");
    }

    let token = env::var(TOKEN_ENV).ok().filter(|t| !t.is_empty());
    info!(
        token_set = token.is_some(),
        timeout_secs = raw.timeout_secs,
        "Configuration loaded"
    );

    let settings = ExporterSettings {
        backend_url,
        cloud_org: raw.cloud_org,
        cloud_enabled: raw.cloud_enabled,
    };
    settings.trace_loaded();

    Ok(CliConfig {
        settings,
        timeout: Duration::from_secs(raw.timeout_secs),
        token,
    })
}
