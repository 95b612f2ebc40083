//! The two enumerated export axes: where resources are read from ([`Target`])
//! and which declarative syntax is generated ([`OutputFormat`]).
//!
//! Format legality is a function of the target: Grizzly formats are only
//! available when exporting from the local Grafana instance.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::UnknownOptionError;

/// Which backend deployment resources are read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Target {
    /// The Grafana instance the exporter is installed in.
    #[default]
    #[serde(rename = "grafana", alias = "local-instance")]
    LocalInstance,
    /// Grafana Cloud, scoped to the configured organisation.
    #[serde(rename = "cloud")]
    Cloud,
}

impl Target {
    pub const ALL: [Target; 2] = [Target::LocalInstance, Target::Cloud];

    /// Value sent to the backend in the `target` query parameter and request body.
    pub fn as_str(&self) -> &'static str {
        match self {
            Target::LocalInstance => "grafana",
            Target::Cloud => "cloud",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Target::LocalInstance => "This Grafana instance",
            Target::Cloud => "Grafana Cloud",
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Target {
    type Err = UnknownOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "grafana" | "local-instance" => Ok(Target::LocalInstance),
            "cloud" => Ok(Target::Cloud),
            other => Err(UnknownOptionError {
                axis: "target",
                value: other.to_string(),
            }),
        }
    }
}

/// The declarative syntax generated by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutputFormat {
    #[default]
    TerraformHcl,
    TerraformJson,
    Crossplane,
    GrizzlyJson,
    GrizzlyYaml,
}

impl OutputFormat {
    /// Every format, in display order.
    pub const ALL: [OutputFormat; 5] = [
        OutputFormat::TerraformHcl,
        OutputFormat::TerraformJson,
        OutputFormat::Crossplane,
        OutputFormat::GrizzlyJson,
        OutputFormat::GrizzlyYaml,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            OutputFormat::TerraformHcl => "terraform-hcl",
            OutputFormat::TerraformJson => "terraform-json",
            OutputFormat::Crossplane => "crossplane",
            OutputFormat::GrizzlyJson => "grizzly-json",
            OutputFormat::GrizzlyYaml => "grizzly-yaml",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OutputFormat::TerraformHcl => "Terraform HCL",
            OutputFormat::TerraformJson => "Terraform JSON",
            OutputFormat::Crossplane => "Crossplane",
            OutputFormat::GrizzlyJson => "Grizzly JSON",
            OutputFormat::GrizzlyYaml => "Grizzly YAML",
        }
    }

    pub fn is_grizzly(&self) -> bool {
        matches!(self, OutputFormat::GrizzlyJson | OutputFormat::GrizzlyYaml)
    }

    /// Grizzly cannot read from Grafana Cloud; everything else is legal everywhere.
    pub fn is_legal_for(&self, target: Target) -> bool {
        !(target == Target::Cloud && self.is_grizzly())
    }

    /// The canonical default format for a target.
    pub fn default_for(_target: Target) -> OutputFormat {
        OutputFormat::TerraformHcl
    }

    /// Keeps `self` if it is legal for `target`, otherwise falls back to the target's default.
    pub fn coerce_for(self, target: Target) -> OutputFormat {
        if self.is_legal_for(target) {
            self
        } else {
            OutputFormat::default_for(target)
        }
    }

    /// Legal formats for `target`, in display order.
    pub fn options_for(target: Target) -> Vec<OutputFormat> {
        OutputFormat::ALL
            .into_iter()
            .filter(|f| f.is_legal_for(target))
            .collect()
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = UnknownOptionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OutputFormat::ALL
            .into_iter()
            .find(|f| f.as_str() == s)
            .ok_or_else(|| UnknownOptionError {
                axis: "output format",
                value: s.to_string(),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cloud_excludes_grizzly_formats() {
        let cloud = OutputFormat::options_for(Target::Cloud);
        assert_eq!(
            cloud,
            vec![
                OutputFormat::TerraformHcl,
                OutputFormat::TerraformJson,
                OutputFormat::Crossplane
            ]
        );
        assert_eq!(OutputFormat::options_for(Target::LocalInstance).len(), 5);
    }

    #[test]
    fn coerce_resets_grizzly_on_cloud() {
        assert_eq!(
            OutputFormat::GrizzlyYaml.coerce_for(Target::Cloud),
            OutputFormat::TerraformHcl
        );
        assert_eq!(
            OutputFormat::Crossplane.coerce_for(Target::Cloud),
            OutputFormat::Crossplane
        );
        assert_eq!(
            OutputFormat::GrizzlyYaml.coerce_for(Target::LocalInstance),
            OutputFormat::GrizzlyYaml
        );
    }

    #[test]
    fn parses_wire_values() {
        assert_eq!("grafana".parse::<Target>().unwrap(), Target::LocalInstance);
        assert_eq!(
            "local-instance".parse::<Target>().unwrap(),
            Target::LocalInstance
        );
        assert_eq!(
            "grizzly-json".parse::<OutputFormat>().unwrap(),
            OutputFormat::GrizzlyJson
        );
        assert!("local".parse::<Target>().is_err());
        let err = "hcl".parse::<OutputFormat>().unwrap_err();
        assert!(err.to_string().contains("hcl"));
    }

    #[test]
    fn serde_uses_backend_spelling() {
        assert_eq!(
            serde_json::to_string(&Target::LocalInstance).unwrap(),
            "\"grafana\""
        );
        assert_eq!(
            serde_json::from_str::<Target>("\"local-instance\"").unwrap(),
            Target::LocalInstance
        );
        assert_eq!(
            serde_json::to_string(&OutputFormat::TerraformJson).unwrap(),
            "\"terraform-json\""
        );
    }
}
