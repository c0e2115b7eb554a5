use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::domain::csv::ReaderOptions;
use crate::domain::error::{AppError, Result};

/// Engine settings with all tunable parameters
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    // Reader configuration
    pub reader: ReaderOptions,

    // Mapping validation configuration
    pub mapping: MappingOptions,

    // Value coercion configuration
    pub coercion: CoercionOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MappingOptions {
    /// Unknown attribute keys fail the whole configuration (otherwise the
    /// rule is dropped with a warning)
    pub strict: bool,

    /// Separator for list-valued attributes whose rule sets none
    pub default_list_separator: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CoercionOptions {
    /// Literals read as `true`, compared case-insensitively
    pub truthy: Vec<String>,

    /// Literals read as `false`, compared case-insensitively
    pub falsy: Vec<String>,
}

impl Default for MappingOptions {
    fn default() -> Self {
        Self {
            strict: true,
            default_list_separator: ",".to_string(),
        }
    }
}

impl Default for CoercionOptions {
    fn default() -> Self {
        Self {
            truthy: vec!["true".to_string(), "yes".to_string(), "1".to_string()],
            falsy: vec!["false".to_string(), "no".to_string(), "0".to_string()],
        }
    }
}

impl CoercionOptions {
    pub fn parse_bool(&self, value: &str) -> Option<bool> {
        let value = value.trim();
        if self.truthy.iter().any(|t| t.eq_ignore_ascii_case(value)) {
            Some(true)
        } else if self.falsy.iter().any(|f| f.eq_ignore_ascii_case(value)) {
            Some(false)
        } else {
            None
        }
    }
}

/// Validation result for configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
}

pub const ENV_PREFIX: &str = "TABLEGRAPH_";

impl EngineConfig {
    /// Defaults, then an optional TOML file, then `TABLEGRAPH_*` variables
    /// (`__` separates nested keys, e.g. `TABLEGRAPH_READER__DELIMITER`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(EngineConfig::default()));
        if let Some(path) = path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));
        Self::from_figment(figment)
    }

    pub fn from_figment(figment: Figment) -> Result<Self> {
        let config: EngineConfig = figment.extract()?;
        let validation = config.validate();
        for warning in &validation.warnings {
            warn!("Engine config: {}", warning);
        }
        if !validation.valid {
            return Err(AppError::Config(validation.errors.join("; ")));
        }
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> ConfigValidation {
        let mut errors = Vec::new();
        let mut warnings = Vec::new();

        // Validate reader config
        if let Err(e) = self.reader.validate() {
            errors.push(e);
        }

        // Validate mapping config
        if self.mapping.default_list_separator.is_empty() {
            errors.push("default_list_separator must not be empty".to_string());
        } else if self.mapping.default_list_separator == self.reader.delimiter.to_string() {
            warnings.push(
                "default_list_separator equals the CSV delimiter; list cells must be quoted"
                    .to_string(),
            );
        }
        if !self.mapping.strict {
            warnings.push("Lenient mapping: unknown attributes will be dropped".to_string());
        }

        // Validate coercion config
        if self.coercion.truthy.is_empty() || self.coercion.falsy.is_empty() {
            errors.push("truthy and falsy literal sets must not be empty".to_string());
        }
        let overlap: Vec<&String> = self
            .coercion
            .truthy
            .iter()
            .filter(|t| {
                self.coercion
                    .falsy
                    .iter()
                    .any(|f| f.eq_ignore_ascii_case(t))
            })
            .collect();
        if !overlap.is_empty() {
            errors.push(format!(
                "Literals are both truthy and falsy: {:?}",
                overlap
            ));
        }

        ConfigValidation {
            valid: errors.is_empty(),
            errors,
            warnings,
        }
    }
}
