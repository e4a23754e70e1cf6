//! Project Configuration (verdict.toml)

use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Project configuration file name
pub const PROJECT_CONFIG_FILE: &str = "verdict.toml";

/// `[run]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct RunSection {
    /// Only run tests whose `Suite.Method` name contains this
    #[serde(skip_serializing_if = "Option::is_none")]
    pub filter: Option<String>,
}

/// `[report]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ReportSection {
    /// Artifact file name prefix (default: "test_results")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prefix: Option<String>,

    /// Directory the artifact is written to (default: working directory)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<PathBuf>,

    /// Colored console output
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<bool>,

    /// Write the artifact after each run
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save: Option<bool>,
}

impl RunSection {
    /// Fill unset fields from `lower`
    pub fn or(self, lower: Option<&RunSection>) -> RunSection {
        let lower = lower.cloned().unwrap_or_default();
        RunSection {
            filter: self.filter.or(lower.filter),
        }
    }
}

impl ReportSection {
    /// Fill unset fields from `lower`
    pub fn or(self, lower: Option<&ReportSection>) -> ReportSection {
        let lower = lower.cloned().unwrap_or_default();
        ReportSection {
            prefix: self.prefix.or(lower.prefix),
            output_dir: self.output_dir.or(lower.output_dir),
            color: self.color.or(lower.color),
            save: self.save.or(lower.save),
        }
    }

    pub(crate) fn validate(&self, section: &str) -> ConfigResult<()> {
        if let Some(prefix) = &self.prefix {
            validate_prefix(&format!("{}.prefix", section), prefix)?;
        }
        if let Some(dir) = &self.output_dir {
            if dir.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: format!("{}.output_dir", section),
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }
}

/// Artifact prefixes end up in a file name: no separators, not blank.
pub fn validate_prefix(field: &str, prefix: &str) -> ConfigResult<()> {
    if prefix.trim().is_empty() {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: "must not be empty".to_string(),
        });
    }
    if prefix.contains(['/', '\\']) {
        return Err(ConfigError::InvalidValue {
            field: field.to_string(),
            reason: format!("'{}' must not contain path separators", prefix),
        });
    }
    Ok(())
}

/// Project configuration from verdict.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct ProjectConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSection>,
}

impl ProjectConfig {
    /// Load project configuration from a file
    pub fn load_from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ConfigError::NotFound(path.to_path_buf())
            } else {
                ConfigError::IoError(e)
            }
        })?;

        let config: Self = toml::from_str(&content).map_err(|e| ConfigError::TomlParseError {
            file: path.to_path_buf(),
            error: e,
        })?;

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        match &self.report {
            Some(report) => report.validate("report"),
            None => Ok(()),
        }
    }

    pub fn filter(&self) -> Option<&str> {
        self.run.as_ref()?.filter.as_deref()
    }
}
