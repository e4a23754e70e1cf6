//! Global Configuration (~/.verdict/config.toml)
//!
//! User-level defaults shared by every project. Same sections as
//! `verdict.toml`; a project file overrides them field by field.

use crate::project::{ReportSection, RunSection};
use crate::{ConfigError, ConfigResult};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Global user configuration from ~/.verdict/config.toml
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(deny_unknown_fields)]
pub struct GlobalConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run: Option<RunSection>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub report: Option<ReportSection>,
}

impl GlobalConfig {
    /// Load global configuration from a file
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

    /// The global configuration directory (~/.verdict)
    pub fn global_config_dir() -> ConfigResult<PathBuf> {
        let home = dirs::home_dir().ok_or(ConfigError::HomeNotFound)?;
        Ok(home.join(".verdict"))
    }

    /// The global config file path (~/.verdict/config.toml)
    pub fn global_config_path() -> ConfigResult<PathBuf> {
        Ok(Self::global_config_dir()?.join("config.toml"))
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: &GlobalConfig) {
        if let Some(run) = &other.run {
            self.run = Some(run.clone().or(self.run.as_ref()));
        }
        if let Some(report) = &other.report {
            self.report = Some(report.clone().or(self.report.as_ref()));
        }
    }
}
