//! Configuration Loader
//!
//! Loads configuration from multiple sources and resolves it into the
//! settings a run actually uses.

use crate::global::GlobalConfig;
use crate::project::{validate_prefix, ProjectConfig, ReportSection, PROJECT_CONFIG_FILE};
use crate::ConfigResult;
use std::env;
use std::path::{Path, PathBuf};

/// Default artifact prefix
pub const DEFAULT_REPORT_PREFIX: &str = "test_results";

/// Environment variables read by [`ResolvedSettings::apply_env`]
pub const ENV_FILTER: &str = "VERDICT_FILTER";
pub const ENV_REPORT_DIR: &str = "VERDICT_REPORT_DIR";
pub const ENV_REPORT_PREFIX: &str = "VERDICT_REPORT_PREFIX";
pub const ENV_NO_SAVE: &str = "VERDICT_NO_SAVE";
pub const ENV_NO_COLOR: &str = "NO_COLOR";

/// Configuration loader
///
/// Precedence, lowest first:
/// 1. Global config (~/.verdict/config.toml)
/// 2. Project config (verdict.toml)
/// 3. Environment variables
/// 4. CLI flags (handled by caller)
pub struct ConfigLoader {
    /// Cached global config path
    global_config_path: Option<PathBuf>,
}

/// Configuration files as loaded, before resolution
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub project: ProjectConfig,
    pub global: GlobalConfig,
    /// Directory where verdict.toml was found
    pub project_root: Option<PathBuf>,
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedSettings {
    pub filter: Option<String>,
    pub report_dir: PathBuf,
    pub report_prefix: String,
    pub color: bool,
    pub save: bool,
}

impl Default for ResolvedSettings {
    fn default() -> Self {
        Self {
            filter: None,
            report_dir: PathBuf::from("."),
            report_prefix: DEFAULT_REPORT_PREFIX.to_string(),
            color: true,
            save: true,
        }
    }
}

impl ConfigLoader {
    pub fn new() -> Self {
        Self {
            global_config_path: None,
        }
    }

    /// Use `path` instead of ~/.verdict/config.toml
    pub fn with_global_path(path: impl Into<PathBuf>) -> Self {
        Self {
            global_config_path: Some(path.into()),
        }
    }

    /// Find verdict.toml by walking up from `start_dir` and load it along
    /// with the global config.
    pub fn load_from_directory(&mut self, start_dir: &Path) -> ConfigResult<Config> {
        let (project_root, project) = self.find_project_config(start_dir)?;
        let global = self.load_global_config();
        Ok(Config {
            project,
            global,
            project_root,
        })
    }

    /// Load, resolve and apply the process environment.
    pub fn resolve_from_directory(&mut self, start_dir: &Path) -> ConfigResult<ResolvedSettings> {
        self.load_from_directory(start_dir)?.resolve().apply_env()
    }

    fn find_project_config(
        &self,
        start_dir: &Path,
    ) -> ConfigResult<(Option<PathBuf>, ProjectConfig)> {
        let mut current = start_dir.to_path_buf();

        loop {
            let config_path = current.join(PROJECT_CONFIG_FILE);

            if config_path.exists() {
                log::debug!("using project config {}", config_path.display());
                let project_config = ProjectConfig::load_from_file(&config_path)?;
                return Ok((Some(current), project_config));
            }

            match current.parent() {
                Some(parent) => current = parent.to_path_buf(),
                None => return Ok((None, ProjectConfig::default())),
            }
        }
    }

    /// The global config is optional; a broken one is reported and ignored.
    fn load_global_config(&mut self) -> GlobalConfig {
        if self.global_config_path.is_none() {
            match GlobalConfig::global_config_path() {
                Ok(path) => self.global_config_path = Some(path),
                Err(e) => {
                    log::debug!("no global config: {}", e);
                    return GlobalConfig::default();
                }
            }
        }

        let Some(path) = self.global_config_path.as_ref() else {
            return GlobalConfig::default();
        };
        if !path.exists() {
            return GlobalConfig::default();
        }

        GlobalConfig::load_from_file(path).unwrap_or_else(|e| {
            log::warn!("ignoring global config: {}", e);
            GlobalConfig::default()
        })
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    /// Merge project over global over built-in defaults.
    ///
    /// A relative project `output_dir` is taken relative to the project root.
    pub fn resolve(&self) -> ResolvedSettings {
        let run = self
            .project
            .run
            .clone()
            .unwrap_or_default()
            .or(self.global.run.as_ref());
        let project_report = self.project.report.clone().unwrap_or_default();

        let project_dir = match (&project_report.output_dir, &self.project_root) {
            (Some(dir), Some(root)) if dir.is_relative() => Some(root.join(dir)),
            (dir, _) => dir.clone(),
        };
        let report = ReportSection {
            output_dir: project_dir,
            ..project_report
        }
        .or(self.global.report.as_ref());

        let defaults = ResolvedSettings::default();
        ResolvedSettings {
            filter: non_empty(run.filter),
            report_dir: report.output_dir.unwrap_or(defaults.report_dir),
            report_prefix: report.prefix.unwrap_or(defaults.report_prefix),
            color: report.color.unwrap_or(defaults.color),
            save: report.save.unwrap_or(defaults.save),
        }
    }

    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }
}

impl ResolvedSettings {
    /// Apply overrides from the process environment.
    pub fn apply_env(self) -> ConfigResult<Self> {
        self.apply_env_with(|key| env::var(key).ok())
    }

    /// Apply overrides from `lookup`, which maps a variable name to its value.
    pub fn apply_env_with(mut self, lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        if let Some(filter) = lookup(ENV_FILTER) {
            self.filter = non_empty(Some(filter));
        }
        if let Some(dir) = lookup(ENV_REPORT_DIR).filter(|d| !d.is_empty()) {
            self.report_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = lookup(ENV_REPORT_PREFIX) {
            validate_prefix(ENV_REPORT_PREFIX, &prefix)?;
            self.report_prefix = prefix;
        }
        if let Some(no_save) = lookup(ENV_NO_SAVE) {
            if is_truthy(&no_save) {
                self.save = false;
            }
        }
        // https://no-color.org: any non-empty value
        if lookup(ENV_NO_COLOR).is_some_and(|v| !v.is_empty()) {
            self.color = false;
        }
        Ok(self)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn is_truthy(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "true" | "1" | "yes")
}
