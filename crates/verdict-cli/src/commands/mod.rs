pub mod interactive;
pub mod list;
pub mod run;

use anyhow::{Context, Result};
use std::path::PathBuf;
use verdict_config::project::validate_prefix;
use verdict_config::{ConfigLoader, ResolvedSettings};

/// Command-line overrides, highest precedence
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub filter: Option<String>,
    pub output_dir: Option<PathBuf>,
    pub prefix: Option<String>,
    pub no_save: bool,
    pub no_color: bool,
}

impl Overrides {
    pub fn apply(&self, mut settings: ResolvedSettings) -> Result<ResolvedSettings> {
        if let Some(filter) = &self.filter {
            settings.filter = Some(filter.clone()).filter(|f| !f.is_empty());
        }
        if let Some(dir) = &self.output_dir {
            settings.report_dir = dir.clone();
        }
        if let Some(prefix) = &self.prefix {
            validate_prefix("--prefix", prefix)?;
            settings.report_prefix = prefix.clone();
        }
        if self.no_save {
            settings.save = false;
        }
        if self.no_color {
            settings.color = false;
        }
        Ok(settings)
    }
}

/// Config files, then environment, then `overrides`.
pub fn resolve_settings(overrides: &Overrides) -> Result<ResolvedSettings> {
    let cwd = std::env::current_dir().context("cannot determine working directory")?;
    let settings = ConfigLoader::new()
        .resolve_from_directory(&cwd)
        .context("failed to load configuration")?;
    let settings = overrides.apply(settings)?;
    log::debug!("settings: {:?}", settings);
    Ok(settings)
}
