//! Verdict Configuration System
//!
//! Settings for a test run come from, in increasing precedence:
//! 1. Global config (~/.verdict/config.toml)
//! 2. Project config (verdict.toml, found by walking up from the working directory)
//! 3. Environment variables (VERDICT_*, NO_COLOR)
//! 4. CLI flags (applied by the caller)
//!
//! # Example
//!
//! ```no_run
//! use verdict_config::ConfigLoader;
//! use std::path::Path;
//!
//! let mut loader = ConfigLoader::new();
//! let settings = loader.resolve_from_directory(Path::new(".")).unwrap();
//! println!("reports go to {}", settings.report_dir.display());
//! ```

pub mod global;
pub mod loader;
pub mod project;

use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {0}")]
    NotFound(PathBuf),

    #[error("Failed to read configuration file: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Invalid TOML syntax in {file}: {error}")]
    TomlParseError {
        file: PathBuf,
        error: toml::de::Error,
    },

    #[error("Invalid value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },

    #[error("Home directory not found")]
    HomeNotFound,
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;

pub use global::GlobalConfig;
pub use loader::{Config, ConfigLoader, ResolvedSettings};
pub use project::{ProjectConfig, ReportSection, RunSection};
