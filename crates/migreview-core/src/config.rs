//! # Configuration File Parser
//!
//! Reads and parses `migreview.toml`, the optional configuration file. Every
//! section is optional:
//!
//! - `[model]`: API endpoint and request timeout
//! - `[review]`: default output mode
//! - `[session]`: files that replace the built-in rulebook and incident log
//!   when a session starts
//!
//! Example `migreview.toml`:
//!
//! ```toml
//! [model]
//! timeout_secs = 90
//!
//! [review]
//! output = "plain"
//!
//! [session]
//! rulebook_file = "docs/migration-rules.md"
//! incidents_file = "docs/incidents.md"
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{MigReviewError, Result};
use crate::review::request::OutputMode;

/// Default config file name.
pub const CONFIG_FILE_NAME: &str = "migreview.toml";

/// Public Gemini API base URL.
pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Seconds to wait for the model before giving up.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// Top-level migreview.toml structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MigReviewConfig {
    pub model: ModelConfig,
    pub review: ReviewConfig,
    pub session: SessionConfig,

    /// Absolute path to the directory containing migreview.toml, used to
    /// resolve the relative paths in `[session]`.
    #[serde(skip)]
    pub config_dir: Option<PathBuf>,
}

/// Model API settings. The model identifier itself is not configurable.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ModelConfig {
    /// Base URL of the Gemini REST API.
    pub endpoint: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ReviewConfig {
    /// Output mode used when none is given on the command line.
    pub output: Option<OutputMode>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// File whose contents become the starting rulebook.
    pub rulebook_file: Option<PathBuf>,
    /// File whose contents become the starting incident log.
    pub incidents_file: Option<PathBuf>,
}

/// Read and parse migreview.toml from the given directory.
///
/// Returns `None` if the file doesn't exist (config is optional).
/// Returns an error if the file exists but can't be parsed.
pub fn read_config(dir: &Path) -> Result<Option<MigReviewConfig>> {
    let path = dir.join(CONFIG_FILE_NAME);
    if !path.exists() {
        return Ok(None);
    }
    read_config_file(&path).map(Some)
}

/// Read and parse a config file at an explicit path. The file must exist.
pub fn read_config_file(path: &Path) -> Result<MigReviewConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| MigReviewError::Config {
        message: format!("Failed to read {}: {}", path.display(), e),
    })?;

    let mut config: MigReviewConfig =
        toml::from_str(&content).map_err(|e| MigReviewError::Config {
            message: format!("Failed to parse {}: {}", path.display(), e),
        })?;

    let dir = path.parent().unwrap_or(Path::new("."));
    let dir = if dir.as_os_str().is_empty() {
        Path::new(".")
    } else {
        dir
    };
    config.config_dir = Some(std::fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf()));

    config.validate()?;

    Ok(config)
}

impl MigReviewConfig {
    /// Validate constraints that serde cannot enforce.
    pub fn validate(&self) -> Result<()> {
        if self.model.timeout_secs == 0 {
            return Err(MigReviewError::Config {
                message: "[model] timeout_secs must be greater than 0".to_string(),
            });
        }

        let endpoint = url::Url::parse(&self.model.endpoint).map_err(|e| MigReviewError::Config {
            message: format!("[model] endpoint '{}' is not a valid URL: {}", self.model.endpoint, e),
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(MigReviewError::Config {
                message: format!(
                    "[model] endpoint must use http or https, got '{}'",
                    endpoint.scheme()
                ),
            });
        }

        Ok(())
    }

    /// Resolve a `[session]` path against the config file's directory.
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            return path.to_path_buf();
        }
        match &self.config_dir {
            Some(dir) => dir.join(path),
            None => path.to_path_buf(),
        }
    }

    /// Starting rulebook text from `[session] rulebook_file`, if configured.
    pub fn initial_rulebook(&self) -> Result<Option<String>> {
        self.read_session_file(self.session.rulebook_file.as_deref())
    }

    /// Starting incident log text from `[session] incidents_file`, if configured.
    pub fn initial_incidents(&self) -> Result<Option<String>> {
        self.read_session_file(self.session.incidents_file.as_deref())
    }

    fn read_session_file(&self, path: Option<&Path>) -> Result<Option<String>> {
        let Some(path) = path else {
            return Ok(None);
        };
        let resolved = self.resolve_path(path);
        std::fs::read_to_string(&resolved)
            .map(Some)
            .map_err(|e| MigReviewError::Input {
                message: format!("Failed to read {}", resolved.display()),
                source: e,
            })
    }
}
