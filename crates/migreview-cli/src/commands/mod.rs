pub mod review;
pub mod shell;

use std::path::Path;

use anyhow::Result;

use migreview_core::config::{self, MigReviewConfig};

/// Load `--config`, else `./migreview.toml` if present, else defaults.
pub fn load_config(explicit: Option<&Path>) -> Result<MigReviewConfig> {
    let config = match explicit {
        Some(path) => config::read_config_file(path)?,
        None => config::read_config(Path::new("."))?.unwrap_or_default(),
    };
    Ok(config)
}
