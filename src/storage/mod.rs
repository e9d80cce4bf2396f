//! Storage Layer
//!
//! Locates the per-user directories the scanner reads its settings from.

use anyhow::Result;
use std::path::PathBuf;

const CONFIG_FILE: &str = "config.toml";

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "scalereader", "ScaleReader")
        .ok_or_else(|| anyhow::anyhow!("Could not determine home directory"))
}

/// Default location of the configuration file
///
/// Only resolves the path; the directory may not exist yet.
pub fn default_config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join(CONFIG_FILE))
}
