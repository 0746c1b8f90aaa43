//! Settings file handling.
//!
//! Settings are read from an optional JSON file. Every field has a
//! default, so a partial file (or none at all) is fine.

use crate::error::Result;
use crate::export::ExportFormat;
use crate::style::StyleConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Environment variable overriding the history directory
pub const DATA_DIR_ENV: &str = "QRSMITH_DATA_DIR";

#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct Settings {
    /// Style used when no flag overrides it
    pub style: StyleConfig,
    pub format: ExportFormat,
    pub output_dir: Option<PathBuf>,
    pub data_dir: Option<PathBuf>,
}

impl Settings {
    /// Load settings from `path`, or defaults when no path is given
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let content = std::fs::read_to_string(path)?;
                let settings = serde_json::from_str(&content)?;
                log::debug!("loaded settings from {}", path.display());
                Ok(settings)
            }
            None => Ok(Self::default()),
        }
    }

    /// History directory: explicit override, then the environment, then
    /// the settings file, then the platform data directory.
    pub fn resolve_data_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        if let Some(dir) = override_dir {
            return dir.to_path_buf();
        }
        if let Some(dir) = std::env::var_os(DATA_DIR_ENV) {
            return PathBuf::from(dir);
        }
        if let Some(dir) = &self.data_dir {
            return dir.clone();
        }
        dirs::data_dir()
            .map(|d| d.join("qrsmith"))
            .unwrap_or_else(|| PathBuf::from(".qrsmith"))
    }

    pub fn resolve_output_dir(&self, override_dir: Option<&Path>) -> PathBuf {
        override_dir
            .map(Path::to_path_buf)
            .or_else(|| self.output_dir.clone())
            .unwrap_or_else(|| PathBuf::from("."))
    }
}
