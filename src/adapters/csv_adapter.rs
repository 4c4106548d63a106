//! CSV file data adapter.
//!
//! Hands the raw file text to the domain unchanged; header detection and
//! line filtering happen in the series parser.

use crate::domain::align::SeriesRole;
use crate::domain::error::RotatorError;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub struct CsvFileAdapter {
    asset_a: PathBuf,
    asset_b: PathBuf,
    rate: PathBuf,
    leveraged: Option<PathBuf>,
}

impl CsvFileAdapter {
    pub fn new(asset_a: PathBuf, asset_b: PathBuf, rate: PathBuf, leveraged: Option<PathBuf>) -> Self {
        Self {
            asset_a,
            asset_b,
            rate,
            leveraged,
        }
    }

    /// Build from the `[data]` section, resolving relative paths against `base_dir`.
    pub fn from_config(config: &dyn ConfigPort, base_dir: &Path) -> Result<Self, RotatorError> {
        let resolve = |role: SeriesRole| {
            config
                .get_string("data", role.config_key())
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .map(|s| base_dir.join(s))
        };
        let required = |role: SeriesRole| {
            resolve(role).ok_or_else(|| RotatorError::ConfigMissing {
                section: "data".into(),
                key: role.config_key().into(),
            })
        };

        Ok(Self {
            asset_a: required(SeriesRole::AssetA)?,
            asset_b: required(SeriesRole::AssetB)?,
            rate: required(SeriesRole::Rate)?,
            leveraged: resolve(SeriesRole::Leveraged),
        })
    }

    pub fn path(&self, role: SeriesRole) -> Option<&Path> {
        match role {
            SeriesRole::AssetA => Some(&self.asset_a),
            SeriesRole::AssetB => Some(&self.asset_b),
            SeriesRole::Rate => Some(&self.rate),
            SeriesRole::Leveraged => self.leveraged.as_deref(),
        }
    }
}

impl DataPort for CsvFileAdapter {
    fn fetch_raw(&self, role: SeriesRole) -> Result<Option<String>, RotatorError> {
        let Some(path) = self.path(role) else {
            return Ok(None);
        };
        let content = fs::read_to_string(path).map_err(|e| RotatorError::DataSource {
            reason: format!("failed to read {} series {}: {}", role, path.display(), e),
        })?;
        debug!(%role, path = %path.display(), bytes = content.len(), "read series file");

        if role == SeriesRole::Leveraged && content.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(content))
    }
}
