use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{DiffError, DiffResult};

/// Configuration for the diff engine.
///
/// Every field has a default, so a TOML file only needs the keys it changes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Block kinds whose content is table-shaped (rows of cells).
    pub table_kinds: Vec<String>,
    /// Block kinds whose depth prop is copied into `FlatBlock::depth`.
    pub heading_kinds: Vec<String>,
    /// The prop read for heading depth.
    pub depth_prop: String,
    /// Sibling-group size above which move detection logs a warning.
    pub large_group_threshold: usize,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            table_kinds: vec!["table".to_string()],
            heading_kinds: vec!["heading".to_string()],
            depth_prop: "level".to_string(),
            large_group_threshold: 1000,
        }
    }
}

impl DiffConfig {
    /// Parse a configuration from TOML text.
    pub fn from_toml_str(text: &str) -> DiffResult<Self> {
        let config: Self = toml::from_str(text).map_err(|e| DiffError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a TOML configuration file.
    pub fn load(path: &Path) -> DiffResult<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| DiffError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Returns `true` if `kind` carries heading depth.
    pub fn is_heading(&self, kind: &str) -> bool {
        self.heading_kinds.iter().any(|k| k == kind)
    }

    fn validate(&self) -> DiffResult<()> {
        if self.depth_prop.is_empty() {
            return Err(DiffError::Config("depth_prop must not be empty".into()));
        }
        if let Some(kind) = self.table_kinds.iter().find(|k| k.is_empty()) {
            return Err(DiffError::Config(format!("invalid table kind {kind:?}")));
        }
        Ok(())
    }
}
