//! Configuration loading and config file resolution
//!
//! Anchor patterns live in configuration rather than code because they are
//! the part most likely to need a tweak when the upstream scripts change
//! shape. A missing config file is not fatal: the compiled defaults below
//! reproduce the anchors the tables are currently known to use.

use crate::table::TableName;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TXDB_CONFIG";

/// Extraction settings for one literal table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Upstream file name (also the cache key)
    pub file_name: String,
    /// Must expose the opening delimiter as its first capture group
    pub start_anchor: String,
    pub end_anchor: String,
}

/// Anchors locating the tempo dispatch function inside the notes table source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DispatchConfig {
    pub function_anchor: String,
    pub switch_anchor: String,
    pub end_anchor: String,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            function_anchor: r"^\s*function\s*get_bpm\s*\(.*$".to_string(),
            switch_anchor: r"^\s*switch\s*\(\s*tag\s*\)\s*\{.*$".to_string(),
            end_anchor: r".*\}.*".to_string(),
        }
    }
}

/// Per-table extraction settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub titles: TableConfig,
    pub levels: TableConfig,
    pub notes_bpm: TableConfig,
    pub versions: TableConfig,
}

impl Default for TablesConfig {
    fn default() -> Self {
        Self {
            titles: TableConfig {
                file_name: TableName::Titles.default_file_name().to_string(),
                start_anchor: r"^\s*titletbl\s*=\s*(\{).*$".to_string(),
                end_anchor: r"\s*\}\s*;\s*".to_string(),
            },
            levels: TableConfig {
                file_name: TableName::Levels.default_file_name().to_string(),
                start_anchor: r"^\s*actbl\s*=\s*(\{).*$".to_string(),
                end_anchor: r"\s*\}\s*;\s*".to_string(),
            },
            notes_bpm: TableConfig {
                file_name: TableName::NotesBpm.default_file_name().to_string(),
                start_anchor: r"^datatbl\s*=\s*(\{).*$".to_string(),
                end_anchor: r"\s*\}\s*;\s*".to_string(),
            },
            versions: TableConfig {
                file_name: TableName::Versions.default_file_name().to_string(),
                start_anchor: r"^vertbl\s*=\s*(\[)(.*)$".to_string(),
                end_anchor: r"^\s*$".to_string(),
            },
        }
    }
}

/// Top-level TXDB configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TxdbConfig {
    pub tables: TablesConfig,
    pub dispatch: DispatchConfig,
    /// Dummy-row key the upstream tables start with
    pub placeholder_key: String,
    /// Version id of the extra edition listed after all numbered versions
    pub sentinel_version_id: i64,
}

impl Default for TxdbConfig {
    fn default() -> Self {
        Self {
            tables: TablesConfig::default(),
            dispatch: DispatchConfig::default(),
            placeholder_key: "__dmy__".to_string(),
            sentinel_version_id: 35,
        }
    }
}

impl TxdbConfig {
    /// Parse configuration from TOML text. Omitted keys take their defaults.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: TxdbConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&text)?;
        info!(path = %path.display(), "Loaded TXDB configuration");
        Ok(config)
    }

    /// Load configuration following the resolution priority, degrading to
    /// compiled defaults when no config file exists.
    ///
    /// A config file that exists but does not parse is still an error.
    pub fn load_or_default(explicit: Option<&Path>) -> Result<Self> {
        match resolve_config_path(explicit) {
            Some(path) if path.exists() => Self::load(&path),
            Some(path) => {
                warn!(
                    path = %path.display(),
                    "Config file not found, using compiled defaults"
                );
                Ok(Self::default())
            }
            None => {
                warn!("No config location available, using compiled defaults");
                Ok(Self::default())
            }
        }
    }

    /// Extraction settings for one table
    pub fn table(&self, table: TableName) -> &TableConfig {
        match table {
            TableName::Titles => &self.tables.titles,
            TableName::Levels => &self.tables.levels,
            TableName::NotesBpm => &self.tables.notes_bpm,
            TableName::Versions => &self.tables.versions,
        }
    }

    fn validate(&self) -> Result<()> {
        if self.placeholder_key.trim().is_empty() {
            return Err(Error::Config("placeholder_key must not be empty".to_string()));
        }
        if self.sentinel_version_id <= 0 {
            return Err(Error::Config(format!(
                "sentinel_version_id must be positive, got {}",
                self.sentinel_version_id
            )));
        }
        for table in TableName::ALL {
            let settings = self.table(table);
            if settings.file_name.trim().is_empty() {
                return Err(Error::Config(format!("{:?}: file_name must not be empty", table)));
            }
        }
        Ok(())
    }
}

/// Config file resolution priority:
/// 1. Explicit path (highest priority)
/// 2. `TXDB_CONFIG` environment variable
/// 3. `<platform config dir>/txdb/config.toml`
pub fn resolve_config_path(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return Some(path.to_path_buf());
    }

    if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    dirs::config_dir().map(|d| d.join("txdb").join("config.toml"))
}
