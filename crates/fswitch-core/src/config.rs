use crate::error::Result;
use crate::paths;
use serde::{Deserialize, Serialize};
use std::path::Path;

// ---------------------------------------------------------------------------
// ToolsConfig
// ---------------------------------------------------------------------------

/// Command lines for the external database/export collaborators.
///
/// Placeholders: `{dir}` (feature storage directory), `{stem}` (snapshot
/// filename stem), `{file}` (snapshot path), `{env}` (remote environment).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ToolsConfig {
    #[serde(default = "default_export_command")]
    pub export: String,
    #[serde(default = "default_import_command")]
    pub import: String,
    /// Remote environment sync is optional; leaving it unset disables the
    /// sync step rather than failing it.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sync: Option<String>,
}

fn default_export_command() -> String {
    "px db:export --export-dir {dir} --filename {stem}".to_string()
}

fn default_import_command() -> String {
    "px db:import --source-file {file}".to_string()
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            export: default_export_command(),
            import: default_import_command(),
            sync: None,
        }
    }
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Config {
    #[serde(default)]
    pub tools: ToolsConfig,
}

impl Config {
    /// Load `.project-x/config.yml`. A missing file yields the defaults —
    /// the tool works out of the box in a project that never wrote one.
    pub fn load(root: &Path) -> Result<Self> {
        let path = paths::config_path(root);
        if !path.exists() {
            return Ok(Self::default());
        }
        let data = std::fs::read_to_string(&path)?;
        let config: Config = serde_yaml::from_str(&data)?;
        Ok(config)
    }

    pub fn save(&self, root: &Path) -> Result<()> {
        let path = paths::config_path(root);
        let data = serde_yaml::to_string(self)?;
        crate::io::atomic_write(&path, data.as_bytes())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
