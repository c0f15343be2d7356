use std::path::{Path, PathBuf};

use crate::config::schema::ExportConfig;
use crate::error::ConfigError;

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ExportConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ExportConfig, ConfigError> {
    let config: ExportConfig = serde_json::from_str(content)?;

    validate_config(&config)?;

    Ok(config)
}

/// `<platform config dir>/docpack/config.json`, if the platform has one.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("docpack").join("config.json"))
}

pub fn validate_config(config: &ExportConfig) -> Result<(), ConfigError> {
    if config.converter.program.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "converter.program must not be empty".to_string(),
        });
    }

    let prefix = &config.archive.name_prefix;
    if prefix.trim().is_empty() {
        return Err(ConfigError::Validation {
            message: "archive.name_prefix must not be empty".to_string(),
        });
    }
    if prefix.contains('/') || prefix.contains('\\') {
        return Err(ConfigError::Validation {
            message: format!(
                "archive.name_prefix '{}' must not contain path separators",
                prefix
            ),
        });
    }

    if let Some(root) = &config.workspace_root {
        if root.as_os_str().is_empty() {
            return Err(ConfigError::Validation {
                message: "workspace_root must not be empty when set".to_string(),
            });
        }
    }

    Ok(())
}
