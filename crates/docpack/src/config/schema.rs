use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExportConfig {
    #[serde(default)]
    pub converter: ConverterConfig,
    #[serde(default)]
    pub archive: ArchiveConfig,
    /// Directory under which per-run workspaces are created.
    /// Defaults to the system temp directory.
    #[serde(default)]
    pub workspace_root: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConverterConfig {
    /// Converter executable, either a bare name looked up on `PATH` or a path.
    #[serde(default = "default_program")]
    pub program: String,
    /// Upper bound for one conversion. `0` disables the bound.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Extra arguments placed before the standard conversion arguments.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_program() -> String {
    "soffice".to_string()
}

fn default_timeout_secs() -> u64 {
    300
}

impl ConverterConfig {
    pub fn timeout(&self) -> Option<Duration> {
        if self.timeout_secs == 0 {
            None
        } else {
            Some(Duration::from_secs(self.timeout_secs))
        }
    }
}

impl Default for ConverterConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            timeout_secs: default_timeout_secs(),
            extra_args: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArchiveConfig {
    #[serde(default = "default_name_prefix")]
    pub name_prefix: String,
    #[serde(default)]
    pub compression: Compression,
}

fn default_name_prefix() -> String {
    "Export_PDFs".to_string()
}

impl Default for ArchiveConfig {
    fn default() -> Self {
        Self {
            name_prefix: default_name_prefix(),
            compression: Compression::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Compression {
    #[default]
    Deflated,
    Stored,
}

impl From<Compression> for zip::CompressionMethod {
    fn from(value: Compression) -> Self {
        match value {
            Compression::Deflated => zip::CompressionMethod::Deflated,
            Compression::Stored => zip::CompressionMethod::Stored,
        }
    }
}
