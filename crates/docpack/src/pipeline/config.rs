use std::path::PathBuf;

use crate::config::{Compression, ExportConfig};

pub struct PipelineConfig {
    pub workspace_root: Option<PathBuf>,
    pub archive_prefix: String,
    pub compression: Compression,
}

impl PipelineConfig {
    pub fn from_config(config: &ExportConfig) -> Self {
        Self {
            workspace_root: config.workspace_root.clone(),
            archive_prefix: config.archive.name_prefix.clone(),
            compression: config.archive.compression,
        }
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self::from_config(&ExportConfig::default())
    }
}
