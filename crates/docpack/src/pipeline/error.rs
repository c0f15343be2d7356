use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::{ArchiveError, ConvertError, ErrorKind};
use crate::import::ItemId;

/// Run-level failures. Any of these ends the export without an archive.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Nothing to export: the batch is empty")]
    EmptyBatch,

    #[error("Failed to create workspace: {0}")]
    Workspace(#[source] std::io::Error),

    #[error("{0}")]
    Converter(#[from] ConvertError),

    #[error("{0}")]
    Archive(#[from] ArchiveError),

    #[error("None of the {0} documents could be converted")]
    NothingConverted(usize),
}

impl PipelineError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            PipelineError::EmptyBatch => ErrorKind::Configuration,
            PipelineError::Workspace(_) | PipelineError::Archive(_) => ErrorKind::Filesystem,
            PipelineError::Converter(e) => e.kind(),
            PipelineError::NothingConverted(_) => ErrorKind::Conversion,
        }
    }
}

/// A single document that could not be converted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ItemFailure {
    pub item_id: ItemId,
    /// Display name of the item, as the user knows it.
    pub name: String,
    pub reason: String,
}
