use std::path::PathBuf;

use crate::converter::ConvertedFile;
use crate::import::SourceItem;

use super::error::ItemFailure;

/// A frozen batch handed to the pipeline.
#[derive(Debug, Clone)]
pub struct ExportRequest {
    /// Items in export order, display names already frozen.
    pub items: Vec<SourceItem>,
    /// Directory receiving the archive.
    pub destination: PathBuf,
    /// Explicit archive file name; generated from the prefix when `None`.
    pub archive_name: Option<String>,
}

impl ExportRequest {
    pub fn new(items: Vec<SourceItem>, destination: impl Into<PathBuf>) -> Self {
        Self {
            items,
            destination: destination.into(),
            archive_name: None,
        }
    }

    pub fn with_archive_name(mut self, name: impl Into<String>) -> Self {
        self.archive_name = Some(name.into());
        self
    }
}

pub struct ExportContext {
    // Input
    pub request: ExportRequest,

    // Conversion results, index into `request.items` in input order
    pub converted: Vec<(usize, ConvertedFile)>,
    pub failures: Vec<ItemFailure>,

    // Archive step results
    pub archive_path: Option<PathBuf>,
    pub members: Vec<String>,
}

impl ExportContext {
    pub fn new(request: ExportRequest) -> Self {
        Self {
            request,
            converted: Vec::new(),
            failures: Vec::new(),
            archive_path: None,
            members: Vec::new(),
        }
    }

    pub fn items_total(&self) -> usize {
        self.request.items.len()
    }
}
