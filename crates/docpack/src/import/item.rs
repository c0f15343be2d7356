use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

/// Stable identifier assigned at import time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ItemId(u64);

impl ItemId {
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    pub fn get(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for ItemId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Editable office formats accepted for export.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    Doc,
    Docx,
    Odt,
}

impl DocumentFormat {
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.trim_start_matches('.').to_lowercase().as_str() {
            "doc" => Some(Self::Doc),
            "docx" => Some(Self::Docx),
            "odt" => Some(Self::Odt),
            _ => None,
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|e| e.to_str())
            .and_then(Self::from_extension)
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Doc => "doc",
            Self::Docx => "docx",
            Self::Odt => "odt",
        }
    }
}

/// One user-selected document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceItem {
    pub id: ItemId,
    /// Absolute path to the original document.
    pub source_path: PathBuf,
    /// Extension exactly as it appeared on disk, without the dot.
    pub extension: String,
    pub format: DocumentFormat,
    /// Base name (no extension) the exported PDF should carry.
    pub display_name: String,
}

impl SourceItem {
    pub fn new(id: ItemId, source_path: PathBuf, display_name: impl Into<String>) -> Option<Self> {
        let extension = source_path.extension()?.to_str()?.to_string();
        let format = DocumentFormat::from_extension(&extension)?;
        Some(Self {
            id,
            source_path,
            extension,
            format,
            display_name: display_name.into(),
        })
    }

    /// Display name qualified with the source extension, e.g. `rapport.docx`.
    pub fn full_name(&self) -> String {
        crate::naming::qualified_name(&self.display_name, &self.extension)
    }

    /// Collision-free basename used inside the workspace.
    pub fn surrogate_name(&self) -> String {
        format!("item_{:06}", self.id.get())
    }
}
