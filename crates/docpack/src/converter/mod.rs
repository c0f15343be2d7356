pub mod office;

use std::path::{Path, PathBuf};

use crate::error::ConvertError;
use crate::import::ItemId;

pub use office::OfficeConverter;

/// A PDF produced inside the workspace for one source item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConvertedFile {
    pub item_id: ItemId,
    pub path: PathBuf,
}

pub trait DocumentConverter: Send + Sync {
    /// Converts `source` into `<workdir>/<surrogate>.pdf` and returns that path.
    ///
    /// Must never modify `source`. Only `ConvertError::ConverterUnavailable`
    /// is treated as fatal by callers.
    fn convert(&self, source: &Path, workdir: &Path, surrogate: &str)
        -> Result<PathBuf, ConvertError>;

    /// Checks that the converter can be invoked at all.
    fn check_available(&self) -> Result<(), ConvertError>;

    fn name(&self) -> &str;
}
