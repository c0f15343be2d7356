use std::path::{Path, PathBuf};

use tempfile::TempDir;

const WORKSPACE_PREFIX: &str = "docpack_export_";

/// Uniquely named temporary directory for one export run.
///
/// Removed by [`Workspace::close`] or, on any other exit path, when dropped.
pub struct Workspace {
    dir: TempDir,
}

impl Workspace {
    /// Creates the workspace under `root`, or the system temp dir when `None`.
    pub fn create(root: Option<&Path>) -> std::io::Result<Self> {
        let root = root
            .map(Path::to_path_buf)
            .unwrap_or_else(std::env::temp_dir);
        let dir = tempfile::Builder::new()
            .prefix(WORKSPACE_PREFIX)
            .tempdir_in(root)?;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    pub fn to_path_buf(&self) -> PathBuf {
        self.dir.path().to_path_buf()
    }

    /// Removes the directory, reporting failures instead of swallowing them.
    pub fn close(self) -> std::io::Result<()> {
        self.dir.close()
    }
}
