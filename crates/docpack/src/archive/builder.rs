use std::fs::File;
use std::io::{Seek, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

use crate::config::Compression;
use crate::error::ArchiveError;

/// Byte destination of an archive.
pub trait ArchiveSink: Write + Seek {
    /// Makes everything written so far durable.
    fn commit(&mut self) -> std::io::Result<()>;
}

impl ArchiveSink for File {
    fn commit(&mut self) -> std::io::Result<()> {
        self.flush()?;
        self.sync_all()
    }
}

/// Incrementally written ZIP archive.
///
/// The file only survives if [`ArchiveBuilder::close`] succeeds. Dropping the
/// builder earlier (abort, early return, panic) deletes the partial file.
pub struct ArchiveBuilder<S: ArchiveSink = File> {
    path: PathBuf,
    writer: Option<ZipWriter<S>>,
    options: SimpleFileOptions,
    entries: Vec<String>,
    committed: bool,
}

impl ArchiveBuilder<File> {
    /// Creates a new archive at `path`. Never overwrites an existing file.
    pub fn open<P: AsRef<Path>>(path: P, compression: Compression) -> Result<Self, ArchiveError> {
        let path = path.as_ref().to_path_buf();
        let file = File::options()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| ArchiveError::Create {
                path: path.clone(),
                source: e,
            })?;

        debug!(archive = %crate::sanitize::redact_path(&path), "Archive opened");

        Ok(Self::with_sink(path, file, compression))
    }
}

impl<S: ArchiveSink> ArchiveBuilder<S> {
    /// Wraps an already created sink backing the file at `path`. The file at
    /// `path` is deleted unless the archive is closed successfully.
    pub fn with_sink(path: PathBuf, sink: S, compression: Compression) -> Self {
        Self {
            path,
            writer: Some(ZipWriter::new(sink)),
            options: SimpleFileOptions::default().compression_method(compression.into()),
            entries: Vec::new(),
            committed: false,
        }
    }

    /// Streams `intermediate` into member `<final_name>.pdf`.
    ///
    /// Uniqueness of `final_name` is the caller's responsibility.
    pub fn add(&mut self, intermediate: &Path, final_name: &str) -> Result<(), ArchiveError> {
        let member = format!("{}.pdf", final_name);
        let writer = self
            .writer
            .as_mut()
            .ok_or_else(|| ArchiveError::Closed(self.path.clone()))?;

        let mut input = File::open(intermediate).map_err(|e| ArchiveError::ReadEntry {
            path: intermediate.to_path_buf(),
            source: e,
        })?;

        writer
            .start_file(member.as_str(), self.options)
            .map_err(|e| ArchiveError::WriteEntry {
                name: member.clone(),
                message: e.to_string(),
            })?;
        std::io::copy(&mut input, writer).map_err(|e| ArchiveError::WriteEntry {
            name: member.clone(),
            message: e.to_string(),
        })?;

        self.entries.push(member);
        Ok(())
    }

    /// Finalizes the archive. The file is complete and readable only once this
    /// returns `Ok`; on error it is deleted.
    pub fn close(mut self) -> Result<PathBuf, ArchiveError> {
        let writer = self
            .writer
            .take()
            .ok_or_else(|| ArchiveError::Closed(self.path.clone()))?;

        let mut sink = writer.finish().map_err(|e| ArchiveError::Finish {
            path: self.path.clone(),
            message: e.to_string(),
        })?;
        sink.commit().map_err(|e| ArchiveError::Finish {
            path: self.path.clone(),
            message: e.to_string(),
        })?;

        self.committed = true;
        Ok(self.path.clone())
    }

    /// Drops the archive and deletes the partial file.
    pub fn discard(self) {}

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Member names in insertion order.
    pub fn entries(&self) -> &[String] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<S: ArchiveSink> Drop for ArchiveBuilder<S> {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        // Release the handle before deleting.
        drop(self.writer.take());
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(
                archive = %crate::sanitize::redact_path(&self.path),
                "Partial archive discarded"
            ),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => warn!(
                archive = %crate::sanitize::redact_path(&self.path),
                error = %e,
                "Failed to discard partial archive"
            ),
        }
    }
}
