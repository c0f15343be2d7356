use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Coarse classification surfaced to the display side.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    Conversion,
    Filesystem,
    Busy,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorKind::Configuration => write!(f, "configuration error"),
            ErrorKind::Conversion => write!(f, "conversion error"),
            ErrorKind::Filesystem => write!(f, "filesystem error"),
            ErrorKind::Busy => write!(f, "busy"),
        }
    }
}

#[derive(Error, Debug)]
pub enum DocpackError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Conversion error: {0}")]
    Convert(#[from] ConvertError),

    #[error("Archive error: {0}")]
    Archive(#[from] ArchiveError),

    #[error("Import error: {0}")]
    Import(#[from] ImportError),

    #[error("Executor error: {0}")]
    Executor(#[from] ExecutorError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },
}

#[derive(Error, Debug)]
pub enum ConvertError {
    #[error("Converter '{program}' is not available: {reason}")]
    ConverterUnavailable { program: String, reason: String },

    #[error("Failed to stage '{path}' for conversion: {source}")]
    Staging {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Converter exited with {status}: {stderr}")]
    Failed { status: String, stderr: String },

    #[error("Converter produced no output at '{0}'")]
    MissingOutput(PathBuf),

    #[error("Converter did not finish within {0:?}")]
    TimedOut(Duration),
}

impl ConvertError {
    /// Fatal errors abort the whole batch; the rest only fail one item.
    pub fn is_fatal(&self) -> bool {
        matches!(self, ConvertError::ConverterUnavailable { .. })
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            ConvertError::ConverterUnavailable { .. } => ErrorKind::Configuration,
            _ => ErrorKind::Conversion,
        }
    }
}

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("Failed to create archive '{path}': {source}")]
    Create {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read intermediate file '{path}': {source}")]
    ReadEntry {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write archive member '{name}': {message}")]
    WriteEntry { name: String, message: String },

    #[error("Failed to finalize archive '{path}': {message}")]
    Finish { path: PathBuf, message: String },

    #[error("Archive '{0}' is already closed")]
    Closed(PathBuf),
}

#[derive(Error, Debug)]
pub enum ImportError {
    #[error("Unsupported document format: {0}")]
    UnsupportedFormat(String),

    #[error("File is already in the list: {0}")]
    DuplicatePath(PathBuf),

    #[error("Import of '{0}' was declined")]
    Declined(String),

    #[error("Failed to resolve '{path}': {source}")]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("No item with id {0}")]
    UnknownItem(u64),

    #[error("Name cannot be empty")]
    EmptyName,

    #[error("Name '{0}' already exists")]
    NameConflict(String),
}

#[derive(Error, Debug)]
pub enum ExecutorError {
    #[error("An export is already running")]
    Busy,

    #[error("Failed to spawn export worker: {0}")]
    SpawnFailed(String),

    #[error("Export worker channel closed unexpectedly")]
    ChannelClosed,
}

impl ExecutorError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ExecutorError::Busy => ErrorKind::Busy,
            _ => ErrorKind::Configuration,
        }
    }
}

pub type Result<T> = std::result::Result<T, DocpackError>;
