pub mod builder;
pub mod file_name;

pub use builder::{ArchiveBuilder, ArchiveSink};
pub use file_name::{archive_file_name, ensure_zip_extension};
