pub mod archive;
pub mod config;
pub mod converter;
pub mod error;
pub mod executor;
pub mod import;
pub mod naming;
pub mod pipeline;
pub mod sanitize;

pub use archive::ArchiveBuilder;
pub use config::{load_config, ExportConfig};
pub use converter::{DocumentConverter, OfficeConverter};
pub use error::{
    ArchiveError, ConfigError, ConvertError, DocpackError, ErrorKind, ExecutorError, ImportError,
    Result,
};
pub use executor::{BackgroundExecutor, ExecutorState, ExportEvent};
pub use import::{DocumentFormat, ImportList, ItemId, SourceItem};
pub use naming::NameRegistry;
pub use pipeline::{ExportOutcome, ExportPipeline, ExportRequest, ExportResult, PipelineConfig};
