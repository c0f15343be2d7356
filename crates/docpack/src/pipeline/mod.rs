pub mod config;
pub mod context;
pub mod error;
pub mod progress;
pub mod result;
pub mod runner;
pub mod workspace;

pub use config::PipelineConfig;
pub use context::{ExportContext, ExportRequest};
pub use error::{ItemFailure, PipelineError};
pub use progress::{ExportPhase, NoopProgress, ProgressEvent, ProgressReporter};
pub use result::{ExportOutcome, ExportResult, RunError};
pub use runner::ExportPipeline;
pub use workspace::Workspace;
