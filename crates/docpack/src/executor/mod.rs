pub mod event;
pub mod worker;

pub use event::{ChannelProgress, ExecutorState, ExportEvent};
pub use worker::BackgroundExecutor;

// Re-export crossbeam_channel so front-ends can select over the event receiver
pub use crossbeam_channel;
