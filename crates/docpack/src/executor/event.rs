use crossbeam_channel::Sender;
use serde::{Deserialize, Serialize};

use crate::pipeline::{ExportResult, ProgressEvent, ProgressReporter};

/// Lifecycle of the background executor.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExecutorState {
    Idle,
    Running,
    Completed,
    Failed,
}

impl ExecutorState {
    /// Whether a new export may be submitted.
    pub fn accepts_work(&self) -> bool {
        !matches!(self, ExecutorState::Running)
    }
}

impl std::fmt::Display for ExecutorState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExecutorState::Idle => write!(f, "Idle"),
            ExecutorState::Running => write!(f, "Running"),
            ExecutorState::Completed => write!(f, "Completed"),
            ExecutorState::Failed => write!(f, "Failed"),
        }
    }
}

/// Messages delivered to the interactive side, all on one channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ExportEvent {
    Started {
        job_id: String,
        items_total: usize,
    },
    Progress {
        job_id: String,
        progress: ProgressEvent,
    },
    /// Sent exactly once per submitted job.
    Finished {
        job_id: String,
        state: ExecutorState,
        result: ExportResult,
    },
}

impl ExportEvent {
    pub fn job_id(&self) -> &str {
        match self {
            ExportEvent::Started { job_id, .. }
            | ExportEvent::Progress { job_id, .. }
            | ExportEvent::Finished { job_id, .. } => job_id,
        }
    }
}

/// Bridges pipeline progress onto the executor's event channel.
pub struct ChannelProgress {
    job_id: String,
    sender: Sender<ExportEvent>,
}

impl ChannelProgress {
    pub fn new(job_id: &str, sender: Sender<ExportEvent>) -> Self {
        Self {
            job_id: job_id.to_string(),
            sender,
        }
    }
}

impl ProgressReporter for ChannelProgress {
    fn report(&self, event: ProgressEvent) {
        // No receiver left is fine; the export still runs to completion.
        let _ = self.sender.send(ExportEvent::Progress {
            job_id: self.job_id.clone(),
            progress: event,
        });
    }
}
