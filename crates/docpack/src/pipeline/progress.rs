use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Phase of an export run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportPhase {
    Preparing,
    Converting,
    Archiving,
    Finalizing,
    Completed,
    Failed,
}

impl std::fmt::Display for ExportPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ExportPhase::Preparing => write!(f, "Preparing"),
            ExportPhase::Converting => write!(f, "Converting"),
            ExportPhase::Archiving => write!(f, "Archiving"),
            ExportPhase::Finalizing => write!(f, "Finalizing"),
            ExportPhase::Completed => write!(f, "Completed"),
            ExportPhase::Failed => write!(f, "Failed"),
        }
    }
}

/// Progress notification for the display side.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressEvent {
    pub phase: ExportPhase,
    pub items_total: usize,
    /// Items finished in the current phase before `current_name`.
    pub items_done: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_name: Option<String>,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl ProgressEvent {
    pub fn phase(phase: ExportPhase, items_total: usize, message: impl Into<String>) -> Self {
        Self {
            phase,
            items_total,
            items_done: 0,
            current_name: None,
            message: message.into(),
            timestamp: Utc::now(),
        }
    }

    /// Item boundary, e.g. "Converting item 2 of 5: rapport".
    pub fn item(phase: ExportPhase, items_done: usize, items_total: usize, name: &str) -> Self {
        Self {
            phase,
            items_total,
            items_done,
            current_name: Some(name.to_string()),
            message: format!("{} item {} of {}: {}", phase, items_done + 1, items_total, name),
            timestamp: Utc::now(),
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// No-op reporter for unit tests and callers that don't render progress.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}
