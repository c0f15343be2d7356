use std::fmt::Write;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::error::ErrorKind;

use super::context::ExportContext;
use super::error::{ItemFailure, PipelineError};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ExportOutcome {
    Succeeded,
    PartiallySucceeded,
    Failed,
}

/// Run-level error carried by a failed result.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RunError {
    pub kind: ErrorKind,
    pub reason: String,
}

/// Terminal outcome of one export run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub archive_path: Option<PathBuf>,
    /// Documents written to the archive, or converted before a fatal abort.
    pub succeeded_count: usize,
    pub items_total: usize,
    /// Final archive member names in order.
    #[serde(default)]
    pub members: Vec<String>,
    #[serde(default)]
    pub failures: Vec<ItemFailure>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<RunError>,
}

impl ExportResult {
    pub fn completed(ctx: &ExportContext, archive_path: PathBuf) -> Self {
        Self {
            success: true,
            archive_path: Some(archive_path),
            succeeded_count: ctx.members.len(),
            items_total: ctx.items_total(),
            members: ctx.members.clone(),
            failures: ctx.failures.clone(),
            error: None,
        }
    }

    pub fn failed(ctx: &ExportContext, error: &PipelineError) -> Self {
        Self::failure(
            ctx.items_total(),
            ctx.converted.len(),
            ctx.failures.clone(),
            error.kind(),
            error.to_string(),
        )
    }

    /// Failure raised outside the pipeline, e.g. a panicking worker.
    pub fn failure(
        items_total: usize,
        succeeded_count: usize,
        failures: Vec<ItemFailure>,
        kind: ErrorKind,
        reason: String,
    ) -> Self {
        Self {
            success: false,
            archive_path: None,
            succeeded_count,
            items_total,
            members: Vec::new(),
            failures,
            error: Some(RunError { kind, reason }),
        }
    }

    pub fn outcome(&self) -> ExportOutcome {
        if !self.success {
            ExportOutcome::Failed
        } else if self.failures.is_empty() {
            ExportOutcome::Succeeded
        } else {
            ExportOutcome::PartiallySucceeded
        }
    }

    pub fn error_kind(&self) -> Option<ErrorKind> {
        self.error.as_ref().map(|e| e.kind)
    }

    /// Human-readable summary distinguishing the three outcomes.
    pub fn summary(&self) -> String {
        let archive = self
            .archive_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_default();

        match self.outcome() {
            ExportOutcome::Succeeded => format!(
                "Export succeeded: {} document(s) written to {}",
                self.succeeded_count, archive
            ),
            ExportOutcome::PartiallySucceeded => {
                let mut out = format!(
                    "Export partially succeeded: {} of {} document(s) written to {}",
                    self.succeeded_count, self.items_total, archive
                );
                for failure in &self.failures {
                    let _ = write!(out, "\n  - {}: {}", failure.name, failure.reason);
                }
                out
            }
            ExportOutcome::Failed => {
                let reason = self
                    .error
                    .as_ref()
                    .map(|e| e.reason.as_str())
                    .unwrap_or("unknown error");
                let mut out = format!("Export failed: {}", reason);
                for failure in &self.failures {
                    let _ = write!(out, "\n  - {}: {}", failure.name, failure.reason);
                }
                out
            }
        }
    }
}
