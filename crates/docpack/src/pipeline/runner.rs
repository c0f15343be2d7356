use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::archive::{self, ArchiveBuilder, ArchiveSink};
use crate::converter::{ConvertedFile, DocumentConverter};
use crate::naming::NameRegistry;
use crate::sanitize;

use super::config::PipelineConfig;
use super::context::{ExportContext, ExportRequest};
use super::error::{ItemFailure, PipelineError};
use super::progress::{ExportPhase, ProgressEvent, ProgressReporter};
use super::result::ExportResult;
use super::workspace::Workspace;

/// Converts a batch to PDF and packages it into one archive.
///
/// Single use: `run` consumes the pipeline, and every run owns a fresh
/// workspace and name registry.
pub struct ExportPipeline {
    config: Arc<PipelineConfig>,
    converter: Arc<dyn DocumentConverter>,
}

impl ExportPipeline {
    pub fn new(config: Arc<PipelineConfig>, converter: Arc<dyn DocumentConverter>) -> Self {
        Self { config, converter }
    }

    /// Runs the whole batch. Never panics on I/O or converter failures; every
    /// outcome is folded into the returned [`ExportResult`].
    pub fn run(self, request: ExportRequest, progress: &dyn ProgressReporter) -> ExportResult {
        let mut ctx = ExportContext::new(request);
        self.run_in(&mut ctx, progress)
    }

    /// Same as [`ExportPipeline::run`], recording into a caller-owned context
    /// so conversions and failures gathered so far outlive a panic.
    pub fn run_in(self, ctx: &mut ExportContext, progress: &dyn ProgressReporter) -> ExportResult {
        let items_total = ctx.items_total();
        let _export_span = info_span!("export",
            items = items_total,
            destination = %sanitize::redact_path(&ctx.request.destination),
            converter = self.converter.name(),
        )
        .entered();

        progress.report(ProgressEvent::phase(
            ExportPhase::Preparing,
            items_total,
            "Preparing export...",
        ));

        let outcome = match Workspace::create(self.config.workspace_root.as_deref()) {
            Ok(workspace) => {
                let outcome = self.execute(ctx, &workspace, progress);
                // Explicit removal so failures get logged; drop covers panics.
                if let Err(e) = workspace.close() {
                    warn!(error = %e, "Failed to remove export workspace");
                }
                outcome
            }
            Err(e) => Err(PipelineError::Workspace(e)),
        };

        let result = match outcome {
            Ok(archive_path) => {
                info!(
                    written = ctx.members.len(),
                    failed = ctx.failures.len(),
                    "Export completed"
                );
                ExportResult::completed(ctx, archive_path)
            }
            Err(e) => {
                warn!(error = %e, kind = %e.kind(), "Export failed");
                ExportResult::failed(ctx, &e)
            }
        };

        let (phase, message) = if result.success {
            (ExportPhase::Completed, "Export completed")
        } else {
            (ExportPhase::Failed, "Export failed")
        };
        progress.report(ProgressEvent {
            items_done: result.succeeded_count,
            ..ProgressEvent::phase(phase, items_total, message)
        });

        result
    }

    fn execute(
        &self,
        ctx: &mut ExportContext,
        workspace: &Workspace,
        progress: &dyn ProgressReporter,
    ) -> Result<PathBuf, PipelineError> {
        if ctx.request.items.is_empty() {
            return Err(PipelineError::EmptyBatch);
        }

        // Step 1: Converter must be invocable before anything is written
        {
            let _step = info_span!("check_converter").entered();
            self.converter.check_available()?;
        }

        // Step 2: Open the archive up front so an unwritable destination
        // fails before any conversion work
        let archive = {
            let _step = info_span!("open_archive").entered();
            self.step_open_archive(ctx)?
        };

        self.convert_and_pack(ctx, workspace, archive, progress)
    }

    /// Steps 3 to 5. Any error drops `archive`, which deletes the file.
    fn convert_and_pack<S: ArchiveSink>(
        &self,
        ctx: &mut ExportContext,
        workspace: &Workspace,
        mut archive: ArchiveBuilder<S>,
        progress: &dyn ProgressReporter,
    ) -> Result<PathBuf, PipelineError> {
        // Step 3: Convert every item into the workspace
        {
            let _step = info_span!("convert").entered();
            self.step_convert(ctx, workspace, progress)?;
        }

        if ctx.converted.is_empty() {
            // `archive` drops here and deletes the empty file.
            return Err(PipelineError::NothingConverted(ctx.items_total()));
        }

        // Step 4: Resolve final names and fill the archive
        {
            let _step = info_span!("archive").entered();
            self.step_fill_archive(ctx, &mut archive, progress)?;
        }

        // Step 5: Finalize
        let _step = info_span!("finalize").entered();
        progress.report(ProgressEvent::phase(
            ExportPhase::Finalizing,
            ctx.items_total(),
            "Finalizing archive...",
        ));
        let archive_path = archive.close()?;
        ctx.archive_path = Some(archive_path.clone());

        Ok(archive_path)
    }

    fn step_open_archive(&self, ctx: &ExportContext) -> Result<ArchiveBuilder, PipelineError> {
        let file_name = match &ctx.request.archive_name {
            Some(name) => archive::ensure_zip_extension(&sanitize::sanitize_base_name(name)),
            None => archive::archive_file_name(&self.config.archive_prefix, &ctx.request.destination),
        };
        let path = ctx.request.destination.join(file_name);
        Ok(ArchiveBuilder::open(&path, self.config.compression)?)
    }

    fn step_convert(
        &self,
        ctx: &mut ExportContext,
        workspace: &Workspace,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let items_total = ctx.items_total();

        for index in 0..items_total {
            let item = &ctx.request.items[index];
            progress.report(ProgressEvent::item(
                ExportPhase::Converting,
                index,
                items_total,
                &item.display_name,
            ));

            let _item_span = info_span!("convert_item",
                item_id = %item.id,
                source = %sanitize::redact_path(&item.source_path),
            )
            .entered();

            match self
                .converter
                .convert(&item.source_path, workspace.path(), &item.surrogate_name())
            {
                Ok(path) => {
                    debug!("Converted");
                    let converted = ConvertedFile {
                        item_id: item.id,
                        path,
                    };
                    ctx.converted.push((index, converted));
                }
                Err(e) if e.is_fatal() => return Err(e.into()),
                Err(e) => {
                    warn!(error = %e, "Conversion failed, continuing with next item");
                    let failure = ItemFailure {
                        item_id: item.id,
                        name: item.display_name.clone(),
                        reason: e.to_string(),
                    };
                    ctx.failures.push(failure);
                }
            }
        }

        Ok(())
    }

    fn step_fill_archive<S: ArchiveSink>(
        &self,
        ctx: &mut ExportContext,
        archive: &mut ArchiveBuilder<S>,
        progress: &dyn ProgressReporter,
    ) -> Result<(), PipelineError> {
        let mut registry = NameRegistry::for_pdf();
        // Counted against the whole batch, like the conversion events.
        let items_total = ctx.items_total();

        for (done, (index, converted)) in ctx.converted.iter().enumerate() {
            let item = &ctx.request.items[*index];
            let final_name = registry.reserve(&sanitize::sanitize_base_name(&item.display_name));

            progress.report(ProgressEvent::item(
                ExportPhase::Archiving,
                done,
                items_total,
                &final_name,
            ));
            debug!(item_id = %item.id, final_name = %final_name, "Adding to archive");

            archive.add(&converted.path, &final_name)?;
        }

        ctx.members = archive.entries().to_vec();
        Ok(())
    }
}
