//! Command-line glue: argument parsing, import list building and rendering of
//! executor events. Export logic lives in the `docpack` crate.

use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use docpack::config::{default_config_path, load_config, validate_config, ExportConfig};
use docpack::executor::{BackgroundExecutor, ExportEvent};
use docpack::pipeline::{
    ExportOutcome, ExportPhase, ExportRequest, ExportResult, PipelineConfig, ProgressEvent,
};
use docpack::{ImportList, OfficeConverter};

/// Convert office documents to PDF and package them into one ZIP archive.
#[derive(Parser, Debug)]
#[command(name = "docpack", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Convert documents and write the archive into a destination directory
    Export(ExportArgs),

    /// Report whether the configured converter can be found
    CheckConverter(ConverterArgs),
}

#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Directory receiving the archive
    #[arg(long)]
    pub dest: PathBuf,

    /// Rename a document before export, as FILE=NAME
    #[arg(long = "name", value_name = "FILE=NAME", value_parser = parse_rename)]
    pub names: Vec<(PathBuf, String)>,

    /// Archive file name instead of the generated one
    #[arg(long)]
    pub archive_name: Option<String>,

    #[command(flatten)]
    pub converter: ConverterArgs,

    /// Documents to export (.doc, .docx, .odt)
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

#[derive(Args, Debug)]
pub struct ConverterArgs {
    /// Path to a JSON config file
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Converter program, overrides the config
    #[arg(long)]
    pub converter: Option<String>,

    /// Per-document timeout in seconds, 0 disables it
    #[arg(long)]
    pub timeout: Option<u64>,
}

fn parse_rename(value: &str) -> std::result::Result<(PathBuf, String), String> {
    match value.split_once('=') {
        Some((file, name)) if !file.is_empty() && !name.trim().is_empty() => {
            Ok((PathBuf::from(file), name.to_string()))
        }
        _ => Err(format!("expected FILE=NAME, got '{}'", value)),
    }
}

pub fn run(cli: Cli) -> Result<ExitCode> {
    match cli.command {
        Commands::Export(args) => run_export(args),
        Commands::CheckConverter(args) => run_check_converter(&args),
    }
}

fn run_export(args: ExportArgs) -> Result<ExitCode> {
    let result = export(args)?;
    Ok(ExitCode::from(exit_code(result.outcome())))
}

/// Runs one export on a background executor, printing progress as it goes.
fn export(args: ExportArgs) -> Result<ExportResult> {
    let config = resolve_config(&args.converter)?;
    let list = build_import_list(&args.files, &args.names)?;

    let mut request = ExportRequest::new(list.snapshot(), &args.dest);
    if let Some(name) = &args.archive_name {
        request = request.with_archive_name(name);
    }

    let converter = Arc::new(OfficeConverter::from_config(&config.converter));
    let executor = BackgroundExecutor::new(Arc::new(PipelineConfig::from_config(&config)), converter)?;
    let job_id = executor.submit(request)?;
    tracing::info!(job_id = %job_id, items = list.len(), "Export submitted");

    loop {
        match executor.recv_event() {
            Some(ExportEvent::Progress { progress, .. }) => {
                if let Some(line) = render_progress(&progress) {
                    println!("{}", line);
                }
            }
            Some(ExportEvent::Finished { result, .. }) => {
                // Nothing to clear: the list only lives for this command.
                println!("{}", result.summary());
                executor.shutdown();
                return Ok(result);
            }
            Some(ExportEvent::Started { .. }) => {}
            None => bail!("export worker stopped without reporting a result"),
        }
    }
}

fn run_check_converter(args: &ConverterArgs) -> Result<ExitCode> {
    let config = resolve_config(args)?;
    let converter = OfficeConverter::from_config(&config.converter);

    match converter.resolve_program() {
        Ok(path) => {
            println!(
                "Converter '{}' found at {}",
                config.converter.program,
                path.display()
            );
            Ok(ExitCode::SUCCESS)
        }
        Err(e) => {
            println!("{}", e);
            Ok(ExitCode::from(1))
        }
    }
}

/// Explicit `--config`, else the per-user config file when present, else
/// defaults. Command-line overrides apply last.
fn resolve_config(args: &ConverterArgs) -> Result<ExportConfig> {
    let mut config = match &args.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => match default_config_path().filter(|p| p.is_file()) {
            Some(path) => {
                tracing::debug!(path = %path.display(), "Using default config file");
                load_config(&path)
                    .with_context(|| format!("loading config from {}", path.display()))?
            }
            None => ExportConfig::default(),
        },
    };

    if let Some(program) = &args.converter {
        config.converter.program = program.clone();
    }
    if let Some(timeout) = args.timeout {
        config.converter.timeout_secs = timeout;
    }
    validate_config(&config)?;

    Ok(config)
}

fn build_import_list(files: &[PathBuf], renames: &[(PathBuf, String)]) -> Result<ImportList> {
    let mut list = ImportList::new();

    for file in files {
        let added = list.add_with_confirm(file, |full_name| {
            tracing::warn!("'{}' is already in the list, importing anyway", full_name);
            true
        });
        if let Err(e) = added {
            tracing::warn!(file = %file.display(), error = %e, "Skipping file");
        }
    }

    if list.is_empty() {
        bail!("no supported documents to export");
    }

    for (file, name) in renames {
        apply_rename(&mut list, file, name);
    }

    Ok(list)
}

fn apply_rename(list: &mut ImportList, file: &Path, name: &str) {
    let target = std::fs::canonicalize(file).unwrap_or_else(|_| file.to_path_buf());
    let Some(id) = list
        .iter()
        .find(|item| item.source_path == target)
        .map(|item| item.id)
    else {
        tracing::warn!(file = %file.display(), "Rename target is not in the export list");
        return;
    };

    if list.name_conflicts(id, name) {
        tracing::warn!(name = %name, "Name already in use, keeping the original name");
        return;
    }
    if let Err(e) = list.rename(id, name) {
        tracing::warn!(name = %name, error = %e, "Rename rejected");
    }
}

fn render_progress(event: &ProgressEvent) -> Option<String> {
    match (event.phase, &event.current_name) {
        (ExportPhase::Converting, Some(name)) => Some(format!(
            "[{}/{}] converting {}",
            event.items_done + 1,
            event.items_total,
            name
        )),
        (ExportPhase::Finalizing, _) => Some(event.message.clone()),
        _ => None,
    }
}

fn exit_code(outcome: ExportOutcome) -> u8 {
    match outcome {
        ExportOutcome::Succeeded => 0,
        ExportOutcome::PartiallySucceeded => 2,
        ExportOutcome::Failed => 1,
    }
}
