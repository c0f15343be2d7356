//! Test harness for isolated export runs.
//!
//! Every harness owns a temp directory with `input/`, `output/` and `work/`
//! subdirectories, plus a shell script standing in for the office suite.

#![allow(dead_code)]

use std::fs::File;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;

use docpack::config::Compression;
use docpack::converter::{DocumentConverter, OfficeConverter};
use docpack::import::SourceItem;
use docpack::pipeline::{
    ExportPipeline, ExportRequest, ExportResult, NoopProgress, PipelineConfig,
};

/// Shell script standing in for the office suite, shared with the unit
/// tests. Its header lists the content markers it reacts to.
pub const FAKE_CONVERTER: &str = include_str!("fake_soffice.sh");

pub struct TestHarness {
    temp_dir: TempDir,
    pub input_dir: PathBuf,
    pub output_dir: PathBuf,
    /// Root under which per-run workspaces are created.
    pub work_dir: PathBuf,
    script: PathBuf,
}

impl TestHarness {
    pub fn new() -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let base = temp_dir.path();

        let input_dir = base.join("input");
        let output_dir = base.join("output");
        let work_dir = base.join("work");

        std::fs::create_dir_all(&input_dir).expect("Failed to create input dir");
        std::fs::create_dir_all(&output_dir).expect("Failed to create output dir");
        std::fs::create_dir_all(&work_dir).expect("Failed to create work dir");

        let script = base.join("fake-soffice.sh");
        std::fs::write(&script, FAKE_CONVERTER).expect("Failed to write fake converter");

        Self {
            temp_dir,
            input_dir,
            output_dir,
            work_dir,
            script,
        }
    }

    pub fn temp_path(&self) -> &Path {
        self.temp_dir.path()
    }

    pub fn write_input(&self, filename: &str, content: &str) -> PathBuf {
        let path = self.input_dir.join(filename);
        std::fs::write(&path, content).expect("Failed to write input file");
        path
    }

    /// Creates an extra destination directory next to `output/`.
    pub fn destination(&self, name: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::create_dir_all(&path).expect("Failed to create destination");
        path
    }

    /// The fake script, run through `sh`.
    pub fn converter(&self) -> OfficeConverter {
        OfficeConverter::new("sh").with_extra_args(vec![self.script.display().to_string()])
    }

    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            workspace_root: Some(self.work_dir.clone()),
            archive_prefix: "Export_PDFs".to_string(),
            compression: Compression::Deflated,
        }
    }

    pub fn pipeline(&self) -> ExportPipeline {
        self.pipeline_with(Arc::new(self.converter()))
    }

    pub fn pipeline_with(&self, converter: Arc<dyn DocumentConverter>) -> ExportPipeline {
        ExportPipeline::new(Arc::new(self.pipeline_config()), converter)
    }

    /// Runs the batch into `output/` without progress reporting.
    pub fn export(&self, items: Vec<SourceItem>) -> ExportResult {
        self.pipeline()
            .run(ExportRequest::new(items, &self.output_dir), &NoopProgress)
    }

    pub fn output_files(&self) -> Vec<PathBuf> {
        list_dir(&self.output_dir)
    }

    pub fn workspace_is_empty(&self) -> bool {
        list_dir(&self.work_dir).is_empty()
    }
}

impl Default for TestHarness {
    fn default() -> Self {
        Self::new()
    }
}

pub fn list_dir(dir: &Path) -> Vec<PathBuf> {
    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .expect("Failed to read directory")
        .map(|e| e.expect("Failed to read entry").path())
        .collect();
    entries.sort();
    entries
}

/// Member names in archive order.
pub fn archive_members(path: &Path) -> Vec<String> {
    let file = File::open(path).expect("Failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    (0..archive.len())
        .map(|i| archive.by_index(i).expect("Failed to read member").name().to_string())
        .collect()
}

pub fn archive_member_content(path: &Path, member: &str) -> String {
    use std::io::Read;

    let file = File::open(path).expect("Failed to open archive");
    let mut archive = zip::ZipArchive::new(file).expect("Failed to read archive");
    let mut entry = archive.by_name(member).expect("Member not found");
    let mut content = String::new();
    entry
        .read_to_string(&mut content)
        .expect("Failed to read member");
    content
}
