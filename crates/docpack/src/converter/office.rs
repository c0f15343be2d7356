//! Conversion through a LibreOffice-compatible command line.

use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Child, Command, ExitStatus, Stdio};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::config::ConverterConfig;
use crate::error::ConvertError;
use crate::sanitize;

use super::DocumentConverter;

const POLL_INTERVAL: Duration = Duration::from_millis(50);

/// Invokes `<program> [extra args] --headless --convert-to pdf --outdir <dir> <file>`.
#[derive(Debug, Clone)]
pub struct OfficeConverter {
    program: String,
    extra_args: Vec<String>,
    timeout: Option<Duration>,
}

impl OfficeConverter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            timeout: None,
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self {
            program: config.program.clone(),
            extra_args: config.extra_args.clone(),
            timeout: config.timeout(),
        }
    }

    pub fn with_extra_args(mut self, extra_args: Vec<String>) -> Self {
        self.extra_args = extra_args;
        self
    }

    pub fn with_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Resolves the program on `PATH` (or checks it directly when it is a path).
    pub fn resolve_program(&self) -> Result<PathBuf, ConvertError> {
        which::which(&self.program).map_err(|e| ConvertError::ConverterUnavailable {
            program: self.program.clone(),
            reason: e.to_string(),
        })
    }

    fn spawn(&self, program: &Path, workdir: &Path, input: &Path) -> Result<Child, ConvertError> {
        let mut command = Command::new(program);
        command
            .args(&self.extra_args)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(workdir)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped());

        // `soffice` is a wrapper around `soffice.bin`; its own group lets a
        // timeout take down the whole tree.
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        command
            .spawn()
            .map_err(|e| ConvertError::ConverterUnavailable {
                program: self.program.clone(),
                reason: e.to_string(),
            })
    }
}

impl DocumentConverter for OfficeConverter {
    fn convert(
        &self,
        source: &Path,
        workdir: &Path,
        surrogate: &str,
    ) -> Result<PathBuf, ConvertError> {
        let program = self.resolve_program()?;

        let extension = source
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("doc");
        let staged = StagedCopy::create(source, &workdir.join(format!("{}.{}", surrogate, extension)))?;

        debug!(
            source = %sanitize::redact_path(source),
            staged = %sanitize::redact_path(staged.path()),
            "Invoking converter"
        );

        let mut child = self.spawn(&program, workdir, staged.path())?;
        let stderr_reader = child.stderr.take().map(spawn_reader);

        let status = match wait_with_timeout(&mut child, self.timeout) {
            Ok(Some(status)) => status,
            Ok(None) => {
                // Every process holding the pipe is gone, so the reader finishes.
                let stderr = stderr_reader
                    .and_then(|handle| handle.join().ok())
                    .unwrap_or_default();
                let timeout = self.timeout.unwrap_or_default();
                warn!(
                    timeout = ?timeout,
                    stderr = %stderr.trim(),
                    "Converter timed out, process group killed"
                );
                return Err(ConvertError::TimedOut(timeout));
            }
            Err(e) => {
                return Err(ConvertError::Failed {
                    status: "unknown".to_string(),
                    stderr: format!("failed to wait for converter: {}", e),
                });
            }
        };

        let stderr = stderr_reader
            .and_then(|handle| handle.join().ok())
            .unwrap_or_default();

        if !status.success() {
            return Err(ConvertError::Failed {
                status: describe_status(&status),
                stderr: stderr.trim().to_string(),
            });
        }

        let produced = workdir.join(format!("{}.pdf", surrogate));
        if !produced.is_file() {
            return Err(ConvertError::MissingOutput(produced));
        }

        Ok(produced)
    }

    fn check_available(&self) -> Result<(), ConvertError> {
        self.resolve_program().map(|_| ())
    }

    fn name(&self) -> &str {
        &self.program
    }
}

/// Copy of the source inside the workspace, removed when dropped.
struct StagedCopy {
    path: PathBuf,
}

impl StagedCopy {
    fn create(source: &Path, destination: &Path) -> Result<Self, ConvertError> {
        std::fs::copy(source, destination).map_err(|e| ConvertError::Staging {
            path: source.to_path_buf(),
            source: e,
        })?;
        Ok(Self {
            path: destination.to_path_buf(),
        })
    }

    fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for StagedCopy {
    fn drop(&mut self) {
        if let Err(e) = std::fs::remove_file(&self.path) {
            debug!(error = %e, "Failed to remove staged copy");
        }
    }
}

fn spawn_reader<R: Read + Send + 'static>(mut reader: R) -> JoinHandle<String> {
    thread::spawn(move || {
        let mut buf = Vec::new();
        let _ = reader.read_to_end(&mut buf);
        String::from_utf8_lossy(&buf).into_owned()
    })
}

/// Waits for the child; returns `Ok(None)` after killing it on timeout.
fn wait_with_timeout(
    child: &mut Child,
    timeout: Option<Duration>,
) -> std::io::Result<Option<ExitStatus>> {
    let Some(timeout) = timeout else {
        return child.wait().map(Some);
    };

    let deadline = Instant::now() + timeout;
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(Some(status));
        }
        if Instant::now() >= deadline {
            kill_process_group(child);
            let _ = child.wait();
            return Ok(None);
        }
        thread::sleep(POLL_INTERVAL);
    }
}

/// Kills the child and everything it started.
#[cfg(unix)]
fn kill_process_group(child: &mut Child) {
    let Ok(pgid) = libc::pid_t::try_from(child.id()) else {
        let _ = child.kill();
        return;
    };

    // SAFETY: killpg only sends a signal. The group id is the pid of a child
    // we spawned with `process_group(0)` and have not reaped yet, so it
    // cannot name an unrelated group.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc != 0 {
        debug!(error = %std::io::Error::last_os_error(), "killpg failed, killing child only");
        let _ = child.kill();
    }
}

#[cfg(not(unix))]
fn kill_process_group(child: &mut Child) {
    let _ = child.kill();
}

fn describe_status(status: &ExitStatus) -> String {
    match status.code() {
        Some(code) => format!("exit code {}", code),
        None => "termination by signal".to_string(),
    }
}
