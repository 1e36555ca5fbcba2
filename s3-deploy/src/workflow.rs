//! GitHub Actions host: reads `INPUT_*` variables and speaks the workflow-command protocol.
//!
//! The core crate only knows the [`InputSource`] and [`Reporter`] contracts.
//! This module implements them for a job step running on GitHub Actions:
//!
//! - Inputs arrive as environment variables named `INPUT_<NAME>`, upper-cased
//!   with spaces replaced by underscores.
//! - Log lines go to stdout; warnings, errors and secret masks are
//!   `::command::data` lines, with `%`, `\r` and `\n` escaped.
//! - Outputs are appended to the file named by `$GITHUB_OUTPUT` using a
//!   random heredoc delimiter. Without that variable, the legacy
//!   `::set-output` command is written instead.
//!
//! Failures to write are logged and otherwise ignored; there is nowhere else
//! to report them.

use s3_deploy_core::contract::{InputSource, Reporter};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use tracing::error;
use uuid::Uuid;

pub const GITHUB_OUTPUT_ENV: &str = "GITHUB_OUTPUT";

/// Environment variable GitHub Actions uses for input `name`.
pub fn input_env_key(name: &str) -> String {
    format!("INPUT_{}", name.replace(' ', "_").to_uppercase())
}

/// Inputs read from this process's environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ActionInputs;

impl InputSource for ActionInputs {
    fn get_input(&self, name: &str) -> Option<String> {
        std::env::var(input_env_key(name)).ok()
    }
}

pub fn escape_data(value: &str) -> String {
    value
        .replace('%', "%25")
        .replace('\r', "%0D")
        .replace('\n', "%0A")
}

pub fn escape_property(value: &str) -> String {
    escape_data(value).replace(':', "%3A").replace(',', "%2C")
}

/// Reporter writing workflow commands to `out`.
pub struct WorkflowReporter<W: Write + Send> {
    out: Mutex<W>,
    output_file: Option<PathBuf>,
    failed: AtomicBool,
}

impl WorkflowReporter<std::io::Stdout> {
    /// Stdout, with outputs going to `$GITHUB_OUTPUT` when it is set.
    pub fn from_env() -> Self {
        let output_file = std::env::var_os(GITHUB_OUTPUT_ENV)
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        Self::new(std::io::stdout(), output_file)
    }
}

impl<W: Write + Send> WorkflowReporter<W> {
    pub fn new(out: W, output_file: Option<PathBuf>) -> Self {
        Self {
            out: Mutex::new(out),
            output_file,
            failed: AtomicBool::new(false),
        }
    }

    /// Whether `set_failed` has been called.
    pub fn failed(&self) -> bool {
        self.failed.load(Ordering::SeqCst)
    }

    pub fn into_inner(self) -> W {
        self.out.into_inner().unwrap_or_else(|e| e.into_inner())
    }

    fn write_line(&self, line: &str) {
        let mut out = self.out.lock().unwrap_or_else(|e| e.into_inner());
        if let Err(e) = writeln!(out, "{line}").and_then(|_| out.flush()) {
            error!(error = ?e, "Failed to write to workflow log");
        }
    }

    fn issue(&self, command: &str, message: &str) {
        self.write_line(&format!("::{command}::{}", escape_data(message)));
    }

    fn append_output_file(&self, path: &Path, name: &str, value: &str) -> std::io::Result<()> {
        let delimiter = format!("ghadelimiter_{}", Uuid::new_v4());
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        write!(file, "{name}<<{delimiter}\n{value}\n{delimiter}\n")
    }
}

impl<W: Write + Send> Reporter for WorkflowReporter<W> {
    fn info(&self, message: &str) {
        self.write_line(message);
    }

    fn warning(&self, message: &str) {
        self.issue("warning", message);
    }

    fn error(&self, message: &str) {
        self.issue("error", message);
    }

    fn mask(&self, secret: &str) {
        self.issue("add-mask", secret);
    }

    fn set_output(&self, name: &str, value: &str) {
        match &self.output_file {
            Some(path) => {
                if let Err(e) = self.append_output_file(path, name, value) {
                    error!(error = ?e, path = %path.display(), output = name, "Failed to write step output");
                }
            }
            None => self.write_line(&format!(
                "::set-output name={}::{}",
                escape_property(name),
                escape_data(value)
            )),
        }
    }

    fn set_failed(&self, message: &str) {
        self.failed.store(true, Ordering::SeqCst);
        self.error(message);
    }
}
