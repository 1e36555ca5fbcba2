//! Error taxonomy for a deployment run.
//!
//! Each step of the run returns one of these; only the orchestrator in
//! [`crate::deploy`] turns them into the terminal failure report.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for deployment steps.
pub type DeployResult<T> = Result<T, DeployError>;

/// Inputs were missing or malformed, or the source directory is absent.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    /// A required input was absent or empty.
    #[error("Input required and not supplied: {name}")]
    MissingInput { name: String },

    /// A boolean input was not one of the YAML 1.2 core-schema spellings.
    #[error(
        "Input does not meet YAML 1.2 \"Core Schema\" specification: {name}\nSupport boolean input list: `true | True | TRUE | false | False | FALSE`"
    )]
    InvalidBoolean { name: String, value: String },

    #[error("Source directory does not exist: {}", .path.display())]
    SourceDirMissing { path: PathBuf },
}

/// Failure to run an external command.
#[derive(Error, Debug)]
pub enum ExecError {
    #[error("failed to launch `{program}`: {source}")]
    Launch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    /// The command ran but did not exit successfully. Captured stderr, when
    /// there was any, ends the message.
    #[error("command failed with {status}: {command}{}", stderr_suffix(.stderr))]
    Exit {
        command: String,
        status: String,
        stderr: Option<String>,
    },
}

fn stderr_suffix(stderr: &Option<String>) -> String {
    stderr
        .as_deref()
        .map(|s| format!(": {s}"))
        .unwrap_or_default()
}

/// Main error type for a deployment run.
#[derive(Error, Debug)]
pub enum DeployError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),

    #[error("S3 sync failed: {0}")]
    Sync(#[source] ExecError),

    #[error("CloudFront invalidation failed: {0}")]
    Invalidation(#[source] ExecError),
}
