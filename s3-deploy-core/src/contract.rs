#![allow(unused)]

//! # contract: collaborators the deployment run depends on
//!
//! The orchestrator never touches the environment, the filesystem, the
//! process table or the pipeline host directly. It talks to four traits:
//!
//! - [`InputSource`]: named pipeline inputs (e.g. `INPUT_*` env vars, a YAML file)
//! - [`PathProbe`]: existence check for the local source directory
//! - [`CommandRunner`]: runs a [`CommandSpec`], streaming or capturing its output
//! - [`Reporter`]: the pipeline's logging, output and failure facilities
//!
//! ## Mocking & Testing
//! - Every trait is annotated for `mockall`, so tests can script inputs,
//!   record command invocations and assert on reported outputs.
//! - The mocks are exported with the `test-export-mocks` feature (on by default)
//!   so integration tests under `tests/` can use them.
//!
//! Default implementations for the filesystem and the process table live in
//! [`crate::process`]; the pipeline-host implementations live in the binary crate.

use async_trait::async_trait;
use std::path::Path;

use mockall::{automock, predicate::*};

use crate::command::CommandSpec;
use crate::error::ExecError;

/// Reads named inputs from the pipeline.
///
/// Returns `None` when the input was not supplied at all. Callers treat an
/// empty string the same as an absent value.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait InputSource: Send + Sync {
    fn get_input(&self, name: &str) -> Option<String>;
}

/// Checks whether a local path exists.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait PathProbe: Send + Sync {
    fn exists(&self, path: &Path) -> bool;
}

/// Runs external commands to completion.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run with standard streams inherited from this process, so progress is
    /// visible live in the pipeline log.
    async fn run_streaming(&self, command: &CommandSpec) -> Result<(), ExecError>;

    /// Run with stdout captured and returned as text.
    async fn run_captured(&self, command: &CommandSpec) -> Result<String, ExecError>;
}

/// The pipeline's reporting facilities.
#[cfg_attr(any(test, feature = "test-export-mocks"), automock)]
pub trait Reporter: Send + Sync {
    fn info(&self, message: &str);

    fn warning(&self, message: &str);

    fn error(&self, message: &str);

    /// Register a value that must be redacted from all later log output.
    fn mask(&self, secret: &str);

    fn set_output(&self, name: &str, value: &str);

    /// Mark the step as failed. Called at most once per run.
    fn set_failed(&self, message: &str);
}
