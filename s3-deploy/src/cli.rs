///
/// This module implements the CLI interface for s3-deploy: command parsing,
/// choosing where inputs come from, and wiring the host collaborators into
/// the core deployment run.
///
/// All deployment logic (validation, command building, orchestration) lives in
/// the [`s3-deploy-core`] crate. This module is strictly CLI glue.
///
/// ## How To Use
/// - In a workflow step: run `s3-deploy deploy`; inputs come from `INPUT_*`.
/// - Locally: `s3-deploy deploy --config inputs.yaml`, with secrets in `.env`
///   or the environment.
/// - Programmatically: call [`run`] with a constructed [`Cli`] and a reporter.
///
/// [`s3-deploy-core`]: ../../s3-deploy-core/
use crate::load_config::load_config;
use crate::workflow::{ActionInputs, WorkflowReporter};
use anyhow::Result;
use clap::{Parser, Subcommand};
use s3_deploy_core::contract::{InputSource, Reporter};
use s3_deploy_core::deploy::{deploy, failure_message};
use s3_deploy_core::process::{LocalFs, ProcessRunner};
use std::path::PathBuf;

/// CLI for s3-deploy: sync a directory to S3 and invalidate CloudFront.
#[derive(Parser)]
#[clap(
    name = "s3-deploy",
    version,
    about = "Sync a local directory to an S3 bucket and optionally invalidate a CloudFront distribution"
)]
pub struct Cli {
    #[clap(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the deployment using action inputs from the environment
    Deploy {
        /// Optional YAML file of inputs, layered over the INPUT_* environment
        #[clap(long)]
        config: Option<PathBuf>,
    },
}

/// Entrypoint for main(), reporting through workflow commands on stdout.
pub async fn run(cli: Cli) -> Result<()> {
    let reporter = WorkflowReporter::from_env();
    run_with_reporter(cli, &reporter).await
}

/// Extracted CLI logic for integration tests: same as [`run`] with a caller-supplied reporter.
pub async fn run_with_reporter<P: Reporter + ?Sized>(cli: Cli, reporter: &P) -> Result<()> {
    tracing::info!("trace_initialised");

    match cli.command {
        Commands::Deploy { config } => {
            let inputs: Box<dyn InputSource> = match config {
                Some(path) => match load_config(&path) {
                    Ok(inputs) => Box::new(inputs),
                    Err(e) => {
                        tracing::error!(command = "deploy", error = %e, "Loading inputs failed");
                        reporter.set_failed(&failure_message(&e));
                        return Err(e);
                    }
                },
                None => Box::new(ActionInputs),
            };

            tracing::info!(command = "deploy", "Starting deployment");
            let report = deploy(inputs.as_ref(), &LocalFs, &ProcessRunner::new(), reporter).await?;
            match serde_json::to_string_pretty(&report) {
                Ok(json) => tracing::debug!(json = %json, "Deployment report as JSON"),
                Err(e) => tracing::error!(error = ?e, "Failed to serialize deployment report"),
            }
            tracing::info!(command = "deploy", s3_url = %report.s3_url, "Deployment complete");
            Ok(())
        }
    }
}
