//! Run orchestration: validate → credentials → sync → invalidate → report.
//!
//! This module drives a single deployment run from start to finish. It:
//!   - Reads and validates every input into a [`DeploymentConfig`]
//!   - Builds the [`Credentials`] handed to each external command
//!   - Syncs the source directory to the bucket with inherited stdio
//!   - Optionally creates a CloudFront invalidation and parses its id
//!   - Reports `s3_url` (and the invalidation id, when there is one)
//!
//! # Error Handling
//! Every step returns a [`DeployError`]. The first one aborts the run, and
//! [`deploy`] turns it into exactly one `set_failed` call of the form
//! `Action failed with error: {error}`. Nothing already done is rolled back:
//! a sync that succeeded before a failed invalidation still leaves the run failed.
//!
//! # Navigation
//! - Main entrypoint: [`deploy`]
//! - Individual steps: [`sync_files`], [`invalidate_cache`]

use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::command::{build_invalidation_command, build_sync_command, Credentials};
use crate::config::DeploymentConfig;
use crate::contract::{CommandRunner, InputSource, PathProbe, Reporter};
use crate::error::{DeployError, DeployResult};
use crate::invalidation::parse_invalidation_id;

pub const OUTPUT_S3_URL: &str = "s3_url";
pub const OUTPUT_INVALIDATION_ID: &str = "cloudfront_invalidation_id";

pub const SYNC_ERROR_DIAGNOSTIC: &str = "Error syncing files to S3";
pub const INVALIDATION_ERROR_DIAGNOSTIC: &str = "Error invalidating CloudFront cache";

/// Where a run currently is. `Failed` is absorbing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Validating,
    SettingEnv,
    Syncing,
    Invalidating,
    ReportingSuccess,
    Failed,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validating => "validating",
            Stage::SettingEnv => "setting_env",
            Stage::Syncing => "syncing",
            Stage::Invalidating => "invalidating",
            Stage::ReportingSuccess => "reporting_success",
            Stage::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployReport {
    pub s3_url: String,
    /// Present only when invalidation ran and its id could be parsed.
    pub invalidation_id: Option<String>,
}

/// The single failure report for a run that stopped on `error`.
pub fn failure_message(error: &dyn fmt::Display) -> String {
    format!("Action failed with error: {error}")
}

fn enter(stage: Stage) {
    info!(stage = %stage, "[DEPLOY] Entering stage");
}

/// Runs one deployment and reports the outcome through `reporter`.
///
/// The result is returned as well so the caller can pick an exit code.
pub async fn deploy<I, F, R, P>(
    inputs: &I,
    fs: &F,
    runner: &R,
    reporter: &P,
) -> DeployResult<DeployReport>
where
    I: InputSource + ?Sized,
    F: PathProbe + ?Sized,
    R: CommandRunner + ?Sized,
    P: Reporter + ?Sized,
{
    match execute(inputs, fs, runner, reporter).await {
        Ok(report) => {
            enter(Stage::ReportingSuccess);
            reporter.set_output(OUTPUT_S3_URL, &report.s3_url);
            if let Some(id) = &report.invalidation_id {
                reporter.set_output(OUTPUT_INVALIDATION_ID, id);
            }
            info!(?report, "[DEPLOY] Deployment complete");
            Ok(report)
        }
        Err(e) => {
            enter(Stage::Failed);
            error!(error = %e, "[DEPLOY][ERROR] Deployment failed");
            reporter.set_failed(&failure_message(&e));
            Err(e)
        }
    }
}

async fn execute<I, F, R, P>(
    inputs: &I,
    fs: &F,
    runner: &R,
    reporter: &P,
) -> DeployResult<DeployReport>
where
    I: InputSource + ?Sized,
    F: PathProbe + ?Sized,
    R: CommandRunner + ?Sized,
    P: Reporter + ?Sized,
{
    enter(Stage::Validating);
    let config = DeploymentConfig::from_inputs(inputs, fs)?;

    enter(Stage::SettingEnv);
    reporter.mask(&config.access_key_id);
    reporter.mask(&config.secret_access_key);
    let credentials = Credentials::from_config(&config);
    debug!(?credentials, "[DEPLOY] Credential context built");

    enter(Stage::Syncing);
    let s3_url = sync_files(&config, &credentials, runner, reporter).await?;

    let invalidation_id = match &config.cdn_distribution_id {
        Some(distribution_id) => {
            enter(Stage::Invalidating);
            let id = invalidate_cache(distribution_id, &credentials, runner, reporter).await?;
            Some(id).filter(|id| !id.is_empty())
        }
        None => {
            info!("[DEPLOY] No CloudFront distribution configured, skipping invalidation");
            None
        }
    };

    Ok(DeployReport {
        s3_url,
        invalidation_id,
    })
}

/// Syncs the source directory to the bucket. Returns the destination URL.
pub async fn sync_files<R, P>(
    config: &DeploymentConfig,
    credentials: &Credentials,
    runner: &R,
    reporter: &P,
) -> DeployResult<String>
where
    R: CommandRunner + ?Sized,
    P: Reporter + ?Sized,
{
    let destination = config.destination_url();
    reporter.info(&format!(
        "Syncing files from {} to S3 bucket: {}",
        config.source_dir.display(),
        destination
    ));
    if let Some(endpoint) = &config.endpoint {
        reporter.info(&format!("Using endpoint: {endpoint}"));
    }

    let command = build_sync_command(config, credentials);
    info!(command = %command, "[DEPLOY][SYNC] Running sync");

    if let Err(e) = runner.run_streaming(&command).await {
        error!(error = %e, "[DEPLOY][ERROR][SYNC] Sync command failed");
        reporter.error(SYNC_ERROR_DIAGNOSTIC);
        return Err(DeployError::Sync(e));
    }

    info!(destination = %destination, "[DEPLOY][SYNC] Sync succeeded");
    Ok(destination)
}

/// Invalidates `/*` on the distribution. Returns the parsed invalidation id,
/// or an empty string when the response carried none.
pub async fn invalidate_cache<R, P>(
    distribution_id: &str,
    credentials: &Credentials,
    runner: &R,
    reporter: &P,
) -> DeployResult<String>
where
    R: CommandRunner + ?Sized,
    P: Reporter + ?Sized,
{
    reporter.info(&format!(
        "Invalidating CloudFront distribution: {distribution_id}"
    ));

    let command = build_invalidation_command(distribution_id, credentials);
    info!(command = %command, "[DEPLOY][INVALIDATE] Running invalidation");

    let output = match runner.run_captured(&command).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, "[DEPLOY][ERROR][INVALIDATE] Invalidation command failed");
            reporter.error(INVALIDATION_ERROR_DIAGNOSTIC);
            return Err(DeployError::Invalidation(e));
        }
    };
    reporter.info("CloudFront cache invalidation completed.");

    let id = parse_invalidation_id(&output);
    if id.is_empty() {
        warn!(output = %output, "[DEPLOY][INVALIDATE] No invalidation id in response");
        reporter.warning("Could not find an invalidation ID in the CloudFront response");
    } else {
        reporter.info(&format!("CloudFront invalidation ID: {id}"));
    }
    Ok(id)
}
