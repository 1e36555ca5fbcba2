use std::path::PathBuf;
use tracing::{debug, info};

use crate::contract::{InputSource, PathProbe};
use crate::error::ConfigurationError;

pub const INPUT_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const INPUT_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const INPUT_BUCKET: &str = "AWS_S3_BUCKET";
pub const INPUT_SOURCE_DIR: &str = "SOURCE_DIR";
pub const INPUT_REGION: &str = "AWS_REGION";
pub const INPUT_DISTRIBUTION_ID: &str = "CLOUDFRONT_DISTRIBUTION_ID";
pub const INPUT_PREFIX: &str = "AWS_S3_PREFIX";
pub const INPUT_ENDPOINT: &str = "AWS_S3_ENDPOINT";
pub const INPUT_ACL: &str = "AWS_S3_ACL";
pub const INPUT_DELETE_REMOVED: &str = "DELETE_REMOVED";

pub const DEFAULT_SOURCE_DIR: &str = ".";
pub const DEFAULT_REGION: &str = "us-east-1";

/// Everything a single deployment run needs, read once from the pipeline inputs.
#[derive(Clone, PartialEq, Eq)]
pub struct DeploymentConfig {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub bucket_name: String,
    pub source_dir: PathBuf,
    pub region: String,
    pub prefix: Option<String>,
    pub endpoint: Option<String>,
    pub acl: Option<String>,
    pub delete_removed: bool,
    pub cdn_distribution_id: Option<String>,
}

// Credentials stay out of Debug output.
impl std::fmt::Debug for DeploymentConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DeploymentConfig")
            .field("access_key_id", &"***")
            .field("secret_access_key", &"***")
            .field("bucket_name", &self.bucket_name)
            .field("source_dir", &self.source_dir)
            .field("region", &self.region)
            .field("prefix", &self.prefix)
            .field("endpoint", &self.endpoint)
            .field("acl", &self.acl)
            .field("delete_removed", &self.delete_removed)
            .field("cdn_distribution_id", &self.cdn_distribution_id)
            .finish()
    }
}

impl DeploymentConfig {
    /// Reads every input and checks the source directory exists.
    pub fn from_inputs<I, F>(inputs: &I, fs: &F) -> Result<Self, ConfigurationError>
    where
        I: InputSource + ?Sized,
        F: PathProbe + ?Sized,
    {
        let access_key_id = required(inputs, INPUT_ACCESS_KEY_ID)?;
        let secret_access_key = required(inputs, INPUT_SECRET_ACCESS_KEY)?;
        let bucket_name = required(inputs, INPUT_BUCKET)?;
        let source_dir = PathBuf::from(
            optional(inputs, INPUT_SOURCE_DIR).unwrap_or_else(|| DEFAULT_SOURCE_DIR.to_string()),
        );
        let region = optional(inputs, INPUT_REGION).unwrap_or_else(|| DEFAULT_REGION.to_string());
        let config = DeploymentConfig {
            access_key_id,
            secret_access_key,
            bucket_name,
            source_dir,
            region,
            prefix: optional(inputs, INPUT_PREFIX),
            endpoint: optional(inputs, INPUT_ENDPOINT),
            acl: optional(inputs, INPUT_ACL),
            delete_removed: boolean(inputs, INPUT_DELETE_REMOVED)?,
            cdn_distribution_id: optional(inputs, INPUT_DISTRIBUTION_ID),
        };

        if !fs.exists(&config.source_dir) {
            return Err(ConfigurationError::SourceDirMissing {
                path: config.source_dir,
            });
        }

        config.trace_loaded();
        Ok(config)
    }

    /// `s3://bucket/prefix`, or `s3://bucket` when no prefix is set.
    pub fn destination_url(&self) -> String {
        match &self.prefix {
            Some(prefix) => format!("s3://{}/{}", self.bucket_name, prefix),
            None => format!("s3://{}", self.bucket_name),
        }
    }

    pub fn trace_loaded(&self) {
        info!(
            bucket = %self.bucket_name,
            source_dir = %self.source_dir.display(),
            region = %self.region,
            delete_removed = self.delete_removed,
            invalidate = self.cdn_distribution_id.is_some(),
            "Loaded DeploymentConfig"
        );
        debug!(?self, "DeploymentConfig loaded (full debug)");
    }
}

fn optional<I: InputSource + ?Sized>(inputs: &I, name: &str) -> Option<String> {
    inputs
        .get_input(name)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required<I: InputSource + ?Sized>(inputs: &I, name: &str) -> Result<String, ConfigurationError> {
    optional(inputs, name).ok_or_else(|| ConfigurationError::MissingInput {
        name: name.to_string(),
    })
}

fn boolean<I: InputSource + ?Sized>(inputs: &I, name: &str) -> Result<bool, ConfigurationError> {
    match optional(inputs, name).as_deref() {
        None => Ok(false),
        Some("true" | "True" | "TRUE") => Ok(true),
        Some("false" | "False" | "FALSE") => Ok(false),
        Some(other) => Err(ConfigurationError::InvalidBoolean {
            name: name.to_string(),
            value: other.to_string(),
        }),
    }
}
