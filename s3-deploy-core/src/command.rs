//! Builds the two `aws` command lines a deployment runs.
//!
//! Commands are ordered argument lists, never shell strings. Each carries the
//! credential environment it needs, so nothing is written to this process's
//! own environment.

use std::fmt;

use crate::config::DeploymentConfig;

pub const AWS_CLI: &str = "aws";

pub const ENV_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const ENV_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";
pub const ENV_DEFAULT_REGION: &str = "AWS_DEFAULT_REGION";
pub const ENV_S3_ENDPOINT: &str = "AWS_S3_ENDPOINT";

/// Invalidate everything under the distribution.
pub const INVALIDATION_PATHS: &str = "/*";

/// The invalidation id is parsed from JSON, whatever the caller's CLI default is.
pub const INVALIDATION_OUTPUT_FORMAT: &str = "json";

/// Credentials and region handed to the external tool.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub region: String,
    pub endpoint: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &"***")
            .field("secret_access_key", &"***")
            .field("region", &self.region)
            .field("endpoint", &self.endpoint)
            .finish()
    }
}

impl Credentials {
    pub fn from_config(config: &DeploymentConfig) -> Self {
        Self {
            access_key_id: config.access_key_id.clone(),
            secret_access_key: config.secret_access_key.clone(),
            region: config.region.clone(),
            endpoint: config.endpoint.clone(),
        }
    }

    /// Environment overrides for the child process. `AWS_S3_ENDPOINT` is only
    /// present when an endpoint was configured.
    pub fn env_vars(&self) -> Vec<(String, String)> {
        let mut vars = vec![
            (ENV_ACCESS_KEY_ID.to_string(), self.access_key_id.clone()),
            (ENV_SECRET_ACCESS_KEY.to_string(), self.secret_access_key.clone()),
            (ENV_DEFAULT_REGION.to_string(), self.region.clone()),
        ];
        if let Some(endpoint) = &self.endpoint {
            vars.push((ENV_S3_ENDPOINT.to_string(), endpoint.clone()));
        }
        vars
    }
}

/// A single external command: program, ordered arguments and environment overrides.
#[derive(Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub envs: Vec<(String, String)>,
    /// Number of leading `args` that are subcommand words.
    subcommands: usize,
}

impl CommandSpec {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            envs: Vec::new(),
            subcommands: 0,
        }
    }

    /// Appends a subcommand word. Must come before any other argument.
    pub fn subcommand(mut self, word: impl Into<String>) -> Self {
        debug_assert_eq!(self.args.len(), self.subcommands);
        self.args.push(word.into());
        self.subcommands += 1;
        self
    }

    /// Appends a positional value or a bare flag.
    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.args.push(arg.into());
        self
    }

    /// Appends a flag followed by its value.
    pub fn opt(self, flag: &str, value: impl Into<String>) -> Self {
        self.arg(flag).arg(value)
    }

    pub fn envs(mut self, envs: Vec<(String, String)>) -> Self {
        self.envs = envs;
        self
    }

    pub fn env(&self, key: &str) -> Option<&str> {
        self.envs
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn has_arg(&self, arg: &str) -> bool {
        self.args.iter().any(|a| a == arg)
    }

    /// Value following `flag`, if the flag is present.
    pub fn opt_value(&self, flag: &str) -> Option<&str> {
        self.args
            .iter()
            .position(|a| a == flag)
            .and_then(|i| self.args.get(i + 1))
            .map(String::as_str)
    }
}

/// Environment values carry credentials, so only their keys are shown.
impl fmt::Debug for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let envs: Vec<(&str, &str)> = self.envs.iter().map(|(k, _)| (k.as_str(), "***")).collect();
        f.debug_struct("CommandSpec")
            .field("program", &self.program)
            .field("args", &self.args)
            .field("envs", &envs)
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

/// Shell-style rendering for logs: subcommands and flags bare, every value
/// double-quoted. Environment values are never printed.
impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i < self.subcommands || arg.starts_with("--") {
                write!(f, " {arg}")?;
            } else {
                write!(f, " \"{}\"", arg.replace('\\', "\\\\").replace('"', "\\\""))?;
            }
        }
        Ok(())
    }
}

/// `aws s3 sync <source> <destination> --no-progress [--acl ..] [--endpoint-url ..] [--delete]`
pub fn build_sync_command(config: &DeploymentConfig, credentials: &Credentials) -> CommandSpec {
    let mut command = CommandSpec::new(AWS_CLI)
        .subcommand("s3")
        .subcommand("sync")
        .arg(config.source_dir.to_string_lossy())
        .arg(config.destination_url())
        .arg("--no-progress");

    if let Some(acl) = &config.acl {
        command = command.opt("--acl", acl);
    }
    if let Some(endpoint) = &config.endpoint {
        command = command.opt("--endpoint-url", endpoint);
    }
    if config.delete_removed {
        command = command.arg("--delete");
    }

    command.envs(credentials.env_vars())
}

/// `aws cloudfront create-invalidation --distribution-id <id> --paths /* --output json`
pub fn build_invalidation_command(distribution_id: &str, credentials: &Credentials) -> CommandSpec {
    CommandSpec::new(AWS_CLI)
        .subcommand("cloudfront")
        .subcommand("create-invalidation")
        .opt("--distribution-id", distribution_id)
        .opt("--paths", INVALIDATION_PATHS)
        .opt("--output", INVALIDATION_OUTPUT_FORMAT)
        .envs(credentials.env_vars())
}
