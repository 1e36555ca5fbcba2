/// `load_config` module: reads deployment inputs from a YAML file for runs outside a workflow.
///
/// The file is a flat mapping from input name to scalar value, using the same
/// names as the action inputs:
///
/// ```yaml
/// AWS_S3_BUCKET: my-site
/// SOURCE_DIR: ./public
/// AWS_S3_PREFIX: docs
/// DELETE_REMOVED: true
/// ```
///
/// Values in the file take precedence; anything the file leaves out is looked
/// up in the wrapped [`InputSource`] (normally the `INPUT_*` environment), so
/// secrets never need to be written to disk.
///
/// # Errors
/// Unreadable files, invalid YAML and non-scalar values are `anyhow::Error`s,
/// surfaced at the CLI boundary.
use anyhow::Result;
use s3_deploy_core::contract::InputSource;
use serde_yaml::Value;
use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;
use tracing::{error, info};

use crate::workflow::ActionInputs;

/// File-provided inputs layered over a fallback source.
#[derive(Debug)]
pub struct FileInputs<F: InputSource> {
    values: HashMap<String, String>,
    fallback: F,
}

impl<F: InputSource> FileInputs<F> {
    pub fn new(values: HashMap<String, String>, fallback: F) -> Self {
        let values = values
            .into_iter()
            .map(|(k, v)| (k.to_uppercase(), v))
            .collect();
        Self { values, fallback }
    }
}

impl<F: InputSource> InputSource for FileInputs<F> {
    fn get_input(&self, name: &str) -> Option<String> {
        self.values
            .get(&name.to_uppercase())
            .cloned()
            .or_else(|| self.fallback.get_input(name))
    }
}

/// Loads a YAML input file layered over the `INPUT_*` environment.
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<FileInputs<ActionInputs>> {
    load_config_with_fallback(path, ActionInputs)
}

pub fn load_config_with_fallback<P, F>(path: P, fallback: F) -> Result<FileInputs<F>>
where
    P: AsRef<Path>,
    F: InputSource,
{
    let path_ref = path.as_ref();
    info!(config_path = ?path_ref, "Loading inputs from file");

    let config_content = match fs::read_to_string(path_ref) {
        Ok(content) => {
            info!(config_path = ?path_ref, "Config file read successfully");
            content
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to read config file");
            return Err(anyhow::anyhow!(
                "Failed to read config file {:?}: {}",
                path_ref,
                e
            ));
        }
    };

    let raw: BTreeMap<String, Value> = match serde_yaml::from_str(&config_content) {
        Ok(conf) => {
            info!(config_path = ?path_ref, "Parsed config YAML successfully");
            conf
        }
        Err(e) => {
            error!(error = ?e, config_path = ?path_ref, "Failed to parse config YAML");
            return Err(anyhow::anyhow!("Failed to parse config YAML: {e}"));
        }
    };

    let mut values = HashMap::new();
    for (name, value) in raw {
        let value = match value {
            Value::Null => continue,
            Value::String(s) => s,
            Value::Bool(b) => b.to_string(),
            Value::Number(n) => n.to_string(),
            other => {
                error!(input = %name, value = ?other, "Non-scalar input value in config");
                anyhow::bail!("Input {name} in config file must be a scalar value");
            }
        };
        values.insert(name, value);
    }

    info!(inputs = values.len(), "Inputs loaded from file");
    Ok(FileInputs::new(values, fallback))
}
