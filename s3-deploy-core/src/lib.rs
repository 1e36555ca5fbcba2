#![doc = "s3-deploy-core: core logic library for s3-deploy."]

//! This crate contains the deployment logic: reading inputs into a
//! [`config::DeploymentConfig`], building the `aws` commands, running them
//! through the [`contract::CommandRunner`] seam and reporting the outcome.
//! Pipeline-host specifics (env var inputs, workflow commands) live in the
//! `s3-deploy` binary crate.
//!
//! # Usage
//! Call [`deploy::deploy`] with implementations of the four contracts in
//! [`contract`]. [`process`] provides the filesystem and process-table ones.

pub mod command;
pub mod config;
pub mod contract;
pub mod deploy;
pub mod error;
pub mod invalidation;
pub mod process;
