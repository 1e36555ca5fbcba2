pub mod cli;
pub mod load_config;
pub mod workflow;

pub use cli::{run, Cli, Commands};
