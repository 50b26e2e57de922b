// src/config/loader.rs

use std::fs;
use std::path::Path;

use crate::cli::CliArgs;
use crate::config::model::{ConfigFile, RawConfigFile};
use crate::errors::Result;

/// Load a configuration file and return the raw, unvalidated model.
pub fn load_from_path(path: impl AsRef<Path>) -> Result<RawConfigFile> {
    let contents = fs::read_to_string(path.as_ref())?;
    let config: RawConfigFile = toml::from_str(&contents)?;
    Ok(config)
}

/// Load a configuration file from path and validate it.
pub fn load_and_validate(path: impl AsRef<Path>) -> Result<ConfigFile> {
    let raw = load_from_path(path)?;
    ConfigFile::try_from(raw)
}

/// Build the effective configuration for a CLI invocation.
///
/// Starts from `--config` (or built-in defaults), then applies the CLI
/// flags on top, then validates the result.
pub fn resolve_options(args: &CliArgs) -> Result<ConfigFile> {
    let mut raw = match &args.config {
        Some(path) => load_from_path(path)?,
        None => RawConfigFile::default(),
    };

    if let Some(ms) = args.poll_timeout_ms {
        raw.run.poll_timeout_ms = ms;
    }
    if let Some(ms) = args.teardown_timeout_ms {
        raw.run.teardown_timeout_ms = Some(ms);
    }
    if !args.program_args.is_empty() {
        raw.run.args = args.program_args.clone();
    }

    ConfigFile::try_from(raw)
}
