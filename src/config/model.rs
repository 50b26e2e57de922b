// src/config/model.rs

use std::time::Duration;

use serde::Deserialize;

/// Default time to wait for child output after each forwarded line.
pub const DEFAULT_POLL_TIMEOUT_MS: u64 = 100;

/// Configuration as read from a TOML file, before validation.
///
/// ```toml
/// [run]
/// poll_timeout_ms = 250
/// teardown_timeout_ms = 2000
/// args = ["--verbose"]
/// ```
///
/// Every key is optional.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawConfigFile {
    #[serde(default)]
    pub run: RunSection,
}

/// `[run]` section.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RunSection {
    /// Output polling window after each forwarded line.
    #[serde(default = "default_poll_timeout_ms")]
    pub poll_timeout_ms: u64,

    /// Grace period for a child to exit once its pipes are closed.
    /// `None` waits forever.
    #[serde(default)]
    pub teardown_timeout_ms: Option<u64>,

    /// Arguments passed to the program on every RESTART.
    #[serde(default)]
    pub args: Vec<String>,
}

fn default_poll_timeout_ms() -> u64 {
    DEFAULT_POLL_TIMEOUT_MS
}

impl Default for RunSection {
    fn default() -> Self {
        Self {
            poll_timeout_ms: default_poll_timeout_ms(),
            teardown_timeout_ms: None,
            args: Vec::new(),
        }
    }
}

/// Validated configuration.
///
/// Only obtainable through `TryFrom<RawConfigFile>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigFile {
    pub run: RunSection,
}

impl ConfigFile {
    pub(crate) fn new_unchecked(run: RunSection) -> Self {
        Self { run }
    }

    /// Convert into the options the interpreter and backend consume.
    pub fn run_options(&self) -> RunOptions {
        RunOptions {
            poll_timeout: Duration::from_millis(self.run.poll_timeout_ms),
            teardown_timeout: self.run.teardown_timeout_ms.map(Duration::from_millis),
            program_args: self.run.args.clone(),
        }
    }
}

/// Timing and argument options for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunOptions {
    pub poll_timeout: Duration,
    pub teardown_timeout: Option<Duration>,
    pub program_args: Vec<String>,
}

impl Default for RunOptions {
    fn default() -> Self {
        ConfigFile::new_unchecked(RunSection::default()).run_options()
    }
}
