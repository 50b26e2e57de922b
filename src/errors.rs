// src/errors.rs

//! Crate-wide error type.
//!
//! Spawn and write failures abort a run; format errors are reported by the
//! interpreter as warnings and never escape `Interpreter::run`.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum TesterError {
    #[error("line {line}: `{directive}` could not start '{program}'")]
    Spawn {
        line: usize,
        directive: String,
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: writing `{directive}` to the child's stdin failed")]
    Write {
        line: usize,
        directive: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {reason}")]
    ScriptFormat { line: usize, reason: String },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parsing error: {0}")]
    TomlError(#[from] toml::de::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl TesterError {
    /// Whether this error ends the run (as opposed to a skipped directive).
    pub fn is_fatal(&self) -> bool {
        !matches!(self, TesterError::ScriptFormat { .. })
    }
}

pub type Result<T> = std::result::Result<T, TesterError>;
