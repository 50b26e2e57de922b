// src/script/directive.rs

//! Pure classification of one (already trimmed and substituted) script line.

use std::fmt;
use std::time::Duration;

pub const END_SKIP: &str = "END_SKIP";
pub const START_SKIP: &str = "START_SKIP";
pub const ENV: &str = "ENV";
pub const ENVCLEAR: &str = "ENVCLEAR";
pub const RESTART: &str = "RESTART";
pub const DELAY: &str = "DELAY";

/// What a single script line asks the interpreter to do.
#[derive(Debug, Clone, PartialEq)]
pub enum Directive {
    /// Leave skip mode. Recognised even while skipping.
    EndSkip,
    /// Blank line, comment, or any line seen in skip mode.
    Ignored,
    StartSkip,
    Env { key: String, value: String },
    EnvClear,
    Restart,
    Delay(Duration),
    /// Anything else: one line of stdin for the child.
    Send(String),
}

/// A directive keyword with unusable arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormatError {
    pub reason: String,
}

impl FormatError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }
}

impl fmt::Display for FormatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.reason)
    }
}

impl std::error::Error for FormatError {}

/// Classify `text` given the current skip state.
///
/// Matching is case-sensitive. `END_SKIP` is checked first so skip mode
/// never swallows its own terminator; the skip markers match by prefix,
/// the other keywords by first whitespace-separated token.
pub fn classify(text: &str, skipping: bool) -> Result<Directive, FormatError> {
    if text.starts_with(END_SKIP) {
        return Ok(Directive::EndSkip);
    }
    if skipping || text.is_empty() || text.starts_with('#') {
        return Ok(Directive::Ignored);
    }
    if text.starts_with(START_SKIP) {
        return Ok(Directive::StartSkip);
    }

    let (keyword, rest) = match text.split_once(char::is_whitespace) {
        Some((keyword, rest)) => (keyword, rest.trim_start()),
        None => (text, ""),
    };

    match keyword {
        ENV => parse_env(rest),
        ENVCLEAR => no_arguments(ENVCLEAR, rest).map(|_| Directive::EnvClear),
        RESTART => no_arguments(RESTART, rest).map(|_| Directive::Restart),
        DELAY => parse_delay(rest).map(Directive::Delay),
        _ => Ok(Directive::Send(text.to_string())),
    }
}

fn parse_env(rest: &str) -> Result<Directive, FormatError> {
    let Some((key, value)) = rest.split_once(char::is_whitespace) else {
        return Err(FormatError::new(format!(
            "ENV needs a key and a value (got `ENV {rest}`)"
        )));
    };

    let value = value.trim_start();
    if value.is_empty() {
        return Err(FormatError::new(format!(
            "ENV needs a key and a value (got `ENV {key}`)"
        )));
    }

    Ok(Directive::Env {
        key: key.to_string(),
        value: value.to_string(),
    })
}

fn no_arguments(keyword: &str, rest: &str) -> Result<(), FormatError> {
    if rest.is_empty() {
        Ok(())
    } else {
        Err(FormatError::new(format!(
            "{keyword} takes no arguments (got `{rest}`)"
        )))
    }
}

/// Parse a `DELAY` argument in (fractional) seconds.
pub fn parse_delay(arg: &str) -> Result<Duration, FormatError> {
    if arg.is_empty() {
        return Err(FormatError::new("DELAY needs a number of seconds"));
    }

    let secs: f64 = arg
        .parse()
        .map_err(|e| FormatError::new(format!("invalid DELAY value '{arg}': {e}")))?;

    Duration::try_from_secs_f64(secs)
        .map_err(|e| FormatError::new(format!("invalid DELAY value '{arg}': {e}")))
}
