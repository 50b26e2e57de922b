// src/engine/mod.rs

//! Script interpreter.
//!
//! The pure state machine lives in [`core`]: it owns the environment and the
//! skip flag and turns each script line into a [`CoreCommand`]. The async
//! shell in [`interpreter`] executes those commands against a process
//! backend and writes the transcript.

use std::collections::BTreeMap;
use std::time::Duration;

pub mod core;
pub mod interpreter;

pub use self::core::InterpreterCore;
pub use interpreter::{Interpreter, RunReport};

/// Variables handed to the next child on RESTART.
///
/// A child gets a snapshot; mutating the environment afterwards never
/// affects a child that is already running.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    vars: BTreeMap<String, String>,
}

impl Environment {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.insert(key.into(), value.into());
    }

    pub fn clear(&mut self) {
        self.vars.clear();
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.vars.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.vars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &String)> {
        self.vars.iter()
    }

    /// Owned copy for a new child.
    pub fn snapshot(&self) -> Environment {
        self.clone()
    }
}

/// What the shell should do for one script line.
#[derive(Debug, Clone, PartialEq)]
pub enum CoreCommand {
    /// Blank line, comment, skipped line, or an environment change.
    Nothing,
    /// Skip mode was switched on (`true`) or off (`false`).
    SkipMode(bool),
    /// Tear down the current child and start a new one with this snapshot.
    Restart(Environment),
    /// Forward this line to the child's stdin.
    Send(String),
    /// Suspend the interpreter.
    Delay(Duration),
    /// The line was a directive with unusable arguments; skip it.
    Malformed(String),
}
