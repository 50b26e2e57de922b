// src/engine/core.rs

//! Pure interpreter state machine.
//!
//! No Tokio, no processes, no IO: `step` maps one prepared script line to a
//! [`CoreCommand`] and applies environment and skip-mode changes.

use tracing::trace;

use crate::engine::{CoreCommand, Environment};
use crate::script::{Directive, ScriptLine, classify};

#[derive(Debug, Default)]
pub struct InterpreterCore {
    env: Environment,
    skipping: bool,
}

impl InterpreterCore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn is_skipping(&self) -> bool {
        self.skipping
    }

    /// Consume one line and say what the shell has to do.
    pub fn step(&mut self, line: &ScriptLine) -> CoreCommand {
        let directive = match classify(&line.text, self.skipping) {
            Ok(directive) => directive,
            Err(err) => return CoreCommand::Malformed(err.reason),
        };

        trace!(line = line.number, ?directive, "classified script line");

        match directive {
            Directive::EndSkip => {
                self.skipping = false;
                CoreCommand::SkipMode(false)
            }
            Directive::Ignored => CoreCommand::Nothing,
            Directive::StartSkip => {
                self.skipping = true;
                CoreCommand::SkipMode(true)
            }
            Directive::Env { key, value } => {
                self.env.set(key, value);
                CoreCommand::Nothing
            }
            Directive::EnvClear => {
                self.env.clear();
                CoreCommand::Nothing
            }
            Directive::Restart => CoreCommand::Restart(self.env.snapshot()),
            Directive::Delay(duration) => CoreCommand::Delay(duration),
            Directive::Send(text) => CoreCommand::Send(text),
        }
    }
}
